mod delivery;
pub mod messages;
mod util;

pub use delivery::{TelegramDeliveryChannel, TelegramDeliveryError};
pub use teloxide;

use std::sync::Arc;

use teloxide::{
    dispatching::UpdateHandler,
    dptree::case,
    macros::BotCommands,
    prelude::*,
    types::{ChatId, ParseMode},
    utils::command::BotCommands as _,
};

use ticklr_models::reminder::{OwnerId, ReminderId};
use ticklr_scheduler::{DeliveryStats, ReminderRequests};
use util::{owner_of, try_get_message_from_query};

type HandlerResult = anyhow::Result<()>;
type Requests = Arc<dyn ReminderRequests>;

/// The only user allowed to see `/stats`, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdminUser(pub Option<OwnerId>);

impl AdminUser {
    fn is(&self, owner_id: OwnerId) -> bool {
        self.0 == Some(owner_id)
    }
}

pub struct TelegramInteractionInterface;

impl TelegramInteractionInterface {
    /// Serves updates until the process receives Ctrl+C.
    pub async fn start(
        bot: Bot,
        requests: Arc<dyn ReminderRequests>,
        stats: Arc<DeliveryStats>,
        admin: AdminUser,
    ) {
        log::info!("Starting Telegram interaction interface");

        if let Err(error) = bot.set_my_commands(Command::bot_commands()).await {
            log::warn!("Could not register bot commands: {error}");
        }

        Dispatcher::builder(bot, schema())
            .dependencies(dptree::deps![requests, stats, admin])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "start talking to the bot")]
    Start,
    #[command(description = "show the supported time formats")]
    Help,
    #[command(description = "list pending reminders")]
    List,
    #[command(description = "cancel a reminder by its id")]
    Cancel(String),
    #[command(description = "delivery statistics")]
    Stats,
}

fn schema() -> UpdateHandler<anyhow::Error> {
    let commands = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::List].endpoint(list))
        .branch(case![Command::Cancel(arg)].endpoint(cancel))
        .branch(case![Command::Stats].endpoint(stats));

    let message_handler = Update::filter_message()
        .branch(commands)
        .branch(dptree::endpoint(submit_text));

    let callback_handler = Update::filter_callback_query().endpoint(delete_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

async fn send_html(bot: &Bot, chat_id: ChatId, text: String) -> HandlerResult {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Logs a failed handler and tells the user to try again.
async fn guarded(bot: &Bot, chat_id: ChatId, result: HandlerResult) -> HandlerResult {
    if let Err(error) = result {
        log::error!("Handler failed [chat_id = {chat_id}]: {error:#}");
        bot.send_message(chat_id, messages::GENERIC_ERROR).await?;
    }
    Ok(())
}

async fn start(bot: Bot, msg: Message, stats: Arc<DeliveryStats>) -> HandlerResult {
    stats.record_message();
    let result = send_html(&bot, msg.chat.id, messages::welcome()).await;
    guarded(&bot, msg.chat.id, result).await
}

async fn help(bot: Bot, msg: Message, stats: Arc<DeliveryStats>) -> HandlerResult {
    stats.record_message();
    let result = send_html(&bot, msg.chat.id, messages::help()).await;
    guarded(&bot, msg.chat.id, result).await
}

async fn list(
    bot: Bot,
    msg: Message,
    requests: Requests,
    stats: Arc<DeliveryStats>,
) -> HandlerResult {
    stats.record_message();
    let result = send_list(&bot, &msg, requests.as_ref()).await;
    guarded(&bot, msg.chat.id, result).await
}

async fn send_list(bot: &Bot, msg: &Message, requests: &dyn ReminderRequests) -> HandlerResult {
    let Some(owner_id) = owner_of(msg) else {
        return Ok(());
    };

    let reminders = requests.list(owner_id).await?;
    let now = requests.now();

    bot.send_message(msg.chat.id, messages::reminder_list(&reminders, &now))
        .parse_mode(ParseMode::Html)
        .reply_markup(messages::list_keyboard(&reminders))
        .await?;

    Ok(())
}

async fn cancel(
    arg: String,
    bot: Bot,
    msg: Message,
    requests: Requests,
    stats: Arc<DeliveryStats>,
) -> HandlerResult {
    stats.record_message();
    let result = cancel_by_id(&bot, &msg, arg.trim(), requests.as_ref()).await;
    guarded(&bot, msg.chat.id, result).await
}

async fn cancel_by_id(
    bot: &Bot,
    msg: &Message,
    arg: &str,
    requests: &dyn ReminderRequests,
) -> HandlerResult {
    let Some(owner_id) = owner_of(msg) else {
        return Ok(());
    };
    let Ok(id) = arg.parse::<ReminderId>() else {
        return send_html(bot, msg.chat.id, messages::cancel_usage()).await;
    };

    let cancelled = requests.cancel(owner_id, id).await?;
    send_html(bot, msg.chat.id, messages::cancel_reply(id, cancelled)).await
}

async fn stats(
    bot: Bot,
    msg: Message,
    stats: Arc<DeliveryStats>,
    admin: AdminUser,
) -> HandlerResult {
    stats.record_message();

    let is_admin = owner_of(&msg).is_some_and(|owner_id| admin.is(owner_id));
    let reply = if is_admin {
        messages::stats(&stats.snapshot())
    } else {
        messages::ADMIN_ONLY.to_string()
    };

    let result = send_html(&bot, msg.chat.id, reply).await;
    guarded(&bot, msg.chat.id, result).await
}

async fn submit_text(
    bot: Bot,
    msg: Message,
    requests: Requests,
    stats: Arc<DeliveryStats>,
) -> HandlerResult {
    stats.record_message();
    let result = submit(&bot, &msg, requests.as_ref()).await;
    guarded(&bot, msg.chat.id, result).await
}

async fn submit(bot: &Bot, msg: &Message, requests: &dyn ReminderRequests) -> HandlerResult {
    let Some(owner_id) = owner_of(msg) else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return send_html(bot, msg.chat.id, messages::invalid_format()).await;
    };
    if text.starts_with('/') {
        return send_html(bot, msg.chat.id, messages::help()).await;
    }

    let outcome = requests.submit(owner_id, text).await;
    log::debug!(
        "Reminder request handled [owner_id = {owner_id}, status = {}]",
        outcome.status()
    );

    let now = requests.now();
    send_html(bot, msg.chat.id, messages::submit_reply(&outcome, &now)).await
}

async fn delete_callback(
    bot: Bot,
    query: CallbackQuery,
    requests: Requests,
    stats: Arc<DeliveryStats>,
) -> HandlerResult {
    stats.record_message();

    let owner_id = OwnerId::try_from(query.from.id.0).ok();
    let id = query
        .data
        .as_deref()
        .and_then(messages::parse_delete_callback);

    let (Some(owner_id), Some(id)) = (owner_id, id) else {
        log::warn!("Unknown callback data: {:?}", query.data);
        bot.answer_callback_query(query.id).await?;
        return Ok(());
    };

    let (reply, refresh) = cancel_from_list(requests.as_ref(), owner_id, id).await;
    if let Err(error) = bot
        .answer_callback_query(query.id.clone())
        .text(reply)
        .await
    {
        log::warn!("Could not answer callback query [reminder_id = {id}]: {error}");
    }

    if !refresh {
        return Ok(());
    }
    if let Err(error) = refresh_list(&bot, &query, owner_id, requests.as_ref()).await {
        log::error!("Could not refresh reminder list [owner_id = {owner_id}]: {error:#}");
    }

    Ok(())
}

/// Callback answer for a delete button, and whether the list message should be re-rendered.
async fn cancel_from_list(
    requests: &dyn ReminderRequests,
    owner_id: OwnerId,
    id: ReminderId,
) -> (String, bool) {
    match requests.cancel(owner_id, id).await {
        Ok(cancelled) => (messages::cancel_reply(id, cancelled), true),
        Err(error) => {
            log::error!("Could not delete reminder from list [reminder_id = {id}]: {error:#}");
            (messages::GENERIC_ERROR.to_string(), false)
        }
    }
}

async fn refresh_list(
    bot: &Bot,
    query: &CallbackQuery,
    owner_id: OwnerId,
    requests: &dyn ReminderRequests,
) -> HandlerResult {
    let Some(message) = try_get_message_from_query(query) else {
        return Ok(());
    };

    let reminders = requests.list(owner_id).await?;
    let now = requests.now();
    bot.edit_message_text(
        message.chat.id,
        message.id,
        messages::reminder_list(&reminders, &now),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(messages::list_keyboard(&reminders))
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use ticklr_models::reminder::Reminder;
    use ticklr_scheduler::SubmitOutcome;

    use super::*;

    /// Cancels succeed or fail as told; listing always fails.
    struct BrokenListRequests {
        cancel_fails: bool,
    }

    #[async_trait]
    impl ReminderRequests for BrokenListRequests {
        async fn submit(&self, _owner_id: OwnerId, _raw_text: &str) -> SubmitOutcome {
            SubmitOutcome::Failed
        }

        async fn list(&self, _owner_id: OwnerId) -> anyhow::Result<Vec<Reminder>> {
            anyhow::bail!("database is locked")
        }

        async fn cancel(&self, _owner_id: OwnerId, id: ReminderId) -> anyhow::Result<bool> {
            if self.cancel_fails {
                anyhow::bail!("database is locked");
            }
            Ok(id == 1)
        }

        fn now(&self) -> DateTime<FixedOffset> {
            DateTime::parse_from_rfc3339("2025-06-20T18:00:00+06:00").unwrap()
        }
    }

    #[test]
    fn commands_parse_with_arguments() {
        assert_eq!(Command::parse("/list", "ticklr_bot").unwrap(), Command::List);
        assert_eq!(
            Command::parse("/cancel 12", "ticklr_bot").unwrap(),
            Command::Cancel("12".to_string())
        );
        assert_eq!(Command::parse("/stats", "ticklr_bot").unwrap(), Command::Stats);
    }

    #[test]
    fn admin_is_matched_by_id() {
        assert!(AdminUser(Some(5)).is(5));
        assert!(!AdminUser(Some(5)).is(6));
        assert!(!AdminUser(None).is(5));
    }

    #[tokio::test]
    async fn cancelled_reminder_is_confirmed_even_if_listing_fails() {
        let requests = BrokenListRequests {
            cancel_fails: false,
        };

        let (reply, refresh) = cancel_from_list(&requests, 42, 1).await;

        assert_eq!(reply, messages::cancel_reply(1, true));
        assert!(refresh);
    }

    #[tokio::test]
    async fn already_gone_reminder_still_refreshes_the_list() {
        let requests = BrokenListRequests {
            cancel_fails: false,
        };

        let (reply, refresh) = cancel_from_list(&requests, 42, 2).await;

        assert_eq!(reply, messages::cancel_reply(2, false));
        assert!(refresh);
    }

    #[tokio::test]
    async fn failed_cancel_answers_with_generic_error() {
        let requests = BrokenListRequests { cancel_fails: true };

        let (reply, refresh) = cancel_from_list(&requests, 42, 1).await;

        assert_eq!(reply, messages::GENERIC_ERROR);
        assert!(!refresh);
    }
}
