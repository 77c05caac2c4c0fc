use async_trait::async_trait;
use teloxide::{ApiError, RequestError, prelude::*, types::ParseMode};
use thiserror::Error;

use ticklr_scheduler::{Notification, ReminderDeliveryChannel};

use crate::messages;

#[derive(Debug, Error)]
pub enum TelegramDeliveryError {
    #[error("Recipient {0} has blocked the bot")]
    Blocked(i64),

    #[error(transparent)]
    Telegram(#[from] RequestError),
}

impl TelegramDeliveryError {
    fn from_request(recipient: i64, error: RequestError) -> Self {
        match error {
            RequestError::Api(ApiError::BotBlocked) => Self::Blocked(recipient),
            error => Self::Telegram(error),
        }
    }
}

/// Sends notifications as HTML messages. The recipient is the chat id, which for private
/// chats equals the user id the reminder is owned by.
pub struct TelegramDeliveryChannel {
    bot: Bot,
}

impl TelegramDeliveryChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReminderDeliveryChannel for TelegramDeliveryChannel {
    async fn send_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        let recipient = notification.recipient;

        self.bot
            .send_message(ChatId(recipient), messages::notification(notification))
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|error| TelegramDeliveryError::from_request(recipient, error))?;

        log::debug!("Notification sent [chat_id = {recipient}]");
        Ok(())
    }
}
