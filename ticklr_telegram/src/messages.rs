//! Texts and keyboards the bot sends. Everything here is HTML, user-provided text is escaped.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::html,
};

use ticklr_models::{
    display::{format_date, format_full, format_short, format_time, time_until},
    reminder::{Reminder, ReminderId},
};
use ticklr_scheduler::{Notification, NotificationKind, StatsSnapshot, SubmitOutcome};

const DELETE_PREFIX: &str = "delete:";

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again a bit later.";

pub const ACCESS_DENIED: &str = "Sorry, this bot is private.";

pub const ADMIN_ONLY: &str = "This command is only available to the administrator.";

pub fn welcome() -> String {
    format!(
        "👋 Hi! Send me a time and I will remind you.\n\n{}",
        help()
    )
}

pub fn help() -> String {
    "<b>Formats</b>
<code>18:30</code> today
<code>18:30 25.12</code> on a date this year (or next, if it has passed)
<code>18:30 25.12.2025</code> or <code>18:30 25.12.25</code> on an exact date

Anything on the following lines becomes the reminder text.

/list shows your reminders, /cancel &lt;id&gt; removes one."
        .to_string()
}

pub fn invalid_format() -> String {
    "🤔 I could not understand the time. Try <code>18:30</code> or <code>18:30 25.12.2025</code>."
        .to_string()
}

pub fn past_time(today_only: bool) -> String {
    if today_only {
        "⌛ That time has already passed today. Add a date, e.g. <code>09:00 25.12</code>.".to_string()
    } else {
        "⌛ That moment is already in the past.".to_string()
    }
}

pub fn created(
    reminder: &Reminder,
    pending_count: Option<u64>,
    now: &DateTime<FixedOffset>,
) -> String {
    let mut message = format!(
        "✅ Reminder #{} set for <b>{}</b> ({}).",
        reminder.id,
        format_full(&reminder.fire_at),
        time_until(&reminder.fire_at, now)
    );

    if let Some(text) = &reminder.text {
        message.push_str(&format!("\n📝 {}", html::escape(text)));
    }
    if let Some(count) = pending_count {
        message.push_str(&format!("\nPending reminders: {count}"));
    }

    message
}

pub fn submit_reply(outcome: &SubmitOutcome, now: &DateTime<FixedOffset>) -> String {
    match outcome {
        SubmitOutcome::Created {
            reminder,
            pending_count,
            ..
        } => created(reminder, *pending_count, now),
        SubmitOutcome::InvalidFormat => invalid_format(),
        SubmitOutcome::PastTime { today_only } => past_time(*today_only),
        SubmitOutcome::AccessDenied => ACCESS_DENIED.to_string(),
        SubmitOutcome::Failed => GENERIC_ERROR.to_string(),
    }
}

pub fn reminder_list(reminders: &[Reminder], now: &DateTime<FixedOffset>) -> String {
    if reminders.is_empty() {
        return "You have no pending reminders.".to_string();
    }

    let lines = reminders
        .iter()
        .map(|reminder| {
            let mut line = format!(
                "#{} <b>{}</b> ({})",
                reminder.id,
                format_full(&reminder.fire_at),
                time_until(&reminder.fire_at, now)
            );
            if let Some(text) = &reminder.text {
                line.push_str(&format!(" {}", html::escape(text)));
            }
            line
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!("⏰ <b>Your reminders</b>\n{lines}")
}

pub fn list_keyboard(reminders: &[Reminder]) -> InlineKeyboardMarkup {
    let rows = reminders
        .iter()
        .map(|reminder| {
            vec![InlineKeyboardButton::callback(
                format!("❌ {}", format_short(&reminder.fire_at)),
                delete_callback_data(reminder.id),
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(rows)
}

pub fn delete_callback_data(id: ReminderId) -> String {
    format!("{DELETE_PREFIX}{id}")
}

pub fn parse_delete_callback(data: &str) -> Option<ReminderId> {
    data.strip_prefix(DELETE_PREFIX)?.parse().ok()
}

pub fn cancel_reply(id: ReminderId, cancelled: bool) -> String {
    if cancelled {
        format!("🗑 Reminder #{id} cancelled.")
    } else {
        format!("There is no pending reminder #{id}.")
    }
}

pub fn cancel_usage() -> String {
    "Usage: /cancel &lt;id&gt;. Use /list to see the ids.".to_string()
}

pub fn notification(notification: &Notification) -> String {
    match notification.kind {
        NotificationKind::Scheduled => match &notification.text {
            Some(text) => format!("⏰ <b>Reminder!</b>\n{}", html::escape(text)),
            None => format!(
                "⏰ <b>Reminder!</b> It is {}, {}.",
                format_time(&notification.fire_at),
                format_date(&notification.fire_at)
            ),
        },
        NotificationKind::Daily => format!(
            "🔁 <b>Daily reminder</b> for {}.",
            format_time(&notification.fire_at)
        ),
    }
}

pub fn stats(snapshot: &StatsSnapshot) -> String {
    format!(
        "📊 <b>Bot statistics</b>
Running since: {}
Uptime: {}
Messages processed: {}
Reminders sent: {}
Errors: {}",
        format_full(&snapshot.started_at),
        format_uptime(snapshot.uptime),
        snapshot.messages,
        snapshot.sent,
        snapshot.errors
    )
}

fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3600;
    let minutes = seconds % 3600 / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else {
        format!("{hours}h {minutes}m")
    }
}

#[cfg(test)]
mod tests;
