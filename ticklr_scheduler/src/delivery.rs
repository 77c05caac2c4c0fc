use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use ticklr_models::reminder::Reminder;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NotificationKind {
    /// A stored one-off reminder.
    Scheduled,
    Daily,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Transport address of the recipient, e.g. a chat id.
    pub recipient: i64,
    pub fire_at: DateTime<FixedOffset>,
    pub text: Option<String>,
    pub kind: NotificationKind,
}

impl From<&Reminder> for Notification {
    fn from(reminder: &Reminder) -> Self {
        Self {
            recipient: reminder.owner_id,
            fire_at: reminder.fire_at,
            text: reminder.text.clone(),
            kind: NotificationKind::Scheduled,
        }
    }
}

/// Transport that gets a fired reminder in front of its owner.
///
/// Any `Err` counts as a failed attempt; the caller decides whether to retry.
#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn send_notification(&self, notification: &Notification) -> anyhow::Result<()>;
}
