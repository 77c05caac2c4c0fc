use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};
use serde::Deserialize;

pub type ReminderId = i64;
pub type OwnerId = i64;

/// How the store treats several pending reminders of the same owner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPolicy {
    /// Creating a reminder replaces the owner's pending one.
    SinglePerOwner,
    /// Any number of pending reminders, unique on `(owner_id, fire_at)`.
    #[default]
    MultiplePerOwner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub owner_id: OwnerId,
    pub fire_at: DateTime<FixedOffset>,
    pub text: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub sent: bool,
}

impl Reminder {
    pub fn is_due(&self, now: &DateTime<FixedOffset>) -> bool {
        !self.sent && self.fire_at <= *now
    }
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner_id: OwnerId,
    pub fire_at: DateTime<FixedOffset>,
    pub text: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// Wall-clock minute of a daily reminder. Seconds are dropped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderFireTime(NaiveTime);

impl ReminderFireTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = NaiveTime::from_hms_opt(inner.hour(), inner.minute(), 0)
            .expect("Hour and minute come from a valid time.");
        Self(normalized_time)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn into_time(self) -> NaiveTime {
        self.0
    }

    pub fn matches(&self, other: &NaiveTime) -> bool {
        self.0.hour() == other.hour() && self.0.minute() == other.minute()
    }
}
