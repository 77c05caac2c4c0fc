use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::reminder::{OwnerId, ReminderPolicy};

#[derive(Deserialize, Debug)]
pub struct TelegramSettings {
    pub token: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub policy: ReminderPolicy,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://reminders.db".to_string(),
            policy: ReminderPolicy::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SchedulerSettings {
    pub sweep_interval_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    pub retention_days: u32,
    /// Offset of the civil timezone all reminders live in, east of UTC.
    pub utc_offset_minutes: i32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            retry_attempts: 3,
            retry_delay_secs: 5,
            retention_days: 7,
            utc_offset_minutes: 6 * 60,
        }
    }
}

impl SchedulerSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AccessSettings {
    pub allowed_users: Vec<OwnerId>,
    pub admin_user_id: Option<OwnerId>,
}

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub access: AccessSettings,
}
