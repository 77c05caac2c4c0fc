use chrono::{DateTime, FixedOffset, SecondsFormat};
use ticklr_models::reminder::Reminder;

use super::SqliteReminderError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReminderStorageModel {
    pub id: i64,
    pub owner_id: i64,
    pub fire_at: String,
    pub text: Option<String>,
    pub created_at: String,
    pub sent: bool,
}

impl From<Reminder> for ReminderStorageModel {
    fn from(value: Reminder) -> Self {
        Self {
            id: value.id,
            owner_id: value.owner_id,
            fire_at: encode_instant(&value.fire_at),
            text: value.text,
            created_at: encode_instant(&value.created_at),
            sent: value.sent,
        }
    }
}

impl TryFrom<ReminderStorageModel> for Reminder {
    type Error = SqliteReminderError;

    fn try_from(value: ReminderStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            owner_id: value.owner_id,
            fire_at: decode_instant("fire_at", &value.fire_at)?,
            text: value.text,
            created_at: decode_instant("created_at", &value.created_at)?,
            sent: value.sent,
        })
    }
}

pub(super) fn encode_instant(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn decode_instant(
    column: &'static str,
    value: &str,
) -> Result<DateTime<FixedOffset>, SqliteReminderError> {
    DateTime::parse_from_rfc3339(value).map_err(|source| SqliteReminderError::InvalidTimestamp {
        column,
        value: value.to_string(),
        source,
    })
}
