mod model;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use model::{ReminderStorageModel, encode_instant};
use thiserror::Error;
use ticklr_models::reminder::{NewReminder, OwnerId, Reminder, ReminderId, ReminderPolicy};

use crate::reminder::{ReminderStorage, retention_cutoff};

#[derive(Debug, Error)]
pub enum SqliteReminderError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Stored {column} value {value:?} is not an RFC 3339 timestamp")]
    InvalidTimestamp {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

const INSERT_REMINDER: &str = "
INSERT OR REPLACE INTO reminders (owner_id, fire_at, text, created_at, sent)
VALUES (?, ?, ?, ?, FALSE)
RETURNING *";

pub struct SqliteReminderStorage {
    pool: sqlx::SqlitePool,
    policy: ReminderPolicy,
}

impl SqliteReminderStorage {
    pub fn new(pool: sqlx::SqlitePool, policy: ReminderPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn policy(&self) -> ReminderPolicy {
        self.policy
    }
}

fn into_reminders(models: Vec<ReminderStorageModel>) -> Result<Vec<Reminder>, SqliteReminderError> {
    models.into_iter().map(Reminder::try_from).collect()
}

#[async_trait]
impl ReminderStorage for SqliteReminderStorage {
    type Error = SqliteReminderError;

    async fn create(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        let NewReminder {
            owner_id,
            fire_at,
            text,
            created_at,
        } = reminder;
        let fire_at = encode_instant(&fire_at);
        let created_at = encode_instant(&created_at);

        let mut tx = self.pool.begin().await?;

        if self.policy == ReminderPolicy::SinglePerOwner {
            let replaced = sqlx::query("DELETE FROM reminders WHERE owner_id = ? AND sent = FALSE")
                .bind(owner_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if replaced > 0 {
                log::info!("Replacing pending reminder [owner_id = {owner_id}]");
            }
        }

        let created = sqlx::query_as::<_, ReminderStorageModel>(INSERT_REMINDER)
            .bind(owner_id)
            .bind(fire_at)
            .bind(text)
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        created.try_into()
    }

    async fn get_due(&self, now: DateTime<FixedOffset>) -> Result<Vec<Reminder>, Self::Error> {
        let reminders = sqlx::query_as::<_, ReminderStorageModel>(
            "SELECT * FROM reminders
WHERE sent = FALSE AND unixepoch(fire_at) <= unixepoch(?)",
        )
        .bind(encode_instant(&now))
        .fetch_all(&self.pool)
        .await?;

        into_reminders(reminders)
    }

    async fn get_owner_reminders(&self, owner_id: OwnerId) -> Result<Vec<Reminder>, Self::Error> {
        let reminders = sqlx::query_as::<_, ReminderStorageModel>(
            "SELECT * FROM reminders
WHERE owner_id = ? AND sent = FALSE
ORDER BY unixepoch(fire_at), id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        into_reminders(reminders)
    }

    async fn mark_sent(&self, id: ReminderId) -> Result<(), Self::Error> {
        let updated = sqlx::query("UPDATE reminders SET sent = TRUE WHERE id = ? AND sent = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            log::debug!("Reminder was already sent or is gone [reminder_id = {id}]");
        }

        Ok(())
    }

    async fn delete(&self, id: ReminderId, owner_id: OwnerId) -> Result<bool, Self::Error> {
        let deleted =
            sqlx::query("DELETE FROM reminders WHERE id = ? AND owner_id = ? AND sent = FALSE")
                .bind(id)
                .bind(owner_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if deleted == 0 {
            log::warn!("No pending reminder to delete [reminder_id = {id}, owner_id = {owner_id}]");
        }

        Ok(deleted > 0)
    }

    async fn count(&self, owner_id: OwnerId) -> Result<u64, Self::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reminders WHERE owner_id = ? AND sent = FALSE")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }

    async fn cleanup(
        &self,
        retention_days: u32,
        now: DateTime<FixedOffset>,
    ) -> Result<u64, Self::Error> {
        let Some(cutoff) = retention_cutoff(retention_days, &now) else {
            log::warn!("Retention of {retention_days} days is out of range, nothing removed");
            return Ok(0);
        };
        let deleted = sqlx::query(
            "DELETE FROM reminders
WHERE sent = TRUE AND unixepoch(created_at) < unixepoch(?)",
        )
        .bind(encode_instant(&cutoff))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted > 0 {
            log::info!("Removed {deleted} sent reminders created before {cutoff}");
        }

        Ok(deleted)
    }
}
