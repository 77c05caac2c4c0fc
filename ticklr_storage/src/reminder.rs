use async_trait::async_trait;
use chrono::{DateTime, Days, FixedOffset, NaiveTime};

use ticklr_models::reminder::{NewReminder, OwnerId, Reminder, ReminderId};

/// Durable record of pending and sent reminders.
///
/// Every call is atomic on its own; callers never need to group calls into a transaction.
#[async_trait]
pub trait ReminderStorage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persists a reminder according to the store's [`ReminderPolicy`](ticklr_models::reminder::ReminderPolicy).
    async fn create(&self, reminder: NewReminder) -> Result<Reminder, Self::Error>;

    /// Pending reminders with `fire_at <= now`, in no particular order.
    async fn get_due(&self, now: DateTime<FixedOffset>) -> Result<Vec<Reminder>, Self::Error>;

    /// Pending reminders of one owner, earliest first.
    async fn get_owner_reminders(&self, owner_id: OwnerId) -> Result<Vec<Reminder>, Self::Error>;

    /// Idempotent: an already sent or unknown id is not an error.
    async fn mark_sent(&self, id: ReminderId) -> Result<(), Self::Error>;

    /// Removes a pending reminder only if it belongs to `owner_id`.
    async fn delete(&self, id: ReminderId, owner_id: OwnerId) -> Result<bool, Self::Error>;

    async fn count(&self, owner_id: OwnerId) -> Result<u64, Self::Error>;

    /// Drops sent reminders created before [`retention_cutoff`]. Returns how many were removed.
    async fn cleanup(
        &self,
        retention_days: u32,
        now: DateTime<FixedOffset>,
    ) -> Result<u64, Self::Error>;
}

/// Start of the day `retention_days` before `now`'s day.
///
/// `None` when that day is outside the representable range, so nothing is old enough to purge.
pub fn retention_cutoff(
    retention_days: u32,
    now: &DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    now.date_naive()
        .checked_sub_days(Days::new(retention_days.into()))?
        .and_time(NaiveTime::MIN)
        .and_local_timezone(*now.offset())
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_midnight_minus_days() {
        let now = DateTime::parse_from_rfc3339("2025-06-20T15:42:10+06:00").unwrap();

        let cutoff = retention_cutoff(7, &now).unwrap();

        assert_eq!(cutoff.to_rfc3339(), "2025-06-13T00:00:00+06:00");
    }

    #[test]
    fn cutoff_crosses_month_boundary() {
        let now = DateTime::parse_from_rfc3339("2025-03-03T00:10:00+06:00").unwrap();

        let cutoff = retention_cutoff(7, &now).unwrap();

        assert_eq!(cutoff.to_rfc3339(), "2025-02-24T00:00:00+06:00");
    }

    #[test]
    fn cutoff_out_of_range_is_none() {
        let now = DateTime::parse_from_rfc3339("2025-06-20T15:42:10+06:00").unwrap();

        assert_eq!(retention_cutoff(u32::MAX, &now), None);
    }
}
