use std::collections::HashMap;

use chrono::NaiveTime;
use tokio::sync::RwLock;

use ticklr_models::reminder::{OwnerId, ReminderFireTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyReminder {
    pub time: ReminderFireTime,
    /// Where the notification goes, e.g. a chat id.
    pub address: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDailyReminder {
    pub owner_id: OwnerId,
    pub address: i64,
    pub time: ReminderFireTime,
}

/// One repeating time-of-day reminder per owner, kept only in memory.
///
/// An entry exists while the reminder is pending. Matching looks at hour and minute only.
#[derive(Default)]
pub struct DailyReminderManager {
    reminders: RwLock<HashMap<OwnerId, DailyReminder>>,
}

impl DailyReminderManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, owner_id: OwnerId, time_of_day: NaiveTime, address: i64) {
        let reminder = DailyReminder {
            time: ReminderFireTime::new(time_of_day),
            address,
        };

        let previous = self.reminders.write().await.insert(owner_id, reminder);
        if previous.is_some() {
            log::debug!("Overwrote daily reminder [owner_id = {owner_id}]");
        }
    }

    pub async fn remove(&self, owner_id: OwnerId) -> bool {
        self.reminders.write().await.remove(&owner_id).is_some()
    }

    pub async fn has(&self, owner_id: OwnerId) -> bool {
        self.reminders.read().await.contains_key(&owner_id)
    }

    pub async fn get(&self, owner_id: OwnerId) -> Option<DailyReminder> {
        self.reminders.read().await.get(&owner_id).copied()
    }

    pub async fn due_at(&self, time_of_day: NaiveTime) -> Vec<DueDailyReminder> {
        self.reminders
            .read()
            .await
            .iter()
            .filter(|(_, reminder)| reminder.time.matches(&time_of_day))
            .map(|(&owner_id, reminder)| DueDailyReminder {
                owner_id,
                address: reminder.address,
                time: reminder.time,
            })
            .collect()
    }

    /// Returns how many entries were dropped.
    pub async fn clear_all(&self) -> usize {
        let mut reminders = self.reminders.write().await;
        let cleared = reminders.len();
        reminders.clear();

        cleared
    }

    pub async fn count(&self) -> usize {
        self.reminders.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_strategy::proptest;

    fn time(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    fn tokio_ct(future: impl Future<Output = Result<(), TestCaseError>>) -> Result<(), TestCaseError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[tokio::test]
    async fn set_overwrites_previous_entry() {
        let manager = DailyReminderManager::new();

        manager.set(1, time(8, 0, 0), 100).await;
        manager.set(1, time(9, 30, 45), 101).await;

        let reminder = manager.get(1).await.unwrap();
        assert_eq!(reminder.time.into_time(), time(9, 30, 0));
        assert_eq!(reminder.address, 101);
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn due_matches_hour_and_minute_only() {
        let manager = DailyReminderManager::new();
        manager.set(1, time(8, 0, 0), 100).await;
        manager.set(2, time(8, 1, 0), 200).await;

        let due = manager.due_at(time(8, 0, 59)).await;

        assert_eq!(
            due,
            vec![DueDailyReminder {
                owner_id: 1,
                address: 100,
                time: ReminderFireTime::new(time(8, 0, 0)),
            }]
        );
        assert!(manager.due_at(time(20, 0, 0)).await.is_empty());
    }

    #[tokio::test]
    async fn remove_and_has() {
        let manager = DailyReminderManager::new();
        manager.set(1, time(8, 0, 0), 100).await;

        assert!(manager.has(1).await);
        assert!(manager.remove(1).await);
        assert!(!manager.has(1).await);
        assert!(!manager.remove(1).await);
        assert!(manager.get(1).await.is_none());
    }

    #[tokio::test]
    async fn clear_all_reports_dropped_entries() {
        let manager = DailyReminderManager::new();
        manager.set(1, time(8, 0, 0), 100).await;
        manager.set(2, time(9, 0, 0), 200).await;

        assert_eq!(manager.clear_all().await, 2);
        assert_eq!(manager.count().await, 0);
        assert_eq!(manager.clear_all().await, 0);
    }

    #[proptest(async = tokio_ct)]
    async fn stored_time_is_due_whatever_the_seconds(
        #[strategy(0..24u32)] hour: u32,
        #[strategy(0..60u32)] minute: u32,
        #[strategy(0..60u32)] set_second: u32,
        #[strategy(0..60u32)] check_second: u32,
    ) {
        let manager = DailyReminderManager::new();
        manager.set(7, time(hour, minute, set_second), 7).await;

        let due = manager.due_at(time(hour, minute, check_second)).await;

        prop_assert_eq!(due.len(), 1);
        prop_assert_eq!(due[0].owner_id, 7);
    }
}
