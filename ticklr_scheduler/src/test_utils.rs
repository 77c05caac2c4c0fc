use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use ticklr_models::reminder::{NewReminder, OwnerId, Reminder, ReminderId};
use ticklr_storage::{InMemoryReminderStorage, ReminderStorage};

use crate::delivery::{Notification, ReminderDeliveryChannel};

pub fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

pub type ReceivedNotifications = Arc<Mutex<Vec<Notification>>>;

/// Records delivered notifications; can be told to fail for a recipient a number of times.
#[derive(Default)]
pub struct TestDeliveryChannel {
    received: ReceivedNotifications,
    failures: Mutex<HashMap<i64, u32>>,
    attempts: AtomicU32,
}

impl TestDeliveryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_times(&self, recipient: i64, times: u32) {
        self.failures.lock().unwrap().insert(recipient, times);
    }

    pub fn fail_always(&self, recipient: i64) {
        self.fail_times(recipient, u32::MAX);
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReminderDeliveryChannel for TestDeliveryChannel {
    async fn send_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(left) = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&notification.recipient)
            .filter(|left| **left > 0)
        {
            *left -= 1;
            anyhow::bail!("recipient {} unreachable", notification.recipient);
        }

        self.received.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("storage unavailable")]
pub struct StorageUnavailable;

/// In-memory storage whose individual operations can be switched to fail.
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: InMemoryReminderStorage,
    pub fail_create: AtomicBool,
    pub fail_get_due: AtomicBool,
    pub fail_mark_sent: AtomicBool,
    pub fail_cleanup: AtomicBool,
    pub cleanups: AtomicU32,
}

fn check(flag: &AtomicBool) -> Result<(), StorageUnavailable> {
    if flag.load(Ordering::SeqCst) {
        Err(StorageUnavailable)
    } else {
        Ok(())
    }
}

fn infallible<T>(result: Result<T, std::convert::Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

#[async_trait]
impl ReminderStorage for FlakyStorage {
    type Error = StorageUnavailable;

    async fn create(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        check(&self.fail_create)?;
        Ok(infallible(self.inner.create(reminder).await))
    }

    async fn get_due(&self, now: DateTime<FixedOffset>) -> Result<Vec<Reminder>, Self::Error> {
        check(&self.fail_get_due)?;
        Ok(infallible(self.inner.get_due(now).await))
    }

    async fn get_owner_reminders(&self, owner_id: OwnerId) -> Result<Vec<Reminder>, Self::Error> {
        Ok(infallible(self.inner.get_owner_reminders(owner_id).await))
    }

    async fn mark_sent(&self, id: ReminderId) -> Result<(), Self::Error> {
        check(&self.fail_mark_sent)?;
        infallible(self.inner.mark_sent(id).await);
        Ok(())
    }

    async fn delete(&self, id: ReminderId, owner_id: OwnerId) -> Result<bool, Self::Error> {
        Ok(infallible(self.inner.delete(id, owner_id).await))
    }

    async fn count(&self, owner_id: OwnerId) -> Result<u64, Self::Error> {
        Ok(infallible(self.inner.count(owner_id).await))
    }

    async fn cleanup(
        &self,
        retention_days: u32,
        now: DateTime<FixedOffset>,
    ) -> Result<u64, Self::Error> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        check(&self.fail_cleanup)?;
        Ok(infallible(self.inner.cleanup(retention_days, now).await))
    }
}
