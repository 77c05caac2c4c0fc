use std::{collections::HashMap, convert::Infallible};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::sync::RwLock;

use ticklr_models::reminder::{NewReminder, OwnerId, Reminder, ReminderId, ReminderPolicy};

use crate::reminder::{ReminderStorage, retention_cutoff};

struct InMemoryReminderStore {
    current_id: ReminderId,
    storage: HashMap<ReminderId, Reminder>,
}

/// Non-durable [`ReminderStorage`] with the same policy semantics as the SQLite one.
pub struct InMemoryReminderStorage {
    policy: ReminderPolicy,
    store: RwLock<InMemoryReminderStore>,
}

impl InMemoryReminderStorage {
    pub fn new(policy: ReminderPolicy) -> Self {
        InMemoryReminderStorage {
            policy,
            store: RwLock::new(InMemoryReminderStore {
                current_id: 1,
                storage: HashMap::new(),
            }),
        }
    }

    pub async fn get(&self, id: ReminderId) -> Option<Reminder> {
        self.store.read().await.storage.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.storage.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryReminderStorage {
    fn default() -> Self {
        Self::new(ReminderPolicy::default())
    }
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    type Error = Infallible;

    async fn create(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        let mut store = self.store.write().await;

        match self.policy {
            ReminderPolicy::SinglePerOwner => store
                .storage
                .retain(|_, r| r.owner_id != reminder.owner_id || r.sent),
            ReminderPolicy::MultiplePerOwner => {}
        }
        store
            .storage
            .retain(|_, r| !(r.owner_id == reminder.owner_id && r.fire_at == reminder.fire_at));

        let id = store.current_id;
        store.current_id += 1;

        let created = Reminder {
            id,
            owner_id: reminder.owner_id,
            fire_at: reminder.fire_at,
            text: reminder.text,
            created_at: reminder.created_at,
            sent: false,
        };
        store.storage.insert(id, created.clone());

        log::debug!(
            "Stored reminder in memory [reminder_id = {}, owner_id = {}]",
            id,
            created.owner_id
        );
        Ok(created)
    }

    async fn get_due(&self, now: DateTime<FixedOffset>) -> Result<Vec<Reminder>, Self::Error> {
        let store = self.store.read().await;
        Ok(store
            .storage
            .values()
            .filter(|r| r.is_due(&now))
            .cloned()
            .collect())
    }

    async fn get_owner_reminders(&self, owner_id: OwnerId) -> Result<Vec<Reminder>, Self::Error> {
        let store = self.store.read().await;
        let mut reminders: Vec<Reminder> = store
            .storage
            .values()
            .filter(|r| r.owner_id == owner_id && !r.sent)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| (r.fire_at, r.id));

        Ok(reminders)
    }

    async fn mark_sent(&self, id: ReminderId) -> Result<(), Self::Error> {
        if let Some(reminder) = self.store.write().await.storage.get_mut(&id) {
            reminder.sent = true;
        }

        Ok(())
    }

    async fn delete(&self, id: ReminderId, owner_id: OwnerId) -> Result<bool, Self::Error> {
        let mut store = self.store.write().await;
        let owned_and_pending = store
            .storage
            .get(&id)
            .is_some_and(|r| r.owner_id == owner_id && !r.sent);

        if owned_and_pending {
            store.storage.remove(&id);
        }

        Ok(owned_and_pending)
    }

    async fn count(&self, owner_id: OwnerId) -> Result<u64, Self::Error> {
        let store = self.store.read().await;
        let count = store
            .storage
            .values()
            .filter(|r| r.owner_id == owner_id && !r.sent)
            .count();

        Ok(count as u64)
    }

    async fn cleanup(
        &self,
        retention_days: u32,
        now: DateTime<FixedOffset>,
    ) -> Result<u64, Self::Error> {
        let Some(cutoff) = retention_cutoff(retention_days, &now) else {
            return Ok(0);
        };
        let mut store = self.store.write().await;
        let before = store.storage.len();
        store
            .storage
            .retain(|_, r| !(r.sent && r.created_at < cutoff));

        Ok((before - store.storage.len()) as u64)
    }
}
