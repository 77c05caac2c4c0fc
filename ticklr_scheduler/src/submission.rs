use std::{collections::HashSet, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use ticklr_models::{
    clock::Clock,
    reminder::{NewReminder, OwnerId, Reminder, ReminderId},
    time_input::{TimeValidation, validate_reminder_time},
};
use ticklr_storage::ReminderStorage;

/// Allow-list of owners permitted to create reminders. Empty means everyone.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    allowed: HashSet<OwnerId>,
}

impl AccessGate {
    pub fn new(allowed: impl IntoIterator<Item = OwnerId>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn allows(&self, owner_id: OwnerId) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&owner_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created {
        reminder: Reminder,
        today_only: bool,
        /// `None` when the count could not be read after the reminder was stored.
        pending_count: Option<u64>,
    },
    InvalidFormat,
    PastTime {
        today_only: bool,
    },
    AccessDenied,
    Failed,
}

impl SubmitOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            SubmitOutcome::Created { .. } => "success",
            SubmitOutcome::InvalidFormat => "invalid_format",
            SubmitOutcome::PastTime { .. } => "past_time",
            SubmitOutcome::AccessDenied => "access_denied",
            SubmitOutcome::Failed => "error",
        }
    }
}

/// Everything a front-end may ask about reminders.
#[async_trait]
pub trait ReminderRequests: Send + Sync + 'static {
    /// The first line of `raw_text` is the time expression, later lines are the reminder text.
    async fn submit(&self, owner_id: OwnerId, raw_text: &str) -> SubmitOutcome;

    /// Pending reminders of the owner, earliest first.
    async fn list(&self, owner_id: OwnerId) -> anyhow::Result<Vec<Reminder>>;

    async fn cancel(&self, owner_id: OwnerId, id: ReminderId) -> anyhow::Result<bool>;

    fn now(&self) -> DateTime<FixedOffset>;
}

pub struct ReminderService<S: ReminderStorage> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    gate: AccessGate,
}

impl<S: ReminderStorage + 'static> ReminderService<S> {
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>, gate: AccessGate) -> Self {
        Self {
            storage,
            clock,
            gate,
        }
    }
}

fn split_payload(raw_text: &str) -> (&str, Option<String>) {
    let raw_text = raw_text.trim();
    let (time_expr, rest) = raw_text.split_once('\n').unwrap_or((raw_text, ""));

    let text = rest.trim();
    let text = (!text.is_empty()).then(|| text.to_string());

    (time_expr.trim(), text)
}

#[async_trait]
impl<S: ReminderStorage + 'static> ReminderRequests for ReminderService<S> {
    async fn submit(&self, owner_id: OwnerId, raw_text: &str) -> SubmitOutcome {
        if !self.gate.allows(owner_id) {
            log::warn!("Rejected reminder from owner outside the allow-list [owner_id = {owner_id}]");
            return SubmitOutcome::AccessDenied;
        }

        let (time_expr, text) = split_payload(raw_text);
        let now = self.clock.now();

        let (fire_at, today_only) = match validate_reminder_time(time_expr, &now) {
            TimeValidation::Success {
                fire_at,
                today_only,
            } => (fire_at, today_only),
            TimeValidation::InvalidFormat => {
                log::debug!("Unrecognized time expression [owner_id = {owner_id}]: {time_expr:?}");
                return SubmitOutcome::InvalidFormat;
            }
            TimeValidation::PastTime { today_only } => {
                return SubmitOutcome::PastTime { today_only };
            }
        };

        let new_reminder = NewReminder {
            owner_id,
            fire_at,
            text,
            created_at: now,
        };

        let reminder = match self.storage.create(new_reminder).await {
            Ok(reminder) => reminder,
            Err(error) => {
                log::error!("Could not store reminder [owner_id = {owner_id}]: {error}");
                return SubmitOutcome::Failed;
            }
        };

        log::info!(
            "Reminder created [reminder_id = {}, owner_id = {owner_id}, fire_at = {}]",
            reminder.id,
            reminder.fire_at
        );

        let pending_count = match self.storage.count(owner_id).await {
            Ok(count) => Some(count),
            Err(error) => {
                log::warn!("Could not count pending reminders [owner_id = {owner_id}]: {error}");
                None
            }
        };

        SubmitOutcome::Created {
            reminder,
            today_only,
            pending_count,
        }
    }

    async fn list(&self, owner_id: OwnerId) -> anyhow::Result<Vec<Reminder>> {
        self.storage
            .get_owner_reminders(owner_id)
            .await
            .with_context(|| format!("Could not list reminders of owner {owner_id}"))
    }

    async fn cancel(&self, owner_id: OwnerId, id: ReminderId) -> anyhow::Result<bool> {
        let deleted = self
            .storage
            .delete(id, owner_id)
            .await
            .with_context(|| format!("Could not delete reminder {id}"))?;

        if deleted {
            log::info!("Reminder cancelled [reminder_id = {id}, owner_id = {owner_id}]");
        }

        Ok(deleted)
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }
}
