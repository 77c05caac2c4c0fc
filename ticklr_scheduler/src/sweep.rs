use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Timelike};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use ticklr_models::{clock::Clock, reminder::Reminder};
use ticklr_storage::{DailyReminderManager, DueDailyReminder, ReminderStorage};

use crate::{
    delivery::{Notification, NotificationKind, ReminderDeliveryChannel},
    delivery_loop::LoopState,
    retry::{RetryError, RetryPolicy},
    stats::DeliveryStats,
};

/// What a sweep sees of the loop driving it.
pub struct SweepContext {
    cancellation_token: CancellationToken,
    state: watch::Sender<LoopState>,
}

impl SweepContext {
    pub fn new(cancellation_token: CancellationToken, state: watch::Sender<LoopState>) -> Self {
        Self {
            cancellation_token,
            state,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn set_state(&self, state: LoopState) {
        self.state.send_replace(state);
    }
}

/// One pass over whatever is due. Called by the delivery loop once per interval.
///
/// Failures of single deliveries are handled inside the sweep; an `Err` means the whole pass
/// could not run.
#[async_trait]
pub trait Sweep: Send + Sync + 'static {
    async fn sweep(&self, ctx: &SweepContext) -> anyhow::Result<()>;
}

enum Delivery {
    Delivered,
    Failed,
    Cancelled,
}

async fn deliver(
    channel: &dyn ReminderDeliveryChannel,
    retry: &RetryPolicy,
    notification: &Notification,
    ctx: &SweepContext,
) -> Delivery {
    let result = retry
        .run(ctx.cancellation_token(), |_| {
            channel.send_notification(notification)
        })
        .await;

    match result {
        Ok(()) => Delivery::Delivered,
        Err(RetryError::Cancelled { attempts }) => {
            log::info!(
                "Delivery cancelled, reminder stays pending [recipient = {}, attempts = {attempts}]",
                notification.recipient
            );
            Delivery::Cancelled
        }
        Err(error @ RetryError::Exhausted { .. }) => {
            log::error!(
                "Could not deliver reminder [recipient = {}]: {error}",
                notification.recipient
            );
            Delivery::Failed
        }
    }
}

pub struct StoredReminderSweep<S: ReminderStorage> {
    storage: Arc<S>,
    channel: Arc<dyn ReminderDeliveryChannel>,
    clock: Arc<dyn Clock>,
    stats: Arc<DeliveryStats>,
    retry: RetryPolicy,
    retention_days: u32,
}

impl<S: ReminderStorage + 'static> StoredReminderSweep<S> {
    pub fn new(
        storage: Arc<S>,
        channel: Arc<dyn ReminderDeliveryChannel>,
        clock: Arc<dyn Clock>,
        stats: Arc<DeliveryStats>,
    ) -> Self {
        Self {
            storage,
            channel,
            clock,
            stats,
            retry: RetryPolicy::default(),
            retention_days: 7,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_retention_days(mut self, retention_days: u32) -> Self {
        self.retention_days = retention_days;
        self
    }

    async fn deliver_reminder(&self, reminder: &Reminder, ctx: &SweepContext) {
        let notification = Notification::from(reminder);

        match deliver(self.channel.as_ref(), &self.retry, &notification, ctx).await {
            Delivery::Delivered => {}
            Delivery::Cancelled => return,
            Delivery::Failed => {
                self.stats.record_error();
                return;
            }
        }

        match self.storage.mark_sent(reminder.id).await {
            Ok(()) => {
                self.stats.record_sent();
                log::info!(
                    "Reminder delivered [reminder_id = {}, owner_id = {}]",
                    reminder.id,
                    reminder.owner_id
                );
            }
            Err(error) => {
                self.stats.record_error();
                log::error!(
                    "Reminder delivered but not marked as sent, it may fire again [reminder_id = {}]: {error}",
                    reminder.id
                );
            }
        }
    }

    async fn cleanup(&self, now: DateTime<FixedOffset>) {
        match self.storage.cleanup(self.retention_days, now).await {
            Ok(removed) => log::debug!(
                "Retention cleanup finished [removed = {removed}, retention_days = {}]",
                self.retention_days
            ),
            Err(error) => {
                self.stats.record_error();
                log::error!("Retention cleanup failed: {error}");
            }
        }
    }
}

#[async_trait]
impl<S: ReminderStorage + 'static> Sweep for StoredReminderSweep<S> {
    async fn sweep(&self, ctx: &SweepContext) -> anyhow::Result<()> {
        ctx.set_state(LoopState::Sweeping);
        let now = self.clock.now();

        let due = self
            .storage
            .get_due(now)
            .await
            .context("Could not load due reminders")?;

        if !due.is_empty() {
            log::info!("Delivering due reminders [count = {}]", due.len());
            ctx.set_state(LoopState::Delivering(due.len()));
        }

        for reminder in &due {
            if ctx.is_cancelled() {
                log::info!("Sweep interrupted, remaining reminders stay pending");
                return Ok(());
            }
            self.deliver_reminder(reminder, ctx).await;
        }

        if now.minute() == 0 && !ctx.is_cancelled() {
            self.cleanup(now).await;
        }

        Ok(())
    }
}

/// Delivers [`DailyReminderManager`] entries whose hour and minute match the current time.
pub struct DailyReminderSweep {
    manager: Arc<DailyReminderManager>,
    channel: Arc<dyn ReminderDeliveryChannel>,
    clock: Arc<dyn Clock>,
    stats: Arc<DeliveryStats>,
    retry: RetryPolicy,
}

impl DailyReminderSweep {
    pub fn new(
        manager: Arc<DailyReminderManager>,
        channel: Arc<dyn ReminderDeliveryChannel>,
        clock: Arc<dyn Clock>,
        stats: Arc<DeliveryStats>,
    ) -> Self {
        Self {
            manager,
            channel,
            clock,
            stats,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn daily_notification(due: &DueDailyReminder, now: &DateTime<FixedOffset>) -> Notification {
    let fire_at = now
        .date_naive()
        .and_time(due.time.into_time())
        .and_local_timezone(*now.offset())
        .single()
        .unwrap_or(*now);

    Notification {
        recipient: due.address,
        fire_at,
        text: None,
        kind: NotificationKind::Daily,
    }
}

#[async_trait]
impl Sweep for DailyReminderSweep {
    async fn sweep(&self, ctx: &SweepContext) -> anyhow::Result<()> {
        ctx.set_state(LoopState::Sweeping);
        let now = self.clock.now();
        let due = self.manager.due_at(now.time()).await;

        if !due.is_empty() {
            ctx.set_state(LoopState::Delivering(due.len()));
        }

        for reminder in &due {
            if ctx.is_cancelled() {
                return Ok(());
            }

            let notification = daily_notification(reminder, &now);
            match deliver(self.channel.as_ref(), &self.retry, &notification, ctx).await {
                Delivery::Delivered => {
                    self.manager.remove(reminder.owner_id).await;
                    self.stats.record_sent();
                    log::info!("Daily reminder delivered [owner_id = {}]", reminder.owner_id);
                }
                Delivery::Failed => self.stats.record_error(),
                Delivery::Cancelled => {}
            }
        }

        Ok(())
    }
}
