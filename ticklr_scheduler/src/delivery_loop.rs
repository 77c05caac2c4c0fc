use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    stats::DeliveryStats,
    sweep::{Sweep, SweepContext},
};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Sweeping,
    /// Delivering this many due reminders.
    Delivering(usize),
    Stopped,
}

/// Runs a [`Sweep`] on a fixed interval until shut down.
pub struct DeliveryLoop {
    sweep: Arc<dyn Sweep>,
    interval: Duration,
    stats: Arc<DeliveryStats>,
}

impl DeliveryLoop {
    /// Intervals shorter than a second are raised to one second.
    pub fn new(sweep: Arc<dyn Sweep>, interval: Duration, stats: Arc<DeliveryStats>) -> Self {
        Self {
            sweep,
            interval: interval.max(MIN_INTERVAL),
            stats,
        }
    }

    /// Starts the loop on the current runtime. The first sweep runs immediately.
    pub fn spawn(self) -> DeliveryLoopHandle {
        let cancellation_token = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(LoopState::Idle);
        let ctx = SweepContext::new(cancellation_token.child_token(), state_tx);

        let task = tokio::spawn(self.run(ctx));

        DeliveryLoopHandle {
            task,
            cancellation_token,
            state: state_rx,
        }
    }

    async fn run(self, ctx: SweepContext) {
        log::info!("Delivery loop started [interval = {:?}]", self.interval);

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancellation_token().cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(error) = self.sweep.sweep(&ctx).await {
                self.stats.record_error();
                log::error!("Sweep failed, waiting for the next one: {error:#}");
            }

            if ctx.is_cancelled() {
                break;
            }
            ctx.set_state(LoopState::Idle);
        }

        ctx.set_state(LoopState::Stopped);
        log::info!("Delivery loop stopped");
    }
}

pub struct DeliveryLoopHandle {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
    state: watch::Receiver<LoopState>,
}

impl DeliveryLoopHandle {
    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.clone()
    }

    /// Cancels the loop and waits up to `timeout` for it to finish. Returns whether it did;
    /// a loop still running after `timeout` is aborted.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        self.cancellation_token.cancel();
        let abort_handle = self.task.abort_handle();

        match time::timeout(timeout, self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(error)) => {
                log::error!("Delivery loop task failed: {error}");
                false
            }
            Err(_) => {
                log::warn!("Delivery loop did not stop within {timeout:?}, aborting");
                abort_handle.abort();
                false
            }
        }
    }
}
