pub mod delivery;
pub mod delivery_loop;
pub mod retry;
pub mod stats;
pub mod submission;
pub mod sweep;

pub use delivery::{Notification, NotificationKind, ReminderDeliveryChannel};
pub use delivery_loop::{DeliveryLoop, DeliveryLoopHandle, LoopState};
pub use retry::{RetryError, RetryPolicy};
pub use stats::{DeliveryStats, StatsSnapshot};
pub use submission::{AccessGate, ReminderRequests, ReminderService, SubmitOutcome};
pub use sweep::{DailyReminderSweep, StoredReminderSweep, Sweep, SweepContext};

#[cfg(test)]
mod test_utils;
