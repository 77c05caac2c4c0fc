use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use chrono::{DateTime, FixedOffset};
use tokio::time::Instant;

/// Process-lifetime counters shared by the delivery loop and the request path.
#[derive(Debug)]
pub struct DeliveryStats {
    sent: AtomicU64,
    errors: AtomicU64,
    messages: AtomicU64,
    started_at: DateTime<FixedOffset>,
    started: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub errors: u64,
    pub messages: u64,
    pub started_at: DateTime<FixedOffset>,
    pub uptime: Duration,
}

impl DeliveryStats {
    pub fn new(started_at: DateTime<FixedOffset>) -> Self {
        Self {
            sent: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            messages: AtomicU64::new(0),
            started_at,
            started: Instant::now(),
        }
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// An incoming user request, whatever its outcome.
    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn snapshot_reflects_counters_and_uptime() {
        let started_at = DateTime::parse_from_rfc3339("2025-06-20T10:00:00+06:00").unwrap();
        let stats = DeliveryStats::new(started_at);

        stats.record_sent();
        stats.record_sent();
        stats.record_error();
        stats.record_message();
        tokio::time::advance(Duration::from_secs(90)).await;

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                sent: 2,
                errors: 1,
                messages: 1,
                started_at,
                uptime: Duration::from_secs(90),
            }
        );
    }
}
