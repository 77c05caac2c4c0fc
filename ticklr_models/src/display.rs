//! User-facing rendering of reminder instants.

use chrono::{DateTime, FixedOffset};

pub fn format_date(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%d.%m.%Y").to_string()
}

pub fn format_time(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%H:%M").to_string()
}

pub fn format_short(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%d.%m %H:%M").to_string()
}

/// `HH:MM DD.MM.YYYY`, the same shape the time parser accepts first.
pub fn format_full(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%H:%M %d.%m.%Y").to_string()
}

/// Coarse "time left" text, at most two units, minutes rounded down.
pub fn time_until(target: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> String {
    let left = *target - *now;
    if left <= chrono::Duration::zero() {
        return "now".to_string();
    }

    let days = left.num_days();
    let hours = left.num_hours() % 24;
    let minutes = left.num_minutes() % 60;

    match (days, hours, minutes) {
        (0, 0, 0) => "in less than a minute".to_string(),
        (0, 0, m) => format!("in {m}m"),
        (0, h, 0) => format!("in {h}h"),
        (0, h, m) => format!("in {h}h {m}m"),
        (d, 0, _) => format!("in {d}d"),
        (d, h, _) => format!("in {d}d {h}h"),
    }
}
