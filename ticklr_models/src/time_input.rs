//! Parsing of free-form reminder times such as `18:00`, `18:00 12.06` or `18:00 12.06.2025`.
//!
//! Every instant produced here carries the offset of the `now` it was resolved against, so the
//! caller decides the civil timezone by choosing its clock.

use std::{str::FromStr, sync::LazyLock};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime};
use regex::{Captures, Regex};
use thiserror::Error;

const TIME: &str = r"([0-9]{1,2}):([0-9]{2})";
const DAY_MONTH: &str = r"([0-9]{1,2})\.([0-9]{1,2})";

static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| shape(&format!(r"{TIME}\s+{DAY_MONTH}\.([0-9]{{4}})")));
static SHORT_YEAR_DATE: LazyLock<Regex> =
    LazyLock::new(|| shape(&format!(r"{TIME}\s+{DAY_MONTH}\.([0-9]{{2}})")));
static NO_YEAR_DATE: LazyLock<Regex> = LazyLock::new(|| shape(&format!(r"{TIME}\s+{DAY_MONTH}")));
static TIME_ONLY: LazyLock<Regex> = LazyLock::new(|| shape(TIME));

fn shape(pattern: &str) -> Regex {
    Regex::new(&format!("^{pattern}$")).expect("Reminder time patterns are valid.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTime {
    pub fire_at: DateTime<FixedOffset>,
    /// Input had no date part and was placed on the current day.
    pub today_only: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("input does not match any supported time shape")]
    Unrecognized,

    #[error("time {hour}:{minute:02} is out of range")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("{day:02}.{month:02}.{year} is not a calendar date")]
    InvalidDate { day: u32, month: u32, year: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeValidation {
    Success {
        fire_at: DateTime<FixedOffset>,
        today_only: bool,
    },
    InvalidFormat,
    PastTime {
        today_only: bool,
    },
}

impl TimeValidation {
    pub fn status(&self) -> &'static str {
        match self {
            TimeValidation::Success { .. } => "success",
            TimeValidation::InvalidFormat => "invalid_format",
            TimeValidation::PastTime { .. } => "past_time",
        }
    }
}

enum DateInput {
    Full { day: u32, month: u32, year: i32 },
    NoYear { day: u32, month: u32 },
    Today,
}

pub fn parse_reminder_time(
    text: &str,
    now: &DateTime<FixedOffset>,
) -> Result<ParsedTime, ParseError> {
    let (hour, minute, date_input) = match_shape(text.trim())?;
    let time =
        NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ParseError::InvalidTime { hour, minute })?;

    let today = now.date_naive();
    let (date, today_only) = match date_input {
        DateInput::Full { day, month, year } => (calendar_date(day, month, year)?, false),
        DateInput::NoYear { day, month } => {
            let this_year = calendar_date(day, month, today.year())?;
            if this_year < today {
                (calendar_date(day, month, today.year() + 1)?, false)
            } else {
                (this_year, false)
            }
        }
        DateInput::Today => (today, true),
    };

    let fire_at = date
        .and_time(time)
        .and_local_timezone(*now.offset())
        .single()
        .ok_or(ParseError::InvalidDate {
            day: date.day(),
            month: date.month(),
            year: date.year(),
        })?;

    Ok(ParsedTime {
        fire_at,
        today_only,
    })
}

/// Parses `text` and checks that the result lies strictly after `now`.
pub fn validate_reminder_time(text: &str, now: &DateTime<FixedOffset>) -> TimeValidation {
    match parse_reminder_time(text, now) {
        Err(error) => {
            log::debug!("Rejected reminder time {text:?}: {error}");
            TimeValidation::InvalidFormat
        }
        Ok(ParsedTime {
            fire_at,
            today_only,
        }) if fire_at <= *now => {
            log::debug!("Reminder time {fire_at} is not after {now}");
            TimeValidation::PastTime { today_only }
        }
        Ok(ParsedTime {
            fire_at,
            today_only,
        }) => TimeValidation::Success {
            fire_at,
            today_only,
        },
    }
}

/// `00..=30` land in this century, everything above in the previous one.
pub fn expand_two_digit_year(year: i32) -> i32 {
    if year <= 30 { 2000 + year } else { 1900 + year }
}

fn match_shape(text: &str) -> Result<(u32, u32, DateInput), ParseError> {
    if let Some(caps) = FULL_DATE.captures(text) {
        let date = DateInput::Full {
            day: number(&caps, 3)?,
            month: number(&caps, 4)?,
            year: number(&caps, 5)?,
        };
        return Ok((number(&caps, 1)?, number(&caps, 2)?, date));
    }

    if let Some(caps) = SHORT_YEAR_DATE.captures(text) {
        let date = DateInput::Full {
            day: number(&caps, 3)?,
            month: number(&caps, 4)?,
            year: expand_two_digit_year(number(&caps, 5)?),
        };
        return Ok((number(&caps, 1)?, number(&caps, 2)?, date));
    }

    if let Some(caps) = NO_YEAR_DATE.captures(text) {
        let date = DateInput::NoYear {
            day: number(&caps, 3)?,
            month: number(&caps, 4)?,
        };
        return Ok((number(&caps, 1)?, number(&caps, 2)?, date));
    }

    if let Some(caps) = TIME_ONLY.captures(text) {
        return Ok((number(&caps, 1)?, number(&caps, 2)?, DateInput::Today));
    }

    Err(ParseError::Unrecognized)
}

fn number<T: FromStr>(caps: &Captures<'_>, group: usize) -> Result<T, ParseError> {
    caps.get(group)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(ParseError::Unrecognized)
}

fn calendar_date(day: u32, month: u32, year: i32) -> Result<NaiveDate, ParseError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ParseError::InvalidDate { day, month, year })
}
