//! Calendar period arithmetic.
//!
//! Every challenge is measured in periods of its frequency. Period 0 is the
//! period containing the start date. Only `NaiveDate` values are compared, so
//! a time of day can never shift a count by one.
//!
//! Daily and weekly counts of *elapsed* periods exclude the period that is
//! still running. Monthly counts include it: the month difference is bumped
//! once the day of month reaches the start's day of month, which makes a
//! Jan 1 to Dec 31 challenge exactly 12 months long and leaves a started
//! monthly challenge with at least one period due.

use crate::date::{days_between, months_between};
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// Singular period noun, e.g. "3 pages/week".
    pub fn period_noun(&self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Frequency::Daily),
            "weekly" | "week" => Ok(Frequency::Weekly),
            "monthly" | "month" => Ok(Frequency::Monthly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

fn to_count(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

/// 0-based index of the period containing `date`. Dates before `start` map
/// to period 0.
pub fn period_index(start: NaiveDate, date: NaiveDate, frequency: Frequency) -> u32 {
    if date < start {
        return 0;
    }
    let n = match frequency {
        Frequency::Daily => days_between(start, date),
        Frequency::Weekly => days_between(start, date) / 7,
        Frequency::Monthly => {
            let months = months_between(start, date);
            if date.day() >= start.day() {
                months
            } else {
                months - 1
            }
        }
    };
    to_count(n)
}

/// Periods whose target is due as of `as_of`. Zero before the start date.
pub fn periods_elapsed(start: NaiveDate, as_of: NaiveDate, frequency: Frequency) -> u32 {
    if as_of < start {
        return 0;
    }
    let idx = period_index(start, as_of, frequency);
    match frequency {
        Frequency::Monthly => idx.saturating_add(1),
        Frequency::Daily | Frequency::Weekly => idx,
    }
}

/// Number of periods between `start` and `end`, both inclusive. Never less
/// than 1, even for a reversed or single-day range.
pub fn periods_in_range(start: NaiveDate, end: NaiveDate, frequency: Frequency) -> u32 {
    if end < start {
        return 1;
    }
    period_index(start, end, frequency).saturating_add(1)
}
