use crate::error::InputError;
use chrono::{Datelike, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date. Accepts `YYYY-MM-DD`, or a timestamp whose first
/// ten characters are one (`2024-01-05T23:00:00Z`, `2024-01-05 08:00`). Only
/// the Y/M/D components are kept; the time of day and any offset are dropped
/// so a late-evening timestamp never slides into the next or previous day.
pub fn parse_date(s: &str, label: &str) -> Result<NaiveDate, InputError> {
    let ss = s.trim();
    let bytes = ss.as_bytes();
    if bytes.len() < 10 {
        return Err(InputError::date(label, s));
    }
    if bytes.len() > 10 && bytes[10] != b'T' && bytes[10] != b't' && bytes[10] != b' ' {
        return Err(InputError::date(label, s));
    }
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(InputError::date(label, s));
    }
    let digits_ok = bytes[..10]
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return Err(InputError::date(label, s));
    }

    NaiveDate::parse_from_str(&ss[..10], DATE_FORMAT).map_err(|_| InputError::date(label, s))
}

pub fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Signed number of whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Signed calendar-month difference, ignoring the day of month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year() - from.year());
    years * 12 + i64::from(to.month()) - i64::from(from.month())
}

pub fn system_today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
