use crate::model::{Challenge, TargetModel};
use crate::output::fmt_amount;
use crate::period::{period_index, periods_in_range};
use chrono::NaiveDate;

/// Target for the 0-based period `index`.
pub fn target_for_period(challenge: &Challenge, index: u32) -> f64 {
    match &challenge.target {
        TargetModel::Fixed { target } => *target,
        TargetModel::Incremental {
            base_value,
            increment_value,
        } => base_value + f64::from(index) * increment_value,
        TargetModel::Total { total, split } => {
            if *split {
                total / f64::from(split_periods(challenge))
            } else {
                *total
            }
        }
        TargetModel::Tasks { .. } => 0.0,
    }
}

/// Target of the period that contains `date`.
pub fn target_for_date(challenge: &Challenge, date: NaiveDate) -> f64 {
    let idx = period_index(challenge.start_date, date, challenge.frequency);
    target_for_period(challenge, idx)
}

/// Periods a split total is spread over. Total goals always carry an end
/// date; the start date stands in if one is somehow missing.
pub fn split_periods(challenge: &Challenge) -> u32 {
    let end = challenge.end_date.unwrap_or(challenge.start_date);
    periods_in_range(challenge.start_date, end, challenge.frequency)
}

/// Human-readable target, e.g. "5 pages/day" or "2 pages/day +1".
pub fn target_label(challenge: &Challenge) -> String {
    let per = challenge.frequency.period_noun();
    let unit = challenge
        .unit
        .as_deref()
        .map(|u| format!(" {}", u))
        .unwrap_or_default();
    match &challenge.target {
        TargetModel::Fixed { target } => format!("{}{}/{}", fmt_amount(*target), unit, per),
        TargetModel::Incremental {
            base_value,
            increment_value,
        } => format!(
            "{}{}/{} +{}",
            fmt_amount(*base_value),
            unit,
            per,
            fmt_amount(*increment_value)
        ),
        TargetModel::Total { total, split } => {
            if *split {
                format!("{}{} total, paced per {}", fmt_amount(*total), unit, per)
            } else {
                format!("{}{} total", fmt_amount(*total), unit)
            }
        }
        TargetModel::Tasks { tasks } => format!("{} tasks", tasks.len()),
    }
}
