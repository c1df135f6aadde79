use crate::model::{Challenge, TargetModel};
use crate::period::{periods_elapsed, periods_in_range};
use crate::target::target_for_period;
use chrono::NaiveDate;

/// Sum of the targets of periods `0..n`. Always equals the sum of the
/// per-period targets shown in history, fractional increments included.
pub fn series_sum(challenge: &Challenge, n: u32) -> f64 {
    (0..n).map(|i| target_for_period(challenge, i)).sum()
}

/// Periods spanned by the whole challenge; ongoing challenges end `today`.
pub fn total_periods(challenge: &Challenge, today: NaiveDate) -> u32 {
    periods_in_range(challenge.start_date, challenge.end_or(today), challenge.frequency)
}

/// Periods due as of `as_of`. Past the end date every period is due.
pub fn due_periods(challenge: &Challenge, as_of: NaiveDate) -> u32 {
    match challenge.end_date {
        Some(end) if as_of > end => periods_in_range(challenge.start_date, end, challenge.frequency),
        _ => periods_elapsed(challenge.start_date, as_of, challenge.frequency),
    }
}

/// Target over the whole life of the challenge.
pub fn total_goal(challenge: &Challenge, today: NaiveDate) -> f64 {
    let n = total_periods(challenge, today);
    match &challenge.target {
        TargetModel::Fixed { target } => target * f64::from(n),
        TargetModel::Incremental { .. } => series_sum(challenge, n),
        TargetModel::Total { total, .. } => *total,
        TargetModel::Tasks { .. } => 0.0,
    }
}

/// Expected cumulative progress as of `as_of`.
pub fn goal_so_far(challenge: &Challenge, as_of: NaiveDate) -> f64 {
    let n = due_periods(challenge, as_of);
    match &challenge.target {
        TargetModel::Fixed { target } => target * f64::from(n),
        TargetModel::Incremental { .. } => series_sum(challenge, n),
        TargetModel::Total { total, split } => {
            let end = challenge.end_or(as_of);
            if *split {
                let periods = periods_in_range(challenge.start_date, end, challenge.frequency);
                if n >= periods {
                    *total
                } else {
                    total / f64::from(periods) * f64::from(n)
                }
            } else if as_of >= end {
                *total
            } else {
                0.0
            }
        }
        TargetModel::Tasks { .. } => 0.0,
    }
}
