use crate::date::days_between;
use crate::goal::{due_periods, goal_so_far, total_goal, total_periods};
use crate::model::{Challenge, ChallengeType, Entry};
use crate::period::{period_index, Frequency};
use crate::progress::{actual_progress, percent_of};
use crate::standing::{standing, Standing};
use crate::target::{target_for_period, target_label};
use crate::tasks::{checklist_for, Checklist};
use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ProgressReport {
    pub challenge_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    pub frequency: Frequency,
    pub unit: Option<String>,
    pub as_of: NaiveDate,
    pub target_label: String,
    pub periods: Periods,
    pub current_target: f64,
    pub total_goal: f64,
    pub goal_so_far: f64,
    pub actual_progress: f64,
    pub remaining: f64,
    pub completion_percent: f64,
    pub standing: Option<Standing>,
    pub entries: u32,
    pub days_left: Option<i64>,
    pub checklist: Option<Checklist>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Periods {
    /// 0-based index of the period containing `as_of`.
    pub current: u32,
    pub due: u32,
    pub total: u32,
    pub started: bool,
    pub ended: bool,
}

/// Everything the detail view shows for one challenge as of `as_of`.
/// `entries` must already be limited to this challenge.
pub fn build_report(challenge: &Challenge, entries: &[Entry], as_of: NaiveDate) -> ProgressReport {
    let started = as_of >= challenge.start_date;
    let ended = challenge.end_date.is_some_and(|end| as_of > end);
    let current = period_index(challenge.start_date, as_of, challenge.frequency);

    let periods = Periods {
        current,
        due: due_periods(challenge, as_of),
        total: total_periods(challenge, as_of),
        started,
        ended,
    };

    let checklist = checklist_for(challenge);
    let total = total_goal(challenge, as_of);
    let expected = goal_so_far(challenge, as_of);
    let actual = actual_progress(entries);

    debug!(
        challenge = %challenge.id,
        as_of = %as_of,
        total,
        expected,
        actual,
        "computed progress"
    );

    ProgressReport {
        challenge_id: challenge.id.clone(),
        name: challenge.name.clone(),
        kind: challenge.kind,
        frequency: challenge.frequency,
        unit: challenge.unit.clone(),
        as_of,
        target_label: target_label(challenge),
        current_target: target_for_period(challenge, current),
        total_goal: total,
        goal_so_far: expected,
        actual_progress: actual,
        remaining: (total - actual).max(0.0),
        completion_percent: match &checklist {
            Some(cl) => cl.percent,
            None => percent_of(actual, total),
        },
        standing: if checklist.is_some() {
            None
        } else {
            Some(standing(actual, expected))
        },
        entries: u32::try_from(entries.len()).unwrap_or(u32::MAX),
        days_left: challenge
            .end_date
            .map(|end| days_between(as_of, end).max(0)),
        periods,
        checklist,
    }
}
