//! Datasets for progress charts: a goal/expected/actual comparison, a
//! cumulative series against the pacing line, and a completed/remaining split.

use crate::goal::{goal_so_far, total_goal};
use crate::model::{Challenge, Entry};
use crate::progress::{actual_progress, daily_totals};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Comparison {
    pub total_goal: f64,
    pub goal_so_far: f64,
    pub actual_progress: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub cumulative_actual: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Breakdown {
    pub completed: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChartData {
    pub comparison: Comparison,
    pub series: Vec<SeriesPoint>,
    pub breakdown: Breakdown,
}

pub fn comparison(challenge: &Challenge, entries: &[Entry], today: NaiveDate) -> Comparison {
    Comparison {
        total_goal: total_goal(challenge, today),
        goal_so_far: goal_so_far(challenge, today),
        actual_progress: actual_progress(entries),
    }
}

/// One point per logged date, in date order.
pub fn series(challenge: &Challenge, entries: &[Entry]) -> Vec<SeriesPoint> {
    let mut cumulative = 0.0;
    daily_totals(entries)
        .into_iter()
        .map(|day| {
            cumulative += day.value;
            SeriesPoint {
                date: day.date,
                value: day.value,
                cumulative_actual: cumulative,
                expected: goal_so_far(challenge, day.date),
            }
        })
        .collect()
}

pub fn breakdown(total: f64, actual: f64) -> Breakdown {
    Breakdown {
        completed: actual,
        remaining: (total - actual).max(0.0),
    }
}

pub fn build_chart(challenge: &Challenge, entries: &[Entry], today: NaiveDate) -> ChartData {
    let comparison = comparison(challenge, entries, today);
    let breakdown = breakdown(comparison.total_goal, comparison.actual_progress);
    ChartData {
        series: series(challenge, entries),
        comparison,
        breakdown,
    }
}
