use crate::model::{Challenge, Entry};
use crate::target::target_for_date;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Lifetime progress: every logged value counts, whatever its date.
pub fn actual_progress(entries: &[Entry]) -> f64 {
    entries.iter().map(|e| e.value).sum()
}

/// `value / target * 100`, or 0 when the target is 0 (or not finite).
pub fn percent_of(value: f64, target: f64) -> f64 {
    if target == 0.0 || !target.is_finite() {
        return 0.0;
    }
    value / target * 100.0
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Attainment {
    pub target: f64,
    pub met: bool,
    pub percent: f64,
}

/// How `value` logged on `date` measures up to that period's target.
pub fn attainment(challenge: &Challenge, date: NaiveDate, value: f64) -> Attainment {
    let target = target_for_date(challenge, date);
    Attainment {
        target,
        met: value >= target,
        percent: percent_of(value, target),
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub value: f64,
    pub entries: u32,
}

/// Entries folded to one total per date, ascending. Several entries on the
/// same date are summed in the order they were given.
pub fn daily_totals(entries: &[Entry]) -> Vec<DayTotal> {
    let mut by_date: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();
    for e in entries.iter() {
        let slot = by_date.entry(e.date).or_insert(DayTotal {
            date: e.date,
            value: 0.0,
            entries: 0,
        });
        slot.value += e.value;
        slot.entries += 1;
    }
    by_date.into_values().collect()
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub value: f64,
    pub entries: u32,
    pub target: f64,
    pub met: bool,
    pub percent: f64,
    pub notes: Vec<String>,
}

/// Per-date attainment, newest first.
pub fn build_history(challenge: &Challenge, entries: &[Entry]) -> Vec<HistoryRow> {
    let mut rows: Vec<HistoryRow> = daily_totals(entries)
        .into_iter()
        .map(|day| {
            let a = attainment(challenge, day.date, day.value);
            let notes = entries
                .iter()
                .filter(|e| e.date == day.date)
                .filter_map(|e| e.notes.clone())
                .collect();
            HistoryRow {
                date: day.date,
                value: day.value,
                entries: day.entries,
                target: a.target,
                met: a.met,
                percent: a.percent,
                notes,
            }
        })
        .collect();
    rows.reverse();
    rows
}
