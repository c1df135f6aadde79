use crate::error::{CliError, InputError};
use crate::model::{Db, Entry};
use chrono::NaiveDate;
use std::collections::BTreeSet;

fn find_entry_index(db: &Db, challenge_id: &str, date: NaiveDate) -> Option<usize> {
    db.entries
        .iter()
        .position(|e| e.challenge_id == challenge_id && e.date == date)
}

pub fn next_entry_id(db: &mut Db) -> String {
    let n = db.meta.next_entry_number;
    db.meta.next_entry_number = n + 1;
    format!("e{:04}", n)
}

fn check_value(v: f64) -> Result<(), InputError> {
    if !v.is_finite() {
        return Err(InputError::number("value", v.to_string()));
    }
    if v < 0.0 {
        return Err(InputError::value("value", format!("{} must not be negative", v)));
    }
    Ok(())
}

/// Sum logged for one challenge on one date.
pub fn day_value(db: &Db, challenge_id: &str, date: NaiveDate) -> f64 {
    db.entries
        .iter()
        .filter(|e| e.challenge_id == challenge_id && e.date == date)
        .map(|e| e.value)
        .sum()
}

/// Notes of every entry on `date` in stored order, then `extra`; repeats
/// are kept once and the result is joined with "; ".
fn merged_notes(db: &Db, challenge_id: &str, date: NaiveDate, extra: Option<&str>) -> Option<String> {
    let mut notes: Vec<&str> = Vec::new();
    let existing = db
        .entries
        .iter()
        .filter(|e| e.challenge_id == challenge_id && e.date == date)
        .filter_map(|e| e.notes.as_deref());
    for n in existing.chain(extra) {
        let n = n.trim();
        if !n.is_empty() && !notes.contains(&n) {
            notes.push(n);
        }
    }
    if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    }
}

/// Makes `value` the amount logged on `date`. Duplicate entries for that
/// date collapse into the first one, which keeps all of their notes.
pub fn set_value(
    db: &mut Db,
    challenge_id: &str,
    date: NaiveDate,
    value: f64,
    notes: Option<&str>,
) -> Result<Entry, CliError> {
    check_value(value)?;

    let entry = match find_entry_index(db, challenge_id, date) {
        Some(i) => {
            let keep = db.entries[i].id.clone();
            let merged = merged_notes(db, challenge_id, date, notes);
            db.entries
                .retain(|e| e.id == keep || e.challenge_id != challenge_id || e.date != date);
            let i = db
                .entries
                .iter()
                .position(|e| e.id == keep)
                .ok_or_else(|| CliError::io("DB corrupted"))?;
            let e = &mut db.entries[i];
            e.value = value;
            e.notes = merged;
            e.clone()
        }
        None => {
            let e = Entry {
                id: next_entry_id(db),
                challenge_id: challenge_id.to_string(),
                date,
                value,
                notes: notes.map(|n| n.to_string()),
            };
            db.entries.push(e.clone());
            e
        }
    };

    Ok(entry)
}

/// Adds `delta` to whatever is logged on `date`; returns the new day total.
pub fn add_value(
    db: &mut Db,
    challenge_id: &str,
    date: NaiveDate,
    delta: f64,
    notes: Option<&str>,
) -> Result<f64, CliError> {
    check_value(delta)?;
    if delta == 0.0 {
        return Err(CliError::usage("Invalid value: nothing to add"));
    }
    let total = day_value(db, challenge_id, date) + delta;
    set_value(db, challenge_id, date, total, notes)?;
    Ok(total)
}

/// Removes every entry on `date`; returns how many went.
pub fn delete_day(db: &mut Db, challenge_id: &str, date: NaiveDate) -> usize {
    let before = db.entries.len();
    db.entries
        .retain(|e| e.challenge_id != challenge_id || e.date != date);
    before - db.entries.len()
}

pub fn remove_challenge_entries(db: &mut Db, challenge_id: &str) -> usize {
    let before = db.entries.len();
    db.entries.retain(|e| e.challenge_id != challenge_id);
    before - db.entries.len()
}

/// Entries of one challenge by date; same-date entries keep their order.
pub fn entries_for_challenge(db: &Db, challenge_id: &str) -> Vec<Entry> {
    let mut out: Vec<Entry> = db
        .entries
        .iter()
        .filter(|e| e.challenge_id == challenge_id)
        .cloned()
        .collect();
    out.sort_by_key(|e| e.date);
    out
}

pub fn list_entries_in_range(
    db: &Db,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    challenge_ids: Option<&BTreeSet<String>>,
) -> Vec<Entry> {
    let mut out: Vec<Entry> = db
        .entries
        .iter()
        .filter(|e| challenge_ids.map_or(true, |ids| ids.contains(&e.challenge_id)))
        .filter(|e| from.map_or(true, |f| e.date >= f))
        .filter(|e| to.map_or(true, |t| e.date <= t))
        .cloned()
        .collect();

    out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.challenge_id.cmp(&b.challenge_id)));
    out
}
