//! Boundary adapter for challenge and entry records coming from the web
//! service (`GET /challenges/{id}`, `GET /challenges/{id}/entries`).
//!
//! Stored records went through several schema revisions, so the same field
//! can show up under a snake_case name, a camelCase name or a legacy alias,
//! and numbers can arrive as strings. Everything is normalised here once;
//! the calculators only ever see typed [`Challenge`] and [`Entry`] values.

use crate::challenges::validate_challenge;
use crate::date::parse_date;
use crate::error::InputError;
use crate::model::{Challenge, ChallengeType, Entry, Task, TargetModel};
use crate::period::Frequency;
use chrono::NaiveDate;
use serde_json::{Map, Value};

const NAME: &[&str] = &["name", "title"];
const TYPE: &[&str] = &["type", "challenge_type", "challengeType"];
const FREQUENCY: &[&str] = &["frequency"];
const START_DATE: &[&str] = &["start_date", "startDate"];
const END_DATE: &[&str] = &["end_date", "endDate"];
const IS_INCREMENTAL: &[&str] = &["is_incremental", "isIncremental"];
const TARGET: &[&str] = &["target", "target_value", "targetValue"];
const BASE_VALUE: &[&str] = &["base_value", "baseValue"];
const INCREMENT_VALUE: &[&str] = &[
    "increment_value",
    "incrementValue",
    "increment_per_day",
    "incrementPerDay",
];
const UNIT: &[&str] = &["unit"];
const NOTES: &[&str] = &["notes", "description"];
const METADATA: &[&str] = &["metadata"];
const DATE: &[&str] = &["date", "entry_date", "entryDate"];
const VALUE: &[&str] = &["value", "amount"];

/// Legacy default for a missing base or increment.
const LEGACY_DEFAULT: f64 = 1.0;

fn as_object<'a>(v: &'a Value, what: &str) -> Result<&'a Map<String, Value>, InputError> {
    v.as_object()
        .ok_or_else(|| InputError::value(what, "expected a JSON object"))
}

/// First present, non-null value among `names`.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| obj.get(*n))
        .find(|v| !v.is_null())
}

fn string_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    match field(obj, names)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerces a number or numeric string. Absent, null and blank values fall
/// back to `default`; anything else that does not parse is an error.
pub fn coerce_number(value: Option<&Value>, field_name: &str, default: Option<f64>) -> Result<f64, InputError> {
    let missing = || default.ok_or_else(|| InputError::value(field_name, "is required"));
    let n = match value {
        None | Some(Value::Null) => return missing(),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return missing(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(InputError::number(field_name, other.to_string())),
    };
    match n {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(InputError::number(
            field_name,
            value.map(|v| v.to_string()).unwrap_or_default(),
        )),
    }
}

fn coerce_bool(value: Option<&Value>, field_name: &str) -> Result<bool, InputError> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0) != 0.0),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(true),
            "false" | "f" | "0" | "no" | "" => Ok(false),
            _ => Err(InputError::value(field_name, format!("not a boolean: {}", s))),
        },
        Some(other) => Err(InputError::value(field_name, format!("not a boolean: {}", other))),
    }
}

fn coerce_date(value: Option<&Value>, label: &str) -> Result<Option<NaiveDate>, InputError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_date(s, label).map(Some),
        Some(other) => Err(InputError::date(label, &other.to_string())),
    }
}

fn parse_kind(obj: &Map<String, Value>) -> Result<ChallengeType, InputError> {
    let Some(raw) = string_field(obj, TYPE) else {
        return Ok(ChallengeType::Habit);
    };
    match raw.to_lowercase().as_str() {
        "habit" => Ok(ChallengeType::Habit),
        "goal" => Ok(ChallengeType::Goal),
        "challenge" => Ok(ChallengeType::Challenge),
        _ => Err(InputError::value("type", format!("unknown type: {}", raw))),
    }
}

fn parse_frequency(obj: &Map<String, Value>) -> Result<Frequency, InputError> {
    match string_field(obj, FREQUENCY) {
        None => Ok(Frequency::Daily),
        Some(raw) => raw
            .parse::<Frequency>()
            .map_err(|_| InputError::value("frequency", format!("unknown frequency: {}", raw))),
    }
}

/// Goal metadata is stored either as an object or as JSON text.
fn goal_metadata(obj: &Map<String, Value>) -> Result<Option<Value>, InputError> {
    match field(obj, METADATA) {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .map(Some)
            .map_err(|e| InputError::value("metadata", e.to_string())),
        Some(v @ Value::Object(_)) => Ok(Some(v.clone())),
        Some(other) => Err(InputError::value("metadata", format!("unexpected value: {}", other))),
    }
}

fn goal_target(meta: &Value) -> Result<Option<TargetModel>, InputError> {
    let obj = as_object(meta, "metadata")?;
    let kind = string_field(obj, &["goal_type", "goalType", "kind"]).map(|k| k.to_lowercase());
    match kind.as_deref() {
        Some("total") | Some("fixed") => {
            let total = coerce_number(field(obj, &["total", "total_value", "totalValue"]), "total", None)?;
            let split = coerce_bool(field(obj, &["split", "split_across_periods", "splitAcrossPeriods"]), "split")?;
            Ok(Some(TargetModel::Total { total, split }))
        }
        Some("tasks") | Some("checklist") => {
            let raw_tasks = match field(obj, &["tasks"]) {
                None => Vec::new(),
                Some(Value::Array(items)) => items.clone(),
                Some(other) => {
                    return Err(InputError::value("tasks", format!("expected a list: {}", other)))
                }
            };
            let mut tasks = Vec::with_capacity(raw_tasks.len());
            for t in raw_tasks.iter() {
                let task = match t {
                    Value::String(title) => Task {
                        title: title.trim().to_string(),
                        done: false,
                    },
                    Value::Object(o) => Task {
                        title: string_field(o, &["title", "name", "text"]).unwrap_or_default(),
                        done: coerce_bool(field(o, &["done", "completed", "is_done", "isDone"]), "done")?,
                    },
                    other => {
                        return Err(InputError::value("tasks", format!("unexpected task: {}", other)))
                    }
                };
                tasks.push(task);
            }
            Ok(Some(TargetModel::Tasks { tasks }))
        }
        _ => Ok(None),
    }
}

fn target_model(obj: &Map<String, Value>, kind: ChallengeType) -> Result<TargetModel, InputError> {
    if kind == ChallengeType::Goal {
        if let Some(meta) = goal_metadata(obj)? {
            if let Some(model) = goal_target(&meta)? {
                return Ok(model);
            }
        }
    }

    if coerce_bool(field(obj, IS_INCREMENTAL), "is_incremental")? {
        // `target` may mirror the base on old records; it never drives growth.
        return Ok(TargetModel::Incremental {
            base_value: coerce_number(field(obj, BASE_VALUE), "base_value", Some(LEGACY_DEFAULT))?,
            increment_value: coerce_number(
                field(obj, INCREMENT_VALUE),
                "increment_value",
                Some(LEGACY_DEFAULT),
            )?,
        });
    }

    Ok(TargetModel::Fixed {
        target: coerce_number(field(obj, TARGET), "target", Some(LEGACY_DEFAULT))?,
    })
}

/// Builds a typed challenge from an external record. `id` is the local id
/// the record will be stored under.
pub fn challenge_from_record(record: &Value, id: String, today: NaiveDate) -> Result<Challenge, InputError> {
    let record = match record.get("challenge") {
        Some(inner) if inner.is_object() => inner,
        _ => record,
    };
    let obj = as_object(record, "challenge")?;

    let name = string_field(obj, NAME).ok_or_else(|| InputError::value("name", "is required"))?;
    let kind = parse_kind(obj)?;
    let start_date = coerce_date(field(obj, START_DATE), "start date")?
        .ok_or_else(|| InputError::value("start date", "is required"))?;

    let challenge = Challenge {
        id,
        name,
        kind,
        frequency: parse_frequency(obj)?,
        start_date,
        end_date: coerce_date(field(obj, END_DATE), "end date")?,
        target: target_model(obj, kind)?,
        unit: string_field(obj, UNIT),
        notes: string_field(obj, NOTES),
        archived: coerce_bool(field(obj, &["archived", "is_archived", "isArchived"]), "archived")?,
        created_date: coerce_date(field(obj, &["created_at", "createdAt"]), "created date")?.unwrap_or(today),
    };
    validate_challenge(&challenge)?;
    Ok(challenge)
}

pub fn entry_from_record(record: &Value, id: String, challenge_id: &str) -> Result<Entry, InputError> {
    let obj = as_object(record, "entry")?;
    let date = coerce_date(field(obj, DATE), "entry date")?
        .ok_or_else(|| InputError::value("entry date", "is required"))?;
    let value = coerce_number(field(obj, VALUE), "value", None)?;
    if value < 0.0 {
        return Err(InputError::value("value", format!("{} must not be negative", value)));
    }

    Ok(Entry {
        id,
        challenge_id: challenge_id.to_string(),
        date,
        value,
        notes: string_field(obj, NOTES),
    })
}

/// Entry records come either as a bare array or wrapped as `{"entries": [...]}`.
pub fn entry_records(doc: &Value) -> Result<&[Value], InputError> {
    let list = match doc {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("entries") {
            Some(Value::Array(items)) => items,
            _ => return Err(InputError::value("entries", "expected a list of entries")),
        },
        _ => return Err(InputError::value("entries", "expected a list of entries")),
    };
    Ok(list.as_slice())
}
