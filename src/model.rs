use crate::period::Frequency;
use chrono::NaiveDate;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Db {
    pub version: u32,
    pub meta: Meta,
    pub challenges: Vec<Challenge>,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Meta {
    pub next_challenge_number: u32,
    pub next_entry_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
    Habit,
    Goal,
    Challenge,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Habit => "habit",
            ChallengeType::Goal => "goal",
            ChallengeType::Challenge => "challenge",
        }
    }
}

/// How the per-period target of a challenge is derived.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum TargetModel {
    /// Same target every period.
    Fixed { target: f64 },
    /// `base_value + n * increment_value` for period `n`.
    Incremental { base_value: f64, increment_value: f64 },
    /// A goal with one fixed total, optionally paced evenly across periods.
    Total { total: f64, split: bool },
    /// A goal tracked as a checklist; no numeric targets at all.
    Tasks { tasks: Vec<Task> },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Task {
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Challenge {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub target: TargetModel,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub archived: bool,
    pub created_date: NaiveDate,
}

impl Challenge {
    pub fn is_incremental(&self) -> bool {
        matches!(self.target, TargetModel::Incremental { .. })
    }

    pub fn is_checklist(&self) -> bool {
        matches!(self.target, TargetModel::Tasks { .. })
    }

    /// Last calendar day counted toward the challenge; ongoing challenges
    /// run through `today`.
    pub fn end_or(&self, today: NaiveDate) -> NaiveDate {
        self.end_date.unwrap_or(today)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Entry {
    pub id: String,
    pub challenge_id: String,
    pub date: NaiveDate,
    pub value: f64,
    pub notes: Option<String>,
}

pub fn default_db() -> Db {
    Db {
        version: 1,
        meta: Meta {
            next_challenge_number: 1,
            next_entry_number: 1,
        },
        challenges: Vec::new(),
        entries: Vec::new(),
    }
}
