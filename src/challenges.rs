use crate::error::{CliError, InputError};
use crate::model::{Challenge, ChallengeType, Db, Task, TargetModel};
use crate::period::Frequency;
use chrono::NaiveDate;

fn normalize_name(name: &str) -> String {
    name.trim().to_string()
}

pub fn validate_challenge_name(name: &str) -> Result<String, InputError> {
    let n = normalize_name(name);
    if n.is_empty() {
        return Err(InputError::value("name", "a challenge name is required"));
    }
    Ok(n)
}

pub fn next_challenge_id(db: &mut Db) -> String {
    let n = db.meta.next_challenge_number;
    let id = format!("c{:04}", n);
    db.meta.next_challenge_number = n + 1;
    id
}

pub fn stable_challenge_sort(a: &Challenge, b: &Challenge) -> std::cmp::Ordering {
    let an = a.name.to_lowercase();
    let bn = b.name.to_lowercase();
    an.cmp(&bn).then_with(|| a.id.cmp(&b.id))
}

pub fn list_challenges(db: &Db, include_archived: bool) -> Vec<Challenge> {
    let mut out: Vec<Challenge> = db
        .challenges
        .iter()
        .filter(|c| include_archived || !c.archived)
        .cloned()
        .collect();
    out.sort_by(stable_challenge_sort);
    out
}

fn looks_like_id(s: &str) -> bool {
    s.len() == 5 && s.starts_with('c') && s[1..].chars().all(|c| c.is_ascii_digit())
}

/// Resolves an exact id (`c0001`) or a unique, case-insensitive name prefix.
pub fn select_challenge_index(
    db: &Db,
    selector: &str,
    include_archived: bool,
) -> Result<usize, CliError> {
    let s = selector.trim();
    if s.is_empty() {
        return Err(CliError::usage("Challenge selector is required"));
    }
    let not_found = || CliError::not_found(format!("Challenge not found: {}", selector));

    if looks_like_id(s) {
        let i = db.challenges.iter().position(|c| c.id == s).ok_or_else(not_found)?;
        if !include_archived && db.challenges[i].archived {
            return Err(not_found());
        }
        return Ok(i);
    }

    let prefix = s.to_lowercase();
    let mut matches: Vec<usize> = db
        .challenges
        .iter()
        .enumerate()
        .filter(|(_, c)| include_archived || !c.archived)
        .filter(|(_, c)| c.name.to_lowercase().starts_with(&prefix))
        .map(|(i, _)| i)
        .collect();
    matches.sort_by(|a, b| stable_challenge_sort(&db.challenges[*a], &db.challenges[*b]));

    match matches.as_slice() {
        [] => Err(not_found()),
        [only] => Ok(*only),
        many => {
            let candidates = many
                .iter()
                .map(|i| format!("{} {}", db.challenges[*i].id, db.challenges[*i].name))
                .collect::<Vec<String>>()
                .join(", ");
            Err(CliError::ambiguous(format!(
                "Ambiguous selector '{}'. Candidates: {}",
                selector, candidates
            )))
        }
    }
}

/// Target options as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct TargetArgs {
    pub target: Option<f64>,
    pub base: Option<f64>,
    pub increment: Option<f64>,
    pub total: Option<f64>,
    pub split: bool,
    pub tasks: Vec<String>,
}

impl TargetArgs {
    fn is_empty(&self) -> bool {
        self.target.is_none()
            && self.base.is_none()
            && self.increment.is_none()
            && self.total.is_none()
            && !self.split
            && self.tasks.is_empty()
    }
}

pub fn target_model_from_args(args: &TargetArgs, checklist: bool) -> Result<TargetModel, InputError> {
    let incremental = args.base.is_some() || args.increment.is_some();
    let kinds = [
        args.target.is_some(),
        incremental,
        args.total.is_some(),
        checklist || !args.tasks.is_empty(),
    ];
    if kinds.iter().filter(|k| **k).count() > 1 {
        return Err(InputError::value(
            "target",
            "choose one of --target, --base/--increment, --total or --task",
        ));
    }
    if args.split && args.total.is_none() {
        return Err(InputError::value("split", "--split needs --total"));
    }

    if checklist || !args.tasks.is_empty() {
        let tasks = args
            .tasks
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| Task {
                title: t.to_string(),
                done: false,
            })
            .collect();
        return Ok(TargetModel::Tasks { tasks });
    }
    if let Some(total) = args.total {
        return Ok(TargetModel::Total {
            total,
            split: args.split,
        });
    }
    if incremental {
        return Ok(TargetModel::Incremental {
            base_value: args.base.unwrap_or(1.0),
            increment_value: args.increment.unwrap_or(1.0),
        });
    }
    Ok(TargetModel::Fixed {
        target: args.target.unwrap_or(1.0),
    })
}

fn check_amount(field: &str, v: f64) -> Result<(), InputError> {
    if !v.is_finite() {
        return Err(InputError::number(field, v.to_string()));
    }
    if v < 0.0 {
        return Err(InputError::value(field, format!("{} must not be negative", v)));
    }
    Ok(())
}

/// Invariants every stored challenge satisfies, whichever way it came in.
pub fn validate_challenge(c: &Challenge) -> Result<(), InputError> {
    validate_challenge_name(&c.name)?;
    if let Some(end) = c.end_date {
        if end < c.start_date {
            return Err(InputError::value("end date", "must not be before the start date"));
        }
    }

    match &c.target {
        TargetModel::Fixed { target } => check_amount("target", *target)?,
        TargetModel::Incremental {
            base_value,
            increment_value,
        } => {
            check_amount("base value", *base_value)?;
            check_amount("increment value", *increment_value)?;
        }
        TargetModel::Total { total, .. } => {
            check_amount("total", *total)?;
            if c.end_date.is_none() {
                return Err(InputError::value("end date", "a total goal needs an end date"));
            }
        }
        TargetModel::Tasks { tasks } => {
            if tasks.iter().any(|t| t.title.trim().is_empty()) {
                return Err(InputError::value("tasks", "task titles must not be empty"));
            }
        }
    }

    let goal_only = matches!(c.target, TargetModel::Total { .. } | TargetModel::Tasks { .. });
    if goal_only && c.kind != ChallengeType::Goal {
        return Err(InputError::value(
            "type",
            "totals and task checklists are only available for goals",
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn make_challenge(
    id: String,
    name: &str,
    kind: ChallengeType,
    frequency: Frequency,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    target: TargetModel,
    unit: Option<&str>,
    notes: Option<&str>,
    today: NaiveDate,
) -> Result<Challenge, InputError> {
    let challenge = Challenge {
        id,
        name: validate_challenge_name(name)?,
        kind,
        frequency,
        start_date,
        end_date,
        target,
        unit: unit.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
        notes: notes.map(|n| n.to_string()),
        archived: false,
        created_date: today,
    };
    validate_challenge(&challenge)?;
    Ok(challenge)
}

/// Field changes requested by `edit`; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ChallengeEdit {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub clear_end: bool,
    pub target: TargetArgs,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

fn edit_target(current: &TargetModel, args: &TargetArgs) -> Result<TargetModel, InputError> {
    if args.is_empty() {
        return Ok(current.clone());
    }
    if !args.tasks.is_empty() {
        return Err(InputError::value("tasks", "use `challenge task add` to extend a checklist"));
    }

    match current {
        TargetModel::Incremental {
            base_value,
            increment_value,
        } if args.target.is_none() && args.total.is_none() => Ok(TargetModel::Incremental {
            base_value: args.base.unwrap_or(*base_value),
            increment_value: args.increment.unwrap_or(*increment_value),
        }),
        TargetModel::Fixed { target }
            if args.target.is_none() && args.total.is_none() && !args.split =>
        {
            // Turning a fixed target into a growing one keeps it as the base.
            Ok(TargetModel::Incremental {
                base_value: args.base.unwrap_or(*target),
                increment_value: args.increment.unwrap_or(1.0),
            })
        }
        TargetModel::Total { total, split }
            if args.target.is_none() && args.base.is_none() && args.increment.is_none() =>
        {
            Ok(TargetModel::Total {
                total: args.total.unwrap_or(*total),
                split: *split || args.split,
            })
        }
        _ => target_model_from_args(args, false),
    }
}

pub fn apply_edit(challenge: &mut Challenge, edit: &ChallengeEdit) -> Result<(), InputError> {
    if edit.clear_end && edit.end_date.is_some() {
        return Err(InputError::value("end date", "--end conflicts with --no-end"));
    }

    let mut next = challenge.clone();
    if let Some(name) = edit.name.as_deref() {
        next.name = validate_challenge_name(name)?;
    }
    if let Some(f) = edit.frequency {
        next.frequency = f;
    }
    if let Some(s) = edit.start_date {
        next.start_date = s;
    }
    if let Some(e) = edit.end_date {
        next.end_date = Some(e);
    }
    if edit.clear_end {
        next.end_date = None;
    }
    next.target = edit_target(&challenge.target, &edit.target)?;
    if let Some(u) = edit.unit.as_deref() {
        let u = u.trim();
        next.unit = if u.is_empty() { None } else { Some(u.to_string()) };
    }
    if let Some(n) = edit.notes.as_deref() {
        next.notes = if n.is_empty() { None } else { Some(n.to_string()) };
    }

    validate_challenge(&next)?;
    *challenge = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_db;

    fn d(s: &str) -> NaiveDate {
        crate::date::parse_date(s, "date").unwrap()
    }

    fn fixed(db: &mut Db, name: &str) -> Challenge {
        let id = next_challenge_id(db);
        let c = make_challenge(
            id,
            name,
            ChallengeType::Habit,
            Frequency::Daily,
            d("2024-01-01"),
            None,
            TargetModel::Fixed { target: 5.0 },
            Some("pages"),
            None,
            d("2024-01-01"),
        )
        .unwrap();
        db.challenges.push(c.clone());
        c
    }

    #[test]
    fn ids_and_selectors() {
        let mut db = default_db();
        let a = fixed(&mut db, "Stretch");
        let b = fixed(&mut db, "Strength");
        fixed(&mut db, "Read");
        assert_eq!(a.id, "c0001");
        assert_eq!(b.id, "c0002");

        assert_eq!(select_challenge_index(&db, "c0002", false).unwrap(), 1);
        assert_eq!(select_challenge_index(&db, "READ", false).unwrap(), 2);
        let err = select_challenge_index(&db, "str", false).unwrap_err();
        assert_eq!(err.exit_code, 4);
        assert!(err.message.contains("c0002 Strength, c0001 Stretch"));
        assert_eq!(select_challenge_index(&db, "c0009", false).unwrap_err().exit_code, 3);

        db.challenges[2].archived = true;
        assert_eq!(select_challenge_index(&db, "read", false).unwrap_err().exit_code, 3);
        assert_eq!(select_challenge_index(&db, "read", true).unwrap(), 2);
        let names: Vec<String> = list_challenges(&db, false).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Strength", "Stretch"]);
    }

    #[test]
    fn target_model_choice() {
        let args = TargetArgs {
            base: Some(2.0),
            ..Default::default()
        };
        assert_eq!(
            target_model_from_args(&args, false).unwrap(),
            TargetModel::Incremental {
                base_value: 2.0,
                increment_value: 1.0,
            }
        );
        assert_eq!(
            target_model_from_args(&TargetArgs::default(), false).unwrap(),
            TargetModel::Fixed { target: 1.0 }
        );
        let both = TargetArgs {
            target: Some(3.0),
            increment: Some(1.0),
            ..Default::default()
        };
        assert!(target_model_from_args(&both, false).is_err());
        let split_only = TargetArgs {
            split: true,
            ..Default::default()
        };
        assert!(target_model_from_args(&split_only, false).is_err());
    }

    #[test]
    fn goal_only_models_and_end_dates() {
        let total = TargetModel::Total {
            total: 100.0,
            split: true,
        };
        let habit = make_challenge(
            "c0001".to_string(),
            "Save",
            ChallengeType::Habit,
            Frequency::Monthly,
            d("2024-01-01"),
            Some(d("2024-12-31")),
            total.clone(),
            None,
            None,
            d("2024-01-01"),
        );
        assert!(habit.is_err());

        let open_goal = make_challenge(
            "c0001".to_string(),
            "Save",
            ChallengeType::Goal,
            Frequency::Monthly,
            d("2024-01-01"),
            None,
            total,
            None,
            None,
            d("2024-01-01"),
        );
        assert!(open_goal.is_err());

        let reversed = make_challenge(
            "c0001".to_string(),
            "Run",
            ChallengeType::Habit,
            Frequency::Daily,
            d("2024-02-01"),
            Some(d("2024-01-01")),
            TargetModel::Fixed { target: 1.0 },
            None,
            None,
            d("2024-01-01"),
        );
        assert!(reversed.is_err());
    }

    #[test]
    fn edits_convert_between_models() {
        let mut db = default_db();
        let mut c = fixed(&mut db, "Read");

        let edit = ChallengeEdit {
            target: TargetArgs {
                increment: Some(2.0),
                ..Default::default()
            },
            end_date: Some(d("2024-03-01")),
            ..Default::default()
        };
        apply_edit(&mut c, &edit).unwrap();
        assert_eq!(
            c.target,
            TargetModel::Incremental {
                base_value: 5.0,
                increment_value: 2.0,
            }
        );
        assert_eq!(c.end_date, Some(d("2024-03-01")));

        let edit = ChallengeEdit {
            target: TargetArgs {
                target: Some(7.0),
                ..Default::default()
            },
            clear_end: true,
            unit: Some(" ".to_string()),
            ..Default::default()
        };
        apply_edit(&mut c, &edit).unwrap();
        assert_eq!(c.target, TargetModel::Fixed { target: 7.0 });
        assert_eq!(c.end_date, None);
        assert_eq!(c.unit, None);

        let bad = ChallengeEdit {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(apply_edit(&mut c, &bad).is_err());
        assert_eq!(c.name, "Read");
    }
}
