use crate::error::CliError;
use crate::model::{Challenge, Task, TargetModel};
use crate::progress::percent_of;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Checklist {
    pub done: u32,
    pub total: u32,
    pub percent: f64,
}

pub fn checklist(tasks: &[Task]) -> Checklist {
    let done = u32::try_from(tasks.iter().filter(|t| t.done).count()).unwrap_or(u32::MAX);
    let total = u32::try_from(tasks.len()).unwrap_or(u32::MAX);
    Checklist {
        done,
        total,
        percent: percent_of(f64::from(done), f64::from(total)),
    }
}

/// Checklist summary, `None` for numeric challenges.
pub fn checklist_for(challenge: &Challenge) -> Option<Checklist> {
    match &challenge.target {
        TargetModel::Tasks { tasks } => Some(checklist(tasks)),
        _ => None,
    }
}

fn tasks_mut<'a>(challenge: &'a mut Challenge) -> Result<&'a mut Vec<Task>, CliError> {
    match &mut challenge.target {
        TargetModel::Tasks { tasks } => Ok(tasks),
        _ => Err(CliError::usage(format!(
            "Challenge {} is not a task checklist",
            challenge.id
        ))),
    }
}

pub fn add_task(challenge: &mut Challenge, title: &str) -> Result<Task, CliError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CliError::usage("Task title is required"));
    }
    let task = Task {
        title: title.to_string(),
        done: false,
    };
    tasks_mut(challenge)?.push(task.clone());
    Ok(task)
}

/// Marks task `number` (1-based, as listed) done or not done.
pub fn set_task_done(challenge: &mut Challenge, number: usize, done: bool) -> Result<Task, CliError> {
    let tasks = tasks_mut(challenge)?;
    let count = tasks.len();
    let task = number
        .checked_sub(1)
        .and_then(|i| tasks.get_mut(i))
        .ok_or_else(|| CliError::not_found(format!("Task not found: {} (of {})", number, count)))?;
    task.done = done;
    Ok(task.clone())
}
