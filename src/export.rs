use crate::date::fmt_date;
use crate::error::CliError;
use crate::model::{Challenge, Entry, TargetModel};
use std::fs;
use std::io::Write;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn csv_escape(value: &str) -> String {
    if value.contains(['\n', '\r', '"', ',']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn to_csv_line(values: &[String]) -> String {
    values.iter().map(|v| csv_escape(v)).collect::<Vec<String>>().join(",")
}

const CHALLENGE_COLUMNS: [&str; 14] = [
    "id",
    "name",
    "type",
    "frequency",
    "start_date",
    "end_date",
    "is_incremental",
    "target",
    "base_value",
    "increment_value",
    "unit",
    "notes",
    "archived",
    "created_date",
];

fn challenge_row(c: &Challenge) -> Vec<String> {
    let (target, base, increment) = match &c.target {
        TargetModel::Fixed { target } => (target.to_string(), String::new(), String::new()),
        TargetModel::Incremental {
            base_value,
            increment_value,
        } => (
            base_value.to_string(),
            base_value.to_string(),
            increment_value.to_string(),
        ),
        TargetModel::Total { total, .. } => (total.to_string(), String::new(), String::new()),
        TargetModel::Tasks { tasks } => (tasks.len().to_string(), String::new(), String::new()),
    };

    vec![
        c.id.clone(),
        c.name.clone(),
        c.kind.as_str().to_string(),
        c.frequency.as_str().to_string(),
        fmt_date(c.start_date),
        c.end_date.map(fmt_date).unwrap_or_default(),
        c.is_incremental().to_string(),
        target,
        base,
        increment,
        c.unit.clone().unwrap_or_default(),
        c.notes.clone().unwrap_or_default(),
        c.archived.to_string(),
        fmt_date(c.created_date),
    ]
}

fn write_csv(path: &Path, lines: &[String]) -> Result<(), CliError> {
    let mut f = fs::File::create(path).map_err(|_| CliError::io("Export IO error"))?;
    #[cfg(unix)]
    {
        let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
    }
    let mut body = lines.join("\n");
    body.push('\n');
    f.write_all(body.as_bytes())
        .map_err(|_| CliError::io("Export IO error"))
}

/// Writes `challenges.csv` and `entries.csv` into `out_dir`.
pub fn export_csv_to_dir(out_dir: &str, challenges: &[Challenge], entries: &[Entry]) -> Result<(), CliError> {
    let out_path = Path::new(out_dir);
    fs::create_dir_all(out_path).map_err(|_| CliError::io("Export IO error"))?;

    #[cfg(unix)]
    {
        let _ = fs::set_permissions(out_path, fs::Permissions::from_mode(0o700));
    }

    let header: Vec<String> = CHALLENGE_COLUMNS.iter().map(|s| s.to_string()).collect();
    let mut challenge_lines = vec![to_csv_line(&header)];
    challenge_lines.extend(challenges.iter().map(|c| to_csv_line(&challenge_row(c))));

    let header: Vec<String> = ["id", "challenge_id", "date", "value", "notes"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut entry_lines = vec![to_csv_line(&header)];
    for e in entries.iter() {
        entry_lines.push(to_csv_line(&[
            e.id.clone(),
            e.challenge_id.clone(),
            fmt_date(e.date),
            e.value.to_string(),
            e.notes.clone().unwrap_or_default(),
        ]));
    }

    write_csv(&out_path.join("challenges.csv"), &challenge_lines)?;
    write_csv(&out_path.join("entries.csv"), &entry_lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_only_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
