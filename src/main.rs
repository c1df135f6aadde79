mod challenges;
mod chart;
mod config;
mod date;
mod db;
mod entries;
mod error;
mod export;
mod goal;
mod input;
mod model;
mod output;
mod period;
mod progress;
mod report;
mod standing;
mod target;
mod tasks;

use crate::challenges::{
    apply_edit, list_challenges, make_challenge, next_challenge_id, select_challenge_index,
    target_model_from_args, ChallengeEdit, TargetArgs,
};
use crate::chart::build_chart;
use crate::config::{load_config, Config};
use crate::date::{fmt_date, parse_date, system_today_utc};
use crate::db::{read_db, resolve_db_path, to_json_pretty, update_db};
use crate::entries::{
    add_value, delete_day, entries_for_challenge, list_entries_in_range, next_entry_id,
    remove_challenge_entries, set_value,
};
use crate::error::CliError;
use crate::export::export_csv_to_dir;
use crate::input::{challenge_from_record, entry_from_record, entry_records};
use crate::model::{Challenge, ChallengeType, Entry, TargetModel};
use crate::output::{
    fmt_amount, fmt_percent, fmt_signed, progress_bar, render_simple_table, Styler,
};
use crate::period::Frequency;
use crate::progress::build_history;
use crate::report::build_report;
use crate::target::target_label;
use crate::tasks::{add_task, checklist_for, set_task_done};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::fs;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum KindArg {
    Habit,
    Goal,
    Challenge,
}

impl KindArg {
    fn to_kind(self) -> ChallengeType {
        match self {
            KindArg::Habit => ChallengeType::Habit,
            KindArg::Goal => ChallengeType::Goal,
            KindArg::Challenge => ChallengeType::Challenge,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "challenge", version, about = "Track habits, goals and challenges")]
struct Cli {
    /// Overrides the DB path for this invocation.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Overrides logical "today" for deterministic output/testing.
    #[arg(long, global = true)]
    today: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/challenge-tracker/config.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output format. Most commands support table/json. `export` supports json/csv.
    #[arg(long, global = true, value_enum)]
    format: Option<Format>,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Debug logging on stderr (same as CHALLENGE_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Add(AddArgs),
    List(ListArgs),
    Show(SelectorArgs),
    Edit(EditArgs),
    Archive(SelectorArgs),
    Unarchive(SelectorArgs),
    /// Deletes a challenge together with its entries.
    Delete(SelectorArgs),
    /// Records progress for a date.
    Log(LogArgs),
    /// Periods, targets, goal so far and standing.
    Progress(ProgressArgs),
    /// Per-date attainment against the target of that date.
    History(SelectorArgs),
    /// Comparison, series and breakdown datasets.
    Chart(SelectorArgs),
    Task(TaskArgs),
    /// Reads external challenge/entry records.
    Import(ImportArgs),
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct TargetOpts {
    /// Fixed amount per period
    #[arg(long)]
    target: Option<f64>,

    /// First-period amount of a growing target
    #[arg(long)]
    base: Option<f64>,

    /// Amount added each period
    #[arg(long)]
    increment: Option<f64>,

    /// Total amount of a goal
    #[arg(long)]
    total: Option<f64>,

    /// Spreads --total evenly over the periods
    #[arg(long)]
    split: bool,
}

impl TargetOpts {
    fn to_target_args(&self, tasks: &[String]) -> TargetArgs {
        TargetArgs {
            target: self.target,
            base: self.base,
            increment: self.increment,
            total: self.total,
            split: self.split,
            tasks: tasks.to_vec(),
        }
    }
}

#[derive(Args, Debug)]
struct AddArgs {
    name: String,

    #[arg(long = "type", value_enum, default_value = "habit")]
    kind: KindArg,

    /// daily, weekly or monthly
    #[arg(long, default_value = "daily")]
    frequency: Frequency,

    /// Defaults to today
    #[arg(long)]
    start: Option<String>,

    #[arg(long)]
    end: Option<String>,

    #[command(flatten)]
    target: TargetOpts,

    /// Checklist task (repeatable, goals only)
    #[arg(long = "task")]
    tasks: Vec<String>,

    /// Creates an empty task checklist
    #[arg(long)]
    checklist: bool,

    #[arg(long)]
    unit: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Include archived challenges
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// Challenge selector: exact id (c0001) or unique name prefix (case-insensitive)
    challenge: String,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Challenge selector: exact id (c0001) or unique name prefix (case-insensitive)
    challenge: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    frequency: Option<Frequency>,

    #[arg(long)]
    start: Option<String>,

    #[arg(long)]
    end: Option<String>,

    /// Removes the end date
    #[arg(long)]
    no_end: bool,

    #[command(flatten)]
    target: TargetOpts,

    /// Empty string clears the unit
    #[arg(long)]
    unit: Option<String>,

    /// Empty string clears the notes
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Challenge selector: exact id (c0001) or unique name prefix (case-insensitive)
    challenge: String,

    #[arg(long)]
    date: Option<String>,

    /// Amount > 0 added to the date (default 1)
    #[arg(long)]
    value: Option<f64>,

    /// Amount >= 0 that replaces whatever the date holds
    #[arg(long)]
    set: Option<f64>,

    /// Removes the entry for that date
    #[arg(long)]
    delete: bool,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct ProgressArgs {
    /// Challenge selector: exact id (c0001) or unique name prefix (case-insensitive)
    challenge: String,

    /// Evaluates as of this date; later entries are ignored
    #[arg(long = "as-of")]
    as_of: Option<String>,
}

#[derive(Args, Debug)]
struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    Add(TaskAddArgs),
    Done(TaskMarkArgs),
    Undone(TaskMarkArgs),
}

#[derive(Args, Debug)]
struct TaskAddArgs {
    /// Challenge selector: exact id (c0001) or unique name prefix (case-insensitive)
    challenge: String,

    title: String,
}

#[derive(Args, Debug)]
struct TaskMarkArgs {
    /// Challenge selector: exact id (c0001) or unique name prefix (case-insensitive)
    challenge: String,

    /// Task number as listed by `show` (1-based)
    number: usize,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// JSON challenge record
    #[arg(long)]
    challenge: String,

    /// JSON list of entry records for that challenge
    #[arg(long)]
    entries: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    out: Option<String>,

    #[arg(long)]
    from: Option<String>,

    #[arg(long)]
    to: Option<String>,

    #[arg(long)]
    include_archived: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let code = if e.use_stderr() { 2 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code
        }
    };

    std::process::exit(exit);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CHALLENGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_line(s: &str) {
    println!("{}", s);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), CliError> {
    println!("{}", to_json_pretty(obj)?);
    Ok(())
}

fn resolve_today(cli_today: Option<&str>) -> Result<NaiveDate, CliError> {
    if let Some(t) = cli_today {
        return Ok(parse_date(t, "today")?);
    }

    if let Ok(t) = std::env::var("CHALLENGE_TODAY") {
        let tt = t.trim();
        if !tt.is_empty() {
            return Ok(parse_date(tt, "today")?);
        }
    }

    Ok(system_today_utc())
}

fn resolve_color_enabled(no_color_flag: bool, config: &Config) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    config.color.unwrap_or(true)
}

fn resolve_format(cli_format: Option<Format>, config: &Config) -> Result<Format, CliError> {
    if let Some(f) = cli_format {
        return Ok(f);
    }
    match config.default_format.as_deref() {
        Some(s) => Format::from_str(s.trim(), true)
            .map_err(|_| CliError::usage(format!("Invalid default_format in config: {}", s))),
        None => Ok(Format::Table),
    }
}

fn ensure_format_supported(format: Format, allow_csv: bool) -> Result<(), CliError> {
    if format == Format::Csv && !allow_csv {
        return Err(CliError::usage(
            "--format csv is only supported by `challenge export`",
        ));
    }
    Ok(())
}

fn parse_opt_date(s: Option<&str>, label: &str) -> Result<Option<NaiveDate>, CliError> {
    Ok(s.map(|v| parse_date(v, label)).transpose()?)
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn with_unit(v: f64, unit: Option<&str>) -> String {
    match unit {
        Some(u) => format!("{} {}", fmt_amount(v), u),
        None => fmt_amount(v),
    }
}

fn print_challenge(c: &Challenge) {
    print_line(&format!("{} ({})", c.name, c.id));
    print_line(&format!("type: {}", c.kind.as_str()));
    print_line(&format!("frequency: {}", c.frequency));
    print_line(&format!("start_date: {}", fmt_date(c.start_date)));
    if let Some(end) = c.end_date {
        print_line(&format!("end_date: {}", fmt_date(end)));
    }
    print_line(&format!("target: {}", target_label(c)));
    if let Some(u) = c.unit.as_deref() {
        print_line(&format!("unit: {}", u));
    }
    print_line(&format!("archived: {}", yes_no(c.archived)));
    print_line(&format!("created_date: {}", fmt_date(c.created_date)));
    if let Some(n) = c.notes.as_deref() {
        print_line(&format!("notes: {}", n));
    }
}

fn print_tasks(c: &Challenge) {
    if let TargetModel::Tasks { tasks } = &c.target {
        for (i, t) in tasks.iter().enumerate() {
            print_line(&format!("{}. [{}] {}", i + 1, if t.done { "x" } else { " " }, t.title));
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let db_path = resolve_db_path(cli.db.as_deref(), config.db_path.as_deref())?;
    let today = resolve_today(cli.today.as_deref())?;
    let format = resolve_format(cli.format, &config)?;
    debug!(db = %db_path, today = %today, ?format, "resolved settings");

    let styler = Styler::new(resolve_color_enabled(cli.no_color, &config));

    match cli.command {
        Command::Add(args) => {
            ensure_format_supported(format, false)?;

            let start = parse_opt_date(args.start.as_deref(), "start date")?.unwrap_or(today);
            let end = parse_opt_date(args.end.as_deref(), "end date")?;
            let target =
                target_model_from_args(&args.target.to_target_args(&args.tasks), args.checklist)?;

            let created = update_db(&db_path, |db| {
                let id = next_challenge_id(db);
                let challenge = make_challenge(
                    id,
                    &args.name,
                    args.kind.to_kind(),
                    args.frequency,
                    start,
                    end,
                    target,
                    args.unit.as_deref(),
                    args.notes.as_deref(),
                    today,
                )?;
                db.challenges.push(challenge.clone());
                Ok(challenge)
            })?;
            info!(challenge = %created.id, "created challenge");

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenge: Challenge,
                }
                print_json(&Out { challenge: created })?;
            } else {
                let row = vec![
                    created.id.clone(),
                    created.name.clone(),
                    created.kind.as_str().to_string(),
                    created.frequency.to_string(),
                    target_label(&created),
                ];
                print_line(&render_simple_table(
                    &["id", "name", "type", "frequency", "target"],
                    &[row],
                ));
            }

            Ok(())
        }

        Command::List(args) => {
            ensure_format_supported(format, false)?;

            let db = read_db(&db_path)?;
            let challenges = list_challenges(&db, args.all);

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenges: Vec<Challenge>,
                }
                print_json(&Out { challenges })?;
            } else if challenges.is_empty() {
                print_line(&styler.gray("(no challenges)"));
            } else {
                let rows: Vec<Vec<String>> = challenges
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.clone(),
                            c.name.clone(),
                            c.kind.as_str().to_string(),
                            c.frequency.to_string(),
                            target_label(c),
                            fmt_date(c.start_date),
                            c.end_date.map(fmt_date).unwrap_or_else(|| "-".to_string()),
                            yes_no(c.archived).to_string(),
                        ]
                    })
                    .collect();

                print_line(&render_simple_table(
                    &["id", "name", "type", "frequency", "target", "start", "end", "archived"],
                    &rows,
                ));
            }

            Ok(())
        }

        Command::Show(args) => {
            ensure_format_supported(format, false)?;

            let db = read_db(&db_path)?;
            let idx = select_challenge_index(&db, &args.challenge, true)?;
            let challenge = db.challenges[idx].clone();
            let entries = entries_for_challenge(&db, &challenge.id);

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenge: Challenge,
                    entries: Vec<Entry>,
                }
                print_json(&Out { challenge, entries })?;
            } else {
                print_challenge(&challenge);
                if challenge.is_checklist() {
                    print_line("tasks:");
                    print_tasks(&challenge);
                }
                if !entries.is_empty() {
                    print_line("entries:");
                    for e in entries.iter() {
                        let mut line = format!("- {} {}", fmt_date(e.date), fmt_amount(e.value));
                        if let Some(n) = e.notes.as_deref() {
                            line.push_str(&format!(" ({})", n));
                        }
                        print_line(&line);
                    }
                }
            }

            Ok(())
        }

        Command::Edit(args) => {
            ensure_format_supported(format, false)?;

            let edit = ChallengeEdit {
                name: args.name.clone(),
                frequency: args.frequency,
                start_date: parse_opt_date(args.start.as_deref(), "start date")?,
                end_date: parse_opt_date(args.end.as_deref(), "end date")?,
                clear_end: args.no_end,
                target: args.target.to_target_args(&[]),
                unit: args.unit.clone(),
                notes: args.notes.clone(),
            };

            let updated = update_db(&db_path, |db| {
                let idx = select_challenge_index(db, &args.challenge, true)?;
                apply_edit(&mut db.challenges[idx], &edit)?;
                Ok(db.challenges[idx].clone())
            })?;
            info!(challenge = %updated.id, "edited challenge");

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenge: Challenge,
                }
                print_json(&Out { challenge: updated })?;
            } else {
                print_challenge(&updated);
            }

            Ok(())
        }

        Command::Archive(args) => set_archived(&db_path, &args.challenge, true, format),

        Command::Unarchive(args) => set_archived(&db_path, &args.challenge, false, format),

        Command::Delete(args) => {
            ensure_format_supported(format, false)?;

            let (removed, entries) = update_db(&db_path, |db| {
                let idx = select_challenge_index(db, &args.challenge, true)?;
                let removed = db.challenges.remove(idx);
                let entries = remove_challenge_entries(db, &removed.id);
                Ok((removed, entries))
            })?;
            info!(challenge = %removed.id, entries, "deleted challenge");

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    deleted: Challenge,
                    entries_removed: usize,
                }
                print_json(&Out {
                    deleted: removed,
                    entries_removed: entries,
                })?;
            } else {
                print_line(&format!(
                    "Deleted: {} ({}), {} entries removed",
                    removed.name, removed.id, entries
                ));
            }

            Ok(())
        }

        Command::Log(args) => {
            ensure_format_supported(format, false)?;

            let date = parse_opt_date(args.date.as_deref(), "date")?.unwrap_or(today);

            if args.delete && (args.value.is_some() || args.set.is_some()) {
                return Err(CliError::usage(
                    "Invalid flags: --delete conflicts with --value/--set",
                ));
            }
            if args.value.is_some() && args.set.is_some() {
                return Err(CliError::usage("Invalid flags: --value conflicts with --set"));
            }
            if let Some(v) = args.value {
                if v <= 0.0 {
                    return Err(CliError::usage("Invalid value: --value must be > 0"));
                }
            }

            #[derive(Debug, serde::Serialize)]
            struct ChallengeMini {
                id: String,
                name: String,
            }

            #[derive(Debug, serde::Serialize)]
            struct LogResult {
                challenge: ChallengeMini,
                date: NaiveDate,
                action: &'static str,
                #[serde(skip_serializing_if = "Option::is_none")]
                delta: Option<f64>,
                value: f64,
            }

            let result = update_db(&db_path, |db| {
                let idx = select_challenge_index(db, &args.challenge, true)?;
                let c = &db.challenges[idx];
                if c.is_checklist() {
                    return Err(CliError::usage(format!(
                        "Challenge {} is a task checklist; use `challenge task`",
                        c.id
                    )));
                }
                let challenge = ChallengeMini {
                    id: c.id.clone(),
                    name: c.name.clone(),
                };

                if args.delete {
                    let removed = delete_day(db, &challenge.id, date);
                    if removed == 0 {
                        return Err(CliError::not_found(format!(
                            "No entry for {} on {}",
                            challenge.id,
                            fmt_date(date)
                        )));
                    }
                    return Ok(LogResult {
                        challenge,
                        date,
                        action: "delete",
                        delta: None,
                        value: 0.0,
                    });
                }

                if let Some(v) = args.set {
                    let e = set_value(db, &challenge.id, date, v, args.notes.as_deref())?;
                    return Ok(LogResult {
                        challenge,
                        date,
                        action: "set",
                        delta: None,
                        value: e.value,
                    });
                }

                let delta = args.value.unwrap_or(1.0);
                let total = add_value(db, &challenge.id, date, delta, args.notes.as_deref())?;
                Ok(LogResult {
                    challenge,
                    date,
                    action: "add",
                    delta: Some(delta),
                    value: total,
                })
            })?;
            debug!(challenge = %result.challenge.id, date = %result.date, action = result.action, "logged");

            if format == Format::Json {
                print_json(&result)?;
            } else {
                let msg = match result.action {
                    "delete" => format!(
                        "Deleted entry: {} ({}) {}",
                        result.challenge.name,
                        result.challenge.id,
                        fmt_date(result.date)
                    ),
                    _ => format!(
                        "Logged: {} ({}) {} = {}",
                        result.challenge.name,
                        result.challenge.id,
                        fmt_date(result.date),
                        fmt_amount(result.value)
                    ),
                };
                print_line(&msg);
            }

            Ok(())
        }

        Command::Progress(args) => {
            ensure_format_supported(format, false)?;

            let as_of = parse_opt_date(args.as_of.as_deref(), "as-of")?;
            let db = read_db(&db_path)?;
            let idx = select_challenge_index(&db, &args.challenge, true)?;
            let challenge = &db.challenges[idx];
            let mut entries = entries_for_challenge(&db, &challenge.id);
            if let Some(limit) = as_of {
                entries.retain(|e| e.date <= limit);
            }
            let report = build_report(challenge, &entries, as_of.unwrap_or(today));

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    progress: crate::report::ProgressReport,
                }
                print_json(&Out { progress: report })?;
            } else {
                let unit = report.unit.as_deref();
                print_line(&format!(
                    "{} ({}) as of {}",
                    report.name,
                    report.challenge_id,
                    fmt_date(report.as_of)
                ));
                print_line(&format!("target: {}", report.target_label));

                if let Some(cl) = report.checklist.as_ref() {
                    print_line(&format!(
                        "tasks: {}/{} {} {}",
                        cl.done,
                        cl.total,
                        progress_bar(cl.percent, 20),
                        fmt_percent(cl.percent)
                    ));
                    print_tasks(challenge);
                } else {
                    let noun = report.frequency.period_noun();
                    if report.periods.started {
                        print_line(&format!(
                            "{}: {} of {} ({} due)",
                            noun,
                            report.periods.current + 1,
                            report.periods.total,
                            report.periods.due
                        ));
                    } else {
                        print_line(&styler.gray("not started yet"));
                    }
                    print_line(&format!(
                        "this {}: {}",
                        noun,
                        with_unit(report.current_target, unit)
                    ));
                    print_line(&format!("total goal: {}", with_unit(report.total_goal, unit)));
                    print_line(&format!("goal so far: {}", with_unit(report.goal_so_far, unit)));
                    print_line(&format!(
                        "actual: {} {} {}",
                        with_unit(report.actual_progress, unit),
                        progress_bar(report.completion_percent, 20),
                        fmt_percent(report.completion_percent)
                    ));
                    print_line(&format!("remaining: {}", with_unit(report.remaining, unit)));
                    if let Some(s) = report.standing {
                        print_line(&format!(
                            "standing: {} ({}, {} of expected)",
                            styler.status(s.status),
                            fmt_signed(s.delta),
                            fmt_percent(s.percent)
                        ));
                    }
                }
                if let Some(d) = report.days_left {
                    print_line(&format!("days left: {}", d));
                }
            }

            Ok(())
        }

        Command::History(args) => {
            ensure_format_supported(format, false)?;

            let db = read_db(&db_path)?;
            let idx = select_challenge_index(&db, &args.challenge, true)?;
            let challenge = &db.challenges[idx];
            if challenge.is_checklist() {
                return Err(CliError::usage(format!(
                    "Challenge {} is a task checklist and has no history",
                    challenge.id
                )));
            }
            let entries = entries_for_challenge(&db, &challenge.id);
            let history = build_history(challenge, &entries);

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenge_id: String,
                    history: Vec<crate::progress::HistoryRow>,
                }
                print_json(&Out {
                    challenge_id: challenge.id.clone(),
                    history,
                })?;
            } else if history.is_empty() {
                print_line(&styler.gray("(no entries)"));
            } else {
                let rows: Vec<Vec<String>> = history
                    .iter()
                    .map(|r| {
                        let met = if r.met {
                            styler.green("yes")
                        } else {
                            styler.red("no")
                        };
                        vec![
                            fmt_date(r.date),
                            fmt_amount(r.value),
                            fmt_amount(r.target),
                            met,
                            fmt_percent(r.percent),
                            progress_bar(r.percent, 10),
                        ]
                    })
                    .collect();
                print_line(&render_simple_table(
                    &["date", "value", "target", "met", "%", "progress"],
                    &rows,
                ));
            }

            Ok(())
        }

        Command::Chart(args) => {
            ensure_format_supported(format, false)?;

            let db = read_db(&db_path)?;
            let idx = select_challenge_index(&db, &args.challenge, true)?;
            let challenge = &db.challenges[idx];
            let entries = entries_for_challenge(&db, &challenge.id);
            let chart = build_chart(challenge, &entries, today);

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenge_id: String,
                    chart: crate::chart::ChartData,
                }
                print_json(&Out {
                    challenge_id: challenge.id.clone(),
                    chart,
                })?;
            } else {
                let cmp = &chart.comparison;
                print_line(&format!("{} ({})", challenge.name, challenge.id));
                print_line(&format!(
                    "total goal: {}  goal so far: {}  actual: {}",
                    fmt_amount(cmp.total_goal),
                    fmt_amount(cmp.goal_so_far),
                    fmt_amount(cmp.actual_progress)
                ));
                print_line(&format!(
                    "completed: {}  remaining: {}",
                    fmt_amount(chart.breakdown.completed),
                    fmt_amount(chart.breakdown.remaining)
                ));
                if !chart.series.is_empty() {
                    print_line("");
                    let rows: Vec<Vec<String>> = chart
                        .series
                        .iter()
                        .map(|p| {
                            vec![
                                fmt_date(p.date),
                                fmt_amount(p.value),
                                fmt_amount(p.cumulative_actual),
                                fmt_amount(p.expected),
                            ]
                        })
                        .collect();
                    print_line(&render_simple_table(
                        &["date", "value", "cumulative", "expected"],
                        &rows,
                    ));
                }
            }

            Ok(())
        }

        Command::Task(args) => {
            ensure_format_supported(format, false)?;

            let (selector, action) = match &args.command {
                TaskCommand::Add(a) => (a.challenge.as_str(), "add"),
                TaskCommand::Done(a) => (a.challenge.as_str(), "done"),
                TaskCommand::Undone(a) => (a.challenge.as_str(), "undone"),
            };

            let updated = update_db(&db_path, |db| {
                let idx = select_challenge_index(db, selector, true)?;
                let challenge = &mut db.challenges[idx];
                match &args.command {
                    TaskCommand::Add(a) => add_task(challenge, &a.title)?,
                    TaskCommand::Done(a) => set_task_done(challenge, a.number, true)?,
                    TaskCommand::Undone(a) => set_task_done(challenge, a.number, false)?,
                };
                Ok(challenge.clone())
            })?;
            debug!(challenge = %updated.id, action, "updated checklist");

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenge: Challenge,
                    checklist: Option<crate::tasks::Checklist>,
                }
                let checklist = checklist_for(&updated);
                print_json(&Out {
                    challenge: updated,
                    checklist,
                })?;
            } else {
                print_tasks(&updated);
                if let Some(cl) = checklist_for(&updated) {
                    print_line(&format!(
                        "{}/{} done ({})",
                        cl.done,
                        cl.total,
                        fmt_percent(cl.percent)
                    ));
                }
            }

            Ok(())
        }

        Command::Import(args) => {
            ensure_format_supported(format, false)?;

            let challenge_doc = read_json_file(&args.challenge)?;
            let entries_doc = args.entries.as_deref().map(read_json_file).transpose()?;

            let (challenge, imported) = update_db(&db_path, |db| {
                let id = next_challenge_id(db);
                let challenge = challenge_from_record(&challenge_doc, id, today)?;

                let mut imported = 0usize;
                if let Some(doc) = entries_doc.as_ref() {
                    for record in entry_records(doc)? {
                        let eid = next_entry_id(db);
                        db.entries.push(entry_from_record(record, eid, &challenge.id)?);
                        imported += 1;
                    }
                }

                db.challenges.push(challenge.clone());
                Ok((challenge, imported))
            })?;
            info!(challenge = %challenge.id, entries = imported, "imported challenge");

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    challenge: Challenge,
                    entries_imported: usize,
                }
                print_json(&Out {
                    challenge,
                    entries_imported: imported,
                })?;
            } else {
                print_line(&format!(
                    "Imported: {} ({}) with {} entries",
                    challenge.name, challenge.id, imported
                ));
            }

            Ok(())
        }

        Command::Export(args) => {
            // `export` supports json/csv; `table` is invalid.
            if format == Format::Table {
                return Err(CliError::usage(
                    "`challenge export` requires --format json|csv",
                ));
            }

            let from = parse_opt_date(args.from.as_deref(), "from")?;
            let to = parse_opt_date(args.to.as_deref(), "to")?;
            if let (Some(f), Some(t)) = (from, to) {
                if f > t {
                    return Err(CliError::usage("Invalid range: from > to"));
                }
            }

            let db = read_db(&db_path)?;
            let challenges = list_challenges(&db, args.include_archived);
            let ids: BTreeSet<String> = challenges.iter().map(|c| c.id.clone()).collect();
            let entries = list_entries_in_range(&db, from, to, Some(&ids));
            info!(challenges = challenges.len(), entries = entries.len(), "exporting");

            if format == Format::Json {
                #[derive(serde::Serialize)]
                struct Payload {
                    version: u32,
                    challenges: Vec<Challenge>,
                    entries: Vec<Entry>,
                }

                let payload = Payload {
                    version: 1,
                    challenges,
                    entries,
                };
                let data = to_json_pretty(&payload)? + "\n";

                if let Some(p) = args.out.as_deref() {
                    fs::write(p, data.as_bytes()).map_err(|_| CliError::io("Export IO error"))?;
                    #[cfg(unix)]
                    {
                        use std::os::unix::fs::PermissionsExt;
                        let _ = fs::set_permissions(p, fs::Permissions::from_mode(0o600));
                    }
                } else {
                    print!("{}", data);
                }
            } else {
                let out_dir = args
                    .out
                    .as_deref()
                    .ok_or_else(|| CliError::usage("CSV export requires --out <dir>"))?;
                export_csv_to_dir(out_dir, &challenges, &entries)?;
            }

            Ok(())
        }
    }
}

fn read_json_file(path: &str) -> Result<serde_json::Value, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|_| CliError::io(format!("Import IO error: {}", path)))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::usage(format!("Invalid JSON in {}: {}", path, e)))
}

fn set_archived(db_path: &str, selector: &str, archived: bool, format: Format) -> Result<(), CliError> {
    ensure_format_supported(format, false)?;

    let updated = update_db(db_path, |db| {
        let idx = select_challenge_index(db, selector, true)?;
        let challenge = &mut db.challenges[idx];
        challenge.archived = archived;
        Ok(challenge.clone())
    })?;

    if format == Format::Json {
        #[derive(serde::Serialize)]
        struct Out {
            challenge: Challenge,
        }
        print_json(&Out { challenge: updated })?;
    } else {
        let verb = if archived { "Archived" } else { "Unarchived" };
        print_line(&format!("{}: {} ({})", verb, updated.name, updated.id));
    }

    Ok(())
}
