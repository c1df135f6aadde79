use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn challenge_cmd() -> Command {
    let mut cmd = Command::cargo_bin("challenge").expect("binary challenge is built");
    cmd.env_remove("CHALLENGE_DB_PATH")
        .env_remove("CHALLENGE_TODAY")
        .env_remove("CHALLENGE_CONFIG")
        .env_remove("CHALLENGE_LOG");
    cmd
}

fn read_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("valid json")
}

/// Runs `args` against `db` with `--format json` and returns parsed stdout.
fn run_json(db: &Path, today: &str, args: &[&str]) -> Value {
    let out = challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "--today", today, "--format", "json"])
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    read_json(&out)
}

fn num(v: &Value) -> f64 {
    v.as_f64().expect("number")
}

#[test]
fn add_list_show_flow_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    let v = run_json(&db, "2024-01-01", &["add", "Stretch", "--target", "10", "--unit", "min"]);
    assert_eq!(v["challenge"]["id"], "c0001");
    assert_eq!(v["challenge"]["start_date"], "2024-01-01");
    assert_eq!(v["challenge"]["type"], "habit");

    let v = run_json(
        &db,
        "2024-01-01",
        &["add", "Read", "--frequency", "weekly", "--type", "challenge", "--base", "20", "--increment", "5"],
    );
    assert_eq!(v["challenge"]["id"], "c0002");
    assert_eq!(v["challenge"]["frequency"], "weekly");

    // Sorted by name.
    let v = run_json(&db, "2024-01-01", &["list"]);
    let names: Vec<&str> = v["challenges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Read", "Stretch"]);

    let v = run_json(&db, "2024-01-01", &["show", "str"]);
    assert_eq!(v["challenge"]["id"], "c0001");
    assert_eq!(v["challenge"]["unit"], "min");
}

#[test]
fn table_output_lists_challenges() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Pushups", "--base", "2", "--increment", "1"]);

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "--no-color", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pushups"))
        .stdout(predicate::str::contains("2/day +1"));
}

#[test]
fn selector_errors_have_distinct_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Run"]);
    run_json(&db, "2024-01-01", &["add", "Rowing"]);

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "show", "r"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Ambiguous"));

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "show", "swim"])
        .assert()
        .code(3);

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "show", "c0009"])
        .assert()
        .code(3);
}

#[test]
fn incremental_progress_and_standing() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");

    run_json(
        &db,
        "2024-01-01",
        &[
            "add", "Pushups", "--start", "2024-01-01", "--end", "2024-01-10", "--base", "2",
            "--increment", "1",
        ],
    );
    let v = run_json(&db, "2024-01-01", &["log", "push", "--date", "2024-01-01", "--value", "3"]);
    assert_eq!(v["action"], "add");
    assert_eq!(num(&v["value"]), 3.0);
    run_json(&db, "2024-01-02", &["log", "push", "--value", "10"]);

    let v = run_json(&db, "2024-01-02", &["progress", "push"]);
    let p = &v["progress"];
    assert_eq!(num(&p["total_goal"]), 65.0);
    assert_eq!(num(&p["actual_progress"]), 13.0);
    // Only the first day counts as due on the second day.
    assert_eq!(num(&p["goal_so_far"]), 2.0);
    assert_eq!(num(&p["current_target"]), 3.0);
    assert_eq!(num(&p["standing"]["delta"]), 11.0);
    assert_eq!(p["standing"]["status"], "ahead");
    assert_eq!(p["periods"]["total"], 10);

    let v = run_json(&db, "2024-01-10", &["progress", "push", "--as-of", "2024-01-05"]);
    let p = &v["progress"];
    assert_eq!(num(&p["goal_so_far"]), 14.0);
    assert_eq!(num(&p["standing"]["delta"]), -1.0);
    assert_eq!(p["standing"]["status"], "behind");
}

#[test]
fn monthly_range_counts_whole_months() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(
        &db,
        "2024-01-01",
        &[
            "add", "Budget", "--frequency", "monthly", "--start", "2024-01-01", "--end",
            "2024-12-31", "--target", "100",
        ],
    );

    let v = run_json(&db, "2024-03-15", &["progress", "budget"]);
    assert_eq!(v["progress"]["periods"]["total"], 12);
    assert_eq!(num(&v["progress"]["total_goal"]), 1200.0);
}

#[test]
fn log_set_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Water", "--target", "8"]);

    run_json(&db, "2024-01-01", &["log", "water", "--value", "3"]);
    run_json(&db, "2024-01-01", &["log", "water", "--value", "2", "--notes", "lunch"]);
    let v = run_json(&db, "2024-01-01", &["show", "water"]);
    let entries = v["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(num(&entries[0]["value"]), 5.0);
    assert_eq!(entries[0]["notes"], "lunch");

    let v = run_json(&db, "2024-01-01", &["log", "water", "--set", "0"]);
    assert_eq!(v["action"], "set");
    let v = run_json(&db, "2024-01-01", &["show", "water"]);
    assert_eq!(v["entries"].as_array().unwrap().len(), 1);

    run_json(&db, "2024-01-01", &["log", "water", "--delete"]);
    let v = run_json(&db, "2024-01-01", &["show", "water"]);
    assert!(v["entries"].as_array().unwrap().is_empty());

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "--today", "2024-01-01", "log", "water", "--delete"])
        .assert()
        .code(3);
}

#[test]
fn invalid_input_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Water"]);

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "log", "water", "--value", "0"])
        .assert()
        .code(2);

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "log", "water", "--date", "2024-02-30"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid date"));

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "add", "Bad", "--target", "3", "--total", "9"])
        .assert()
        .code(2);

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "--format", "csv", "list"])
        .assert()
        .code(2);
}

#[test]
fn history_reports_attainment_per_date() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Walk", "--target", "5", "--start", "2024-01-01"]);
    run_json(&db, "2024-01-01", &["log", "walk", "--date", "2024-01-01", "--value", "5"]);
    run_json(&db, "2024-01-02", &["log", "walk", "--date", "2024-01-02", "--value", "3"]);

    let v = run_json(&db, "2024-01-02", &["history", "walk"]);
    let rows = v["history"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], "2024-01-02");
    assert_eq!(rows[0]["met"], false);
    assert_eq!(num(&rows[0]["percent"]), 60.0);
    assert_eq!(rows[1]["met"], true);
    assert_eq!(num(&rows[1]["percent"]), 100.0);
}

#[test]
fn chart_series_is_cumulative() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(
        &db,
        "2024-01-01",
        &["add", "Pages", "--target", "10", "--start", "2024-01-01", "--end", "2024-01-10"],
    );
    run_json(&db, "2024-01-03", &["log", "pages", "--date", "2024-01-03", "--value", "12"]);
    run_json(&db, "2024-01-03", &["log", "pages", "--date", "2024-01-01", "--value", "4"]);

    let v = run_json(&db, "2024-01-03", &["chart", "pages"]);
    let chart = &v["chart"];
    assert_eq!(num(&chart["comparison"]["total_goal"]), 100.0);
    assert_eq!(num(&chart["comparison"]["actual_progress"]), 16.0);

    let series = chart["series"].as_array().unwrap();
    assert_eq!(series[0]["date"], "2024-01-01");
    assert_eq!(num(&series[1]["cumulative_actual"]), 16.0);
    assert_eq!(num(&chart["breakdown"]["completed"]), 16.0);
    assert_eq!(num(&chart["breakdown"]["remaining"]), 84.0);
}

#[test]
fn task_checklist_flow() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(
        &db,
        "2024-01-01",
        &["add", "Move house", "--type", "goal", "--task", "Pack", "--task", "Book van"],
    );
    run_json(&db, "2024-01-02", &["task", "add", "move", "Clean"]);
    let v = run_json(&db, "2024-01-02", &["task", "done", "move", "1"]);
    assert_eq!(v["checklist"]["done"], 1);
    assert_eq!(v["checklist"]["total"], 3);

    let v = run_json(&db, "2024-01-02", &["progress", "move"]);
    assert_eq!(v["progress"]["checklist"]["done"], 1);
    assert!(v["progress"]["standing"].is_null());

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "task", "done", "move", "9"])
        .assert()
        .code(3);

    // Checklists are goal-only.
    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "add", "Chores", "--task", "Dishes"])
        .assert()
        .code(2);
}

#[test]
fn split_total_goal() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(
        &db,
        "2024-01-01",
        &[
            "add", "Savings", "--type", "goal", "--frequency", "weekly", "--start", "2024-01-01",
            "--end", "2024-01-28", "--total", "400", "--split",
        ],
    );

    let v = run_json(&db, "2024-01-15", &["progress", "savings"]);
    let p = &v["progress"];
    assert_eq!(num(&p["total_goal"]), 400.0);
    assert_eq!(num(&p["current_target"]), 100.0);
    assert_eq!(num(&p["goal_so_far"]), 200.0);
}

#[test]
fn import_normalises_external_records() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let challenge = dir.path().join("challenge.json");
    let entries = dir.path().join("entries.json");

    fs::write(
        &challenge,
        r#"{"challenge": {
            "name": "Squats",
            "type": "HABIT",
            "frequency": "DAILY",
            "startDate": "2024-01-01T08:30:00Z",
            "endDate": "2024-01-10",
            "isIncremental": true,
            "baseValue": "2",
            "incrementPerDay": 1
        }}"#,
    )
    .unwrap();
    fs::write(
        &entries,
        r#"{"entries": [
            {"date": "2024-01-01T23:59:00Z", "value": "3"},
            {"entry_date": "2024-01-02", "amount": 10}
        ]}"#,
    )
    .unwrap();

    let v = run_json(
        &db,
        "2024-01-02",
        &["import", "--challenge", challenge.to_str().unwrap(), "--entries", entries.to_str().unwrap()],
    );
    assert_eq!(v["entries_imported"], 2);
    assert_eq!(v["challenge"]["start_date"], "2024-01-01");
    assert_eq!(num(&v["challenge"]["target"]["increment_value"]), 1.0);

    let v = run_json(&db, "2024-01-02", &["progress", "squats"]);
    assert_eq!(num(&v["progress"]["total_goal"]), 65.0);
    assert_eq!(num(&v["progress"]["actual_progress"]), 13.0);

    fs::write(&challenge, "{not json").unwrap();
    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "import", "--challenge", challenge.to_str().unwrap()])
        .assert()
        .code(2);
}

#[test]
fn delete_cascades_entries() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Run"]);
    run_json(&db, "2024-01-01", &["add", "Swim"]);
    run_json(&db, "2024-01-01", &["log", "run", "--value", "4"]);
    run_json(&db, "2024-01-01", &["log", "swim", "--value", "1"]);

    let v = run_json(&db, "2024-01-01", &["delete", "run"]);
    assert_eq!(v["entries_removed"], 1);

    let v = run_json(&db, "2024-01-01", &["export"]);
    assert_eq!(v["challenges"].as_array().unwrap().len(), 1);
    let entries = v["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["challenge_id"], "c0002");
}

#[test]
fn archive_hides_from_list() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Yoga"]);
    run_json(&db, "2024-01-01", &["archive", "yoga"]);

    let v = run_json(&db, "2024-01-01", &["list"]);
    assert!(v["challenges"].as_array().unwrap().is_empty());
    let v = run_json(&db, "2024-01-01", &["list", "--all"]);
    assert_eq!(v["challenges"][0]["archived"], true);

    let v = run_json(&db, "2024-01-01", &["unarchive", "c0001"]);
    assert_eq!(v["challenge"]["archived"], false);
}

#[test]
fn edit_changes_target_and_end() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    run_json(&db, "2024-01-01", &["add", "Plank", "--target", "30", "--end", "2024-01-31"]);

    let v = run_json(&db, "2024-01-01", &["edit", "plank", "--increment", "5", "--no-end"]);
    assert_eq!(v["challenge"]["target"]["model"], "incremental");
    assert_eq!(num(&v["challenge"]["target"]["base_value"]), 30.0);
    assert!(v["challenge"]["end_date"].is_null());

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "edit", "plank", "--end", "2024-02-01", "--no-end"])
        .assert()
        .code(2);
}

#[test]
fn export_csv_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let out = dir.path().join("out");
    run_json(&db, "2024-01-01", &["add", "Run, easy", "--target", "3"]);
    run_json(&db, "2024-01-01", &["log", "run", "--value", "2.5"]);

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "--format", "csv", "export", "--out", out.to_str().unwrap()])
        .assert()
        .success();

    let challenges = fs::read_to_string(out.join("challenges.csv")).unwrap();
    assert!(challenges.starts_with("id,name,type,frequency"));
    assert!(challenges.contains("c0001,\"Run, easy\",habit,daily"));
    let entries = fs::read_to_string(out.join("entries.csv")).unwrap();
    assert!(entries.contains("e0001,c0001,2024-01-01,2.5,"));

    challenge_cmd()
        .args(["--db", db.to_str().unwrap(), "export"])
        .assert()
        .code(2);
}

#[test]
fn settings_come_from_env_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("nested").join("db.json");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!("db_path = {:?}\ndefault_format = \"json\"\ncolor = false\n", db.to_str().unwrap()),
    )
    .unwrap();

    let out = challenge_cmd()
        .env("CHALLENGE_TODAY", "2024-05-01")
        .args(["--config", config.to_str().unwrap(), "add", "Journal"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = read_json(&out);
    assert_eq!(v["challenge"]["created_date"], "2024-05-01");
    assert!(db.exists());

    fs::write(&config, "colour = true\n").unwrap();
    challenge_cmd()
        .args(["--config", config.to_str().unwrap(), "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid config"));
}
