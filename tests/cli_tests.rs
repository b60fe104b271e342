//! Integration tests for the `cli` binary.

#![cfg(feature = "cli")]

use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cli_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("cli"));
    cmd.env_remove("SCHEDULE_START").env_remove("RUST_LOG");
    cmd
}

fn write_input(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const TASKS: &str = "\
id,dependencies,duration
1,,2
2,1,3
3,1,1
4,\"2,3\",1
";

#[test]
fn prints_table_and_summary_without_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tasks.csv", TASKS);

    cli_cmd()
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("| id "))
        .stdout(predicate::str::contains("2023-11-07"))
        .stdout(predicate::str::contains(
            "Refreshed (tasks=4, roots=1, waves=3, finish=2023-11-07)",
        ));
}

#[test]
fn start_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tasks.csv", "id,deps,duration\n1,,1\n");
    let config = write_input(
        &dir,
        "meta.json",
        r#"{ "project_name": "Demo", "project_start_date": "2024-01-08" }"#,
    );

    cli_cmd()
        .arg("--input")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("finish=2024-01-09"));

    cli_cmd()
        .arg("--input")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--start")
        .arg("2024-02-05")
        .assert()
        .success()
        .stdout(predicate::str::contains("finish=2024-02-06"));
}

#[test]
fn writes_csv_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tasks.csv", TASKS);
    let output = dir.path().join("out.csv");

    cli_cmd()
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("id,dependencies,duration,"));
    assert_eq!(written.lines().count(), 5);
    assert!(written.contains("2023-11-06,2023-11-07"));
}

#[test]
fn writes_json_output_with_semicolon_input() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tasks.csv", "id;deps;duration\n1;;1\n2;all;1\n");
    let output = dir.path().join("out.json");

    cli_cmd()
        .args(["--delimiter", ";", "--format", "json"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["metadata"]["project_name"], "New Project");
    assert_eq!(json["tasks"][1]["start"], "2023-10-31");
    assert_eq!(json["summary"]["wave_count"], 2);
}

#[test]
fn dependency_cycle_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tasks.csv", "id,deps,duration\n1,2,1\n2,1,1\n");

    cli_cmd()
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency cycles: [1, 2]"));
}

#[test]
fn failure_is_reported_whatever_the_log_filter() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tasks.csv", "id,deps,duration\n1,2,1\n2,1,1\n");

    cli_cmd()
        .env("RUST_LOG", "schedule_forecast=info")
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolved tasks: 1, 2"));
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().unwrap();
    cli_cmd()
        .arg("--input")
        .arg(dir.path().join("absent.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read tasks"));
}

#[cfg(feature = "sqlite")]
#[test]
fn stores_schedule_in_sqlite() {
    use schedule_forecast::{ScheduleStore, SqliteScheduleStore};

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tasks.csv", TASKS);
    let db = dir.path().join("schedule.db");

    cli_cmd()
        .arg("--input")
        .arg(&input)
        .arg("--sqlite")
        .arg(&db)
        .assert()
        .success();

    let report = SqliteScheduleStore::new(&db)
        .unwrap()
        .load_report()
        .unwrap()
        .unwrap();
    assert_eq!(report.tasks.len(), 4);
}
