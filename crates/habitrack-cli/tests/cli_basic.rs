//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify the JSON it prints.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_habitrack"))
        .args(args)
        .env("HABITRACK_DATA_DIR", data_dir)
        .env("HABITRACK_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Run a CLI command, expect success and parse its JSON output.
fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn create_habit(data_dir: &Path, extra: &[&str]) -> String {
    let mut args = vec!["habit", "create", "Walk", "--start", "2024-01-01"];
    args.extend_from_slice(extra);
    let habit = run_json(data_dir, &args);
    habit["id"].as_str().unwrap().to_string()
}

#[test]
fn test_habit_create_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let id = create_habit(dir.path(), &["--every", "2", "--intensity", "3"]);

    let habits = run_json(dir.path(), &["habit", "list"]);
    let habits = habits.as_array().unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0]["id"], id.as_str());
    assert_eq!(habits[0]["intensity"], 3);
    assert_eq!(habits[0]["patterns"][0]["cadence"]["kind"], "days_interval");
}

#[test]
fn test_done_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let id = create_habit(dir.path(), &["--every", "2"]);

    for day in ["2024-01-01", "2024-01-03", "2024-01-05"] {
        run_json(dir.path(), &["done", &id, "--date", day]);
    }
    run_json(dir.path(), &["done", &id, "--date", "2024-01-07", "--missed"]);

    let status = run_json(dir.path(), &["habit", "status", &id, "--date", "2024-01-07"]);
    assert_eq!(status["active"], true);
    assert_eq!(status["completed"], false);
    assert_eq!(status["streak"], 3);

    let off_day = run_json(dir.path(), &["habit", "status", &id, "--date", "2024-01-02"]);
    assert_eq!(off_day["active"], false);

    let undo = run_json(dir.path(), &["undo", &id, "--date", "2024-01-05"]);
    assert_eq!(undo["cleared"], true);
    let status = run_json(dir.path(), &["habit", "status", &id, "--date", "2024-01-05"]);
    assert_eq!(status["completed"], false);
}

#[test]
fn test_weekly_stats_for_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let series = run_json(
        dir.path(),
        &["stats", "weekly", "--from", "2024-01-01", "--to", "2024-01-07"],
    );
    let points = series["points"].as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert!(points.iter().all(|p| p["value"] == 0.0));
    assert_eq!(points[0]["label"], "Mon");
}

#[test]
fn test_categories_are_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let categories = run_json(dir.path(), &["category", "list"]);
    assert!(!categories.as_array().unwrap().is_empty());
}

#[test]
fn test_list_delete_detaches_habits() {
    let dir = tempfile::tempdir().unwrap();
    let list = run_json(dir.path(), &["list", "create", "Mornings"]);
    let list_id = list["id"].as_str().unwrap();
    let habit_id = create_habit(dir.path(), &["--list", list_id]);

    let deleted = run_json(dir.path(), &["list", "delete", list_id]);
    assert_eq!(deleted["detached_habits"], 1);

    let habit = run_json(dir.path(), &["habit", "get", &habit_id]);
    assert!(habit["list_id"].is_null());
}

#[test]
fn test_unknown_list_or_category_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        dir.path(),
        &["habit", "create", "Walk", "--list", "no-such-list"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("list not found"));

    let id = create_habit(dir.path(), &[]);
    let (code, _, stderr) = run_cli(
        dir.path(),
        &["habit", "update", &id, "--category", "no-such-category"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("category not found"));

    let habits = run_json(dir.path(), &["habit", "list"]);
    assert_eq!(habits.as_array().unwrap().len(), 1);
    assert!(habits[0]["category_id"].is_null());
}

#[test]
fn test_rates_by_list_use_list_names() {
    let dir = tempfile::tempdir().unwrap();
    let list = run_json(dir.path(), &["list", "create", "Mornings"]);
    let list_id = list["id"].as_str().unwrap();
    create_habit(dir.path(), &["--list", list_id]);

    let rates = run_json(
        dir.path(),
        &["stats", "rates", "--by", "list", "--from", "2024-01-01", "--to", "2024-01-07"],
    );
    let group = rates
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["key"] == list_id)
        .unwrap();
    assert_eq!(group["label"], "Mornings");
    assert_eq!(group["active_days"], 7);
}

#[test]
fn test_month_grid() {
    let dir = tempfile::tempdir().unwrap();
    create_habit(dir.path(), &["--weekdays", "mon,thu"]);

    let rows = run_json(dir.path(), &["stats", "month", "--month", "2024-02-10"]);
    let days = rows[0]["days"].as_array().unwrap();
    assert_eq!(days.len(), 29);
    // 2024-02-01 is a Thursday.
    assert_eq!(days[0]["active"], true);
    assert_eq!(days[1]["active"], false);
}

#[test]
fn test_config_get_and_set() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "analytics.week_start"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "monday");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "analytics.week_start", "sunday"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "analytics.week_start"]);
    assert_eq!(stdout.trim(), "sunday");

    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "analytics.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_unknown_habit_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["done", "missing-id"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("habit not found"));
}

#[test]
fn test_zero_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        dir.path(),
        &["habit", "create", "Bad", "--every", "0"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("every"));
}

#[test]
fn test_completions_leave_data_dir_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("fresh");
    let output = Command::new(env!("CARGO_BIN_EXE_habitrack"))
        .args(["completions", "zsh"])
        .env("HABITRACK_DATA_DIR", &data_dir)
        .env_remove("HABITRACK_LOG")
        .output()
        .expect("Failed to execute CLI command");

    assert!(output.status.success());
    assert!(!data_dir.exists());
}

#[test]
fn test_completions_print_script() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("habitrack"));
}
