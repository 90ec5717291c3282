//! Corruption recovery tests for the fitquest binary.
//!
//! These tests verify the system can handle:
//! - Corrupted JSON documents
//! - Corrupted workout history lines
//! - Missing data directories

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("config.toml"), "").unwrap();
    dir
}

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitquest"));
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

#[test]
fn test_corrupted_xp_profile() {
    let temp_dir = setup_test_dir();
    fs::write(
        temp_dir.path().join("data/xp_profile.json"),
        "{ invalid json }}}}",
    )
    .unwrap();

    cli(temp_dir.path())
        .args(["xp", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 1 (Rookie), 0 XP"));

    // Logging a workout replaces the corrupted document
    cli(temp_dir.path())
        .args(["workout", "log", "pull_up:5"])
        .assert()
        .success();

    let profile: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("data/xp_profile.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(profile["total_xp"], 150);
}

#[test]
fn test_corrupted_goals_and_timer_config() {
    let temp_dir = setup_test_dir();
    fs::write(temp_dir.path().join("data/body_part_goals.json"), "[{").unwrap();
    fs::write(temp_dir.path().join("data/rest_timer_config.json"), "42").unwrap();

    cli(temp_dir.path())
        .args(["goal", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No goals."));

    cli(temp_dir.path())
        .args(["timer", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default rest: 90s"));
}

#[test]
fn test_corrupted_history_lines_ignored() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["workout", "log", "back_squat:5x100@8"])
        .assert()
        .success();

    {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(temp_dir.path().join("data/workout_history.jsonl"))
            .unwrap();
        writeln!(file, "{{ half a workout").unwrap();
    }

    cli(temp_dir.path())
        .args(["workout", "log", "back_squat:5x100@9"])
        .assert()
        .success();

    cli(temp_dir.path())
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workouts logged: 2"));
}

#[test]
fn test_missing_data_dir_is_created() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("config.toml"), "").unwrap();
    let data_dir = temp_dir.path().join("fresh/nested");

    Command::new(assert_cmd::cargo::cargo_bin!("fitquest"))
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(temp_dir.path().join("config.toml"))
        .args(["nutrition", "water", "250"])
        .assert()
        .success();

    assert!(data_dir.join("daily_logs.json").exists());
}
