//! End-to-end runs of the `bidding-ab` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Ten campaigns per group; the test group buys 30 more on every row.
fn write_csv(dir: &Path) -> PathBuf {
    let mut text = String::from("Group,Impression,Click,Purchase,Earning\n");
    for (label, base) in [("Control", 10.0), ("Test", 40.0)] {
        for i in 0..10 {
            let purchase = base + i as f64;
            let click = purchase * 5.0;
            let impression = click * 20.0;
            let earning = purchase * 10.0 + 0.5;
            text.push_str(&format!(
                "{label},{impression},{click},{purchase},{earning}\n"
            ));
        }
    }
    let path = dir.join("ab_testing.csv");
    fs::write(&path, text).unwrap();
    path
}

/// Runs in `dir` with user-level configuration pointed away from the real home.
fn bidding_ab(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bidding-ab").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("BIDDING_AB_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    bidding_ab(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("normality"))
        .stdout(predicate::str::contains("variance"));
}

#[test]
fn test_analyze_selects_student_t_and_rejects() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path());

    bidding_ab(&dir)
        .args(["analyze", csv.to_str().unwrap(), "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"selection\""))
        .stdout(predicate::str::contains("\"student_t\""))
        .stdout(predicate::str::contains("\"reject_null\""));
}

#[test]
fn test_analyze_all_metrics_compact() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path());

    let output = bidding_ab(&dir)
        .args(["analyze", csv.to_str().unwrap(), "--all-metrics", "-o", "compact"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Impression\t"));
    assert!(lines[3].starts_with("Earning\t"));
}

#[test]
fn test_normality_reports_both_groups() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path());

    bidding_ab(&dir)
        .args(["normality", csv.to_str().unwrap(), "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"control\""))
        .stdout(predicate::str::contains("\"test\""))
        .stdout(predicate::str::contains("\"w\""));
}

#[test]
fn test_variance_with_mean_center() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path());

    bidding_ab(&dir)
        .args(["variance", csv.to_str().unwrap(), "--center", "mean", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"center\": \"mean\""))
        .stdout(predicate::str::contains("\"homogeneous\": true"));
}

#[test]
fn test_compare_runs_requested_test() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path());

    bidding_ab(&dir)
        .args([
            "compare",
            csv.to_str().unwrap(),
            "--test",
            "mann-whitney",
            "-o",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mann_whitney_u\""));
}

#[test]
fn test_unsupported_extension_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ab_testing.json");
    fs::write(&path, "{}").unwrap();

    bidding_ab(&dir)
        .args(["analyze", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported input format"));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    bidding_ab(&dir)
        .args(["describe", "nowhere.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_alpha_is_rejected() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path());

    bidding_ab(&dir)
        .args(["analyze", csv.to_str().unwrap(), "--alpha", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_local_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("bidding-ab.toml"),
        "[analysis]\nmetric = \"earning\"\n",
    )
    .unwrap();

    bidding_ab(&dir)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"metric\": \"earning\""));
}

#[test]
fn test_environment_overrides_files() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("bidding-ab.toml"),
        "[analysis]\nalpha = 0.1\n",
    )
    .unwrap();

    bidding_ab(&dir)
        .env("BIDDING_AB__ANALYSIS__ALPHA", "0.01")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha = 0.01"));
}
