//! Fast CLI tests: argument parsing only, no container runtime needed.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_required_flags() {
    Command::cargo_bin("depc")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--project"))
        .stdout(predicate::str::contains("--basedir"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_missing_required_args_fails() {
    Command::cargo_bin("depc")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_unknown_project_rejected() {
    Command::cargo_bin("depc")
        .unwrap()
        .args(["--project", "warp", "--basedir", "/tmp", "--json", "/tmp/x.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
