//! CLI tests for the `um` binary
//!
//! Only failure paths that stop before any database connection are covered.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn um() -> Command {
    Command::cargo_bin("um").expect("binary should build")
}

#[test]
fn test_missing_default_config_exits_nonzero() {
    let temp = TempDir::new().unwrap();

    um().current_dir(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config.json").and(predicate::str::contains("not found")));
}

#[test]
fn test_malformed_config_exits_nonzero() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{\"source\": ").unwrap();

    um().arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_missing_key_names_the_key_and_stage() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(
        &path,
        r#"{"source": {"host": "h", "user": "u", "password": "p", "database": "d"}, "table": "users"}"#,
    )
    .unwrap();

    um().current_dir(temp.path())
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("'destination'")
                .and(predicate::str::contains("after stage 'config-loaded'"))
                .and(predicate::str::contains("Connecting to").not()),
        );
}

#[test]
fn test_help_lists_config_argument() {
    um().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"));
}
