//! Binary-level integration tests of the CLI surface

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_runs_named_task() {
    let (_dir, config_path) = common::create_test_config(
        r#"
tasks:
  greet:
    run: echo "hello from tusk"
"#,
    );

    Command::cargo_bin("tusk")
        .unwrap()
        .arg("--file")
        .arg(&config_path)
        .arg("greet")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from tusk"));
}

#[test]
fn test_cli_propagates_command_exit_code() {
    let (_dir, config_path) = common::create_test_config(
        r#"
tasks:
  fail:
    run: exit 3
"#,
    );

    Command::cargo_bin("tusk")
        .unwrap()
        .arg("--file")
        .arg(&config_path)
        .arg("fail")
        .assert()
        .code(3);
}

#[test]
fn test_cli_rejects_unknown_task() {
    let (_dir, config_path) = common::create_test_config(
        r#"
tasks:
  greet:
    run: echo hi
"#,
    );

    Command::cargo_bin("tusk")
        .unwrap()
        .arg("--file")
        .arg(&config_path)
        .arg("does-not-exist")
        .assert()
        .failure();
}

#[test]
fn test_cli_no_task_prints_help() {
    let (_dir, config_path) = common::create_test_config(
        r#"
tasks:
  greet:
    run: echo hi
"#,
    );

    Command::cargo_bin("tusk")
        .unwrap()
        .arg("--file")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("greet"));
}
