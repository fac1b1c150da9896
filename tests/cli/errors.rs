//! Tests for error handling and CLI flags.

use crate::support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("server"));
    assert!(out.contains("keygen"));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("unknown-command").output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_missing_config_file_fails() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["--config", "nope.toml", "server"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to read config file");
}
