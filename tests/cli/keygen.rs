//! Tests for `secrets-api keygen`.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_keygen_writes_base64_key() {
    let t = Test::new();

    let output = t.keygen("app.key");
    assert_success(&output);
    assert_stdout_contains(&output, "wrote key");

    let contents = fs::read_to_string(t.path("app.key")).unwrap();
    // base64 of 32 bytes
    assert_eq!(contents.trim().len(), 44);
}

#[test]
fn test_keygen_refuses_overwrite() {
    let t = Test::new();
    assert_success(&t.keygen("app.key"));
    let first = fs::read_to_string(t.path("app.key")).unwrap();

    let output = t.keygen("app.key");
    assert_failure(&output);
    assert_stderr_contains(&output, "--force");
    assert_eq!(fs::read_to_string(t.path("app.key")).unwrap(), first);

    assert_success(&t.keygen_force("app.key"));
    assert_ne!(fs::read_to_string(t.path("app.key")).unwrap(), first);
}

#[test]
fn test_keygen_creates_parent_directories() {
    let t = Test::new();
    assert_success(&t.keygen("keys/nested/alpha"));
    assert!(t.path("keys/nested/alpha").is_file());
}

#[cfg(unix)]
#[test]
fn test_keygen_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::new();
    assert_success(&t.keygen("app.key"));
    let mode = fs::metadata(t.path("app.key")).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn test_keygen_requires_path() {
    #[allow(deprecated)]
    Command::cargo_bin("secrets-api")
        .unwrap()
        .arg("keygen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH"));
}
