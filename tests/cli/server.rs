//! Tests for `secrets-api server` startup failures.
//!
//! Successful startup blocks until interrupted, so only the failure paths
//! are exercised here; the router itself is covered by the api tests.

use std::fs;

use crate::support::*;

#[test]
fn test_invalid_listen_address() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["server", "--listen-address", "not-an-address"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "server.listen_address");
}

#[test]
fn test_vault_url_without_token() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["server", "--vault-url", "http://127.0.0.1:1"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "vault.token");
}

#[test]
fn test_bad_key_file() {
    let t = Test::new();
    fs::write(t.path("bad.key"), "too short").unwrap();

    let output = t
        .cmd()
        .args(["server", "--enc-key-path", "bad.key"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid key file");
    assert_stderr_contains(&output, "keygen");
}

#[test]
fn test_env_overrides_are_read() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("VAULT_ADDR", "http://127.0.0.1:1")
        .arg("server")
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "vault.token");
}

#[test]
fn test_unknown_config_field() {
    let t = Test::new();
    fs::write(t.path("config.toml"), "[vault]\naddress = \"x\"\n").unwrap();

    let output = t
        .cmd()
        .args(["--config", "config.toml", "server"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse config file");
}
