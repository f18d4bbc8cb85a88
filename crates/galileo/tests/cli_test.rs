//! Integration tests for the `galileo` CLI binary.
//!
//! Argument parsing, help output, completions, and error exit codes. The
//! backend-bound cases run against a local wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/galileo/landing_zone/v1/oauth/token";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `galileo` binary with env isolation.
///
/// Clears every `GALILEO_*` variable and points HOME and the config
/// directory at `home` so tests never see a real profile or saved token.
fn galileo_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("galileo");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1");
    for var in [
        "GALILEO_PROFILE",
        "GALILEO_CONFIG",
        "GALILEO_TOKEN",
        "GALILEO_REFRESH_TOKEN",
        "GALILEO_USER",
        "GALILEO_PASSWORD",
        "GALILEO_OUTPUT",
        "GALILEO_INSECURE",
        "GALILEO_TIMEOUT",
        "GALILEO_UNIVERSE",
        "GALILEO_LZ_IPV4",
        "GALILEO_LZ_PORT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = galileo_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Galileo")
                .and(predicate::str::contains("stations"))
                .and(predicate::str::contains("missions"))
                .and(predicate::str::contains("jobs")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("galileo"));
}

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .arg("warp-drive")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_subcommand_help_lists_operations() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .args(["stations", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("invite")
                .and(predicate::str::contains("add-volume"))
                .and(predicate::str::contains("withdraw")),
        );

    galileo_cmd(home.path())
        .args(["jobs", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("top").and(predicate::str::contains("download")));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("galileo"));
}

// ── Local commands ──────────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_set_then_use() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .args(["-p", "lab", "config", "set", "backend", "development"])
        .assert()
        .success();
    galileo_cmd(home.path())
        .args(["-p", "lab", "config", "set", "password", "hunter2"])
        .assert()
        .success();

    galileo_cmd(home.path())
        .args(["config", "use", "lab"])
        .assert()
        .success();
    galileo_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab *"));
    galileo_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("backend = \"development\"")
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    let output = galileo_cmd(home.path())
        .args(["config", "use", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_logout_without_token() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .arg("logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("No saved token"));
}

#[test]
fn test_notify_requires_agent_address() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .args(["notify", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GALILEO_LZ_IPV4"));
}

// ── Error exit codes ────────────────────────────────────────────────

#[test]
fn test_missing_credentials_exit_code() {
    let home = tempfile::tempdir().unwrap();
    let output = galileo_cmd(home.path())
        .args(["universes", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("No credentials"));
}

#[test]
fn test_connection_refused_exit_code() {
    let home = tempfile::tempdir().unwrap();
    let output = galileo_cmd(home.path())
        .args([
            "--backend",
            "http://127.0.0.1:1",
            "-u",
            "ada",
            "--password",
            "pw",
            "--timeout",
            "5",
            "universes",
            "list",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    galileo_cmd(home.path())
        .args(["-o", "xml", "universes", "list"])
        .assert()
        .code(2);
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_universes_list_json() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/galileo/user_interface/v1/universe"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "universes": [
                {"id": "u-1", "name": "Alpha", "creation_timestamp": "2024-01-01"},
                {"id": "u-2", "name": "Beta"}
            ]
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        let home = tempfile::tempdir().unwrap();
        galileo_cmd(home.path())
            .args([
                "--backend", &uri, "-u", "ada", "--password", "pw", "-o", "json", "universes",
                "list",
            ])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["id"], "u-1");
    assert_eq!(parsed[1]["name"], "Beta");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_destructive_command_needs_yes() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        let home = tempfile::tempdir().unwrap();
        galileo_cmd(home.path())
            .args([
                "--backend", &uri, "-u", "ada", "--password", "pw", "stations", "delete", "st-1",
            ])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("--yes"));
}
