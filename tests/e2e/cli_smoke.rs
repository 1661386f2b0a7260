//! CLI smoke tests: build info, schema export, and config validation.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tomb"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("TOMB_") {
            command.env_remove(key);
        }
    }
    command.output()
}

fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../crates/testkit/fixtures")
        .join(relative)
}

fn stdout_json(output: &Output) -> io::Result<serde_json::Value> {
    serde_json::from_slice(&output.stdout).map_err(io::Error::other)
}

#[test]
fn info_output_is_deterministic() -> io::Result<()> {
    let first = run_cli(&["info", "--output", "json"])?;
    let second = run_cli(&["info", "--output", "json"])?;

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout, "info output should be deterministic");

    let value = stdout_json(&first)?;
    let commands = value
        .get("commands")
        .and_then(|value| value.as_array())
        .ok_or_else(|| io::Error::other("missing commands"))?;
    assert!(!commands.is_empty());
    Ok(())
}

#[test]
fn schema_describes_config_sections() -> io::Result<()> {
    let output = run_cli(&["config", "schema"])?;
    assert!(output.status.success());

    let value = stdout_json(&output)?;
    let properties = value
        .get("properties")
        .and_then(|value| value.as_object())
        .ok_or_else(|| io::Error::other("missing properties"))?;
    for key in ["version", "vault", "sync", "deletion"] {
        assert!(properties.contains_key(key), "missing {key}");
    }
    Ok(())
}

#[test]
fn valid_fixture_passes_validation() -> io::Result<()> {
    let path = fixture_path("config/tombstone-config.valid.json");
    let path = path.to_string_lossy();
    let output = run_cli(&["config", "check", "--path", &path, "--output", "json"])?;
    assert!(output.status.success());

    let value = stdout_json(&output)?;
    let session = value
        .get("effectiveConfig")
        .and_then(|value| value.get("sync"))
        .and_then(|value| value.get("sessionId"))
        .and_then(|value| value.as_str());
    assert_eq!(session, Some("9f3c2a71-vault"));
    Ok(())
}

#[test]
fn invalid_fixture_exits_with_invalid_input() -> io::Result<()> {
    let path = fixture_path("config/tombstone-config.invalid.json");
    let path = path.to_string_lossy();
    let output = run_cli(&["config", "validate", "--path", &path, "--agent"])?;
    assert_eq!(output.status.code(), Some(2));

    let value = stdout_json(&output)?;
    assert_eq!(value.get("type").and_then(|value| value.as_str()), Some("error"));
    let code = value
        .get("error")
        .and_then(|value| value.get("code"))
        .and_then(|value| value.as_str())
        .ok_or_else(|| io::Error::other("missing error code"))?;
    assert_eq!(code, "ERR_CONFIG_INVALID_SESSION_ID");
    Ok(())
}

#[test]
fn env_overrides_reach_config_show() -> io::Result<()> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tomb"));
    command
        .args(["config", "show", "--output", "json"])
        .env("TOMB_SYNC_TRIGGER", "none")
        .env("TOMB_CONFIG_DIR", ".vault-config");
    let output = command.output()?;
    assert!(output.status.success());

    let value = stdout_json(&output)?;
    let config = value
        .get("effectiveConfig")
        .ok_or_else(|| io::Error::other("missing effectiveConfig"))?;
    assert_eq!(
        config.pointer("/sync/trigger").and_then(|value| value.as_str()),
        Some("disabled")
    );
    assert_eq!(
        config.pointer("/vault/configDir").and_then(|value| value.as_str()),
        Some(".vault-config")
    );
    Ok(())
}
