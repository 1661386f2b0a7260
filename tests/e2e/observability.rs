//! Structured logging and telemetry on stderr.

use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_vault() -> io::Result<PathBuf> {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("tomb-e2e-observability-{unique}"));
    std::fs::create_dir_all(dir.join(".obsidian/plugins/remotely-save"))?;
    Ok(dir)
}

#[test]
fn json_logs_and_metrics_share_correlation_id() -> io::Result<()> {
    let vault = temp_vault()?;
    std::fs::write(vault.join("note.md"), "x")?;

    let output = Command::new(env!("CARGO_BIN_EXE_tomb"))
        .args(["delete", "--quiet", "note.md"])
        .current_dir(&vault)
        .env("TOMB_LOG_FORMAT", "json")
        .env("TOMB_LOG_LEVEL", "debug")
        .env("TOMB_SESSION_ID", "obs-session")
        .env("TOMB_SYNC_TRIGGER", "disabled")
        .output()?;
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()
        .map_err(io::Error::other)?;

    let resolved = lines
        .iter()
        .find(|line| line.get("event").and_then(|v| v.as_str()) == Some("collaborator.resolved"))
        .ok_or_else(|| io::Error::other("missing collaborator.resolved event"))?;
    let correlation = resolved
        .pointer("/fields/correlationId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| io::Error::other("missing correlation id"))?;
    assert!(!correlation.is_empty());

    let has_metric = lines
        .iter()
        .any(|line| line.get("type").and_then(|v| v.as_str()) == Some("metric"));
    assert!(has_metric, "expected telemetry lines");

    std::fs::remove_dir_all(&vault)?;
    Ok(())
}
