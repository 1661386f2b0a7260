//! End-to-end deletion flows against temporary vaults.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const SESSION_OVERRIDES: &str = r#"{"sync":{"sessionId":"e2e-session"}}"#;

fn temp_vault(label: &str) -> io::Result<PathBuf> {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("tomb-e2e-{label}-{unique}"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn install_plugin(vault: &Path) -> io::Result<PathBuf> {
    let plugin_dir = vault.join(".obsidian/plugins/remotely-save");
    std::fs::create_dir_all(&plugin_dir)?;
    Ok(plugin_dir)
}

fn run_in_vault(vault: &Path, args: &[&str]) -> io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tomb"));
    command.args(args).current_dir(vault);
    for (key, _) in std::env::vars() {
        if key.starts_with("TOMB_") {
            command.env_remove(key);
        }
    }
    command.output()
}

fn stdout_json(output: &Output) -> io::Result<serde_json::Value> {
    serde_json::from_slice(&output.stdout).map_err(io::Error::other)
}

#[test]
fn delete_folder_writes_children_before_parent() -> io::Result<()> {
    let vault = temp_vault("delete")?;
    let plugin_dir = install_plugin(&vault)?;
    std::fs::create_dir_all(vault.join("archive/2023"))?;
    std::fs::write(vault.join("archive/2023/jan.md"), "jan")?;
    std::fs::write(vault.join("archive/index.md"), "index")?;

    let output = run_in_vault(
        &vault,
        &[
            "delete",
            "--output",
            "json",
            "--overrides-json",
            SESSION_OVERRIDES,
            "archive",
        ],
    )?;
    assert!(output.status.success());

    let value = stdout_json(&output)?;
    assert_eq!(value.get("status").and_then(|v| v.as_str()), Some("completed"));
    let deleted: Vec<&str> = value
        .pointer("/selection/deleted")
        .and_then(|value| value.as_array())
        .ok_or_else(|| io::Error::other("missing deleted keys"))?
        .iter()
        .filter_map(|value| value.as_str())
        .collect();
    assert_eq!(
        deleted,
        ["archive/2023/jan.md", "archive/2023/", "archive/index.md", "archive/"]
    );
    assert_eq!(
        value.pointer("/selection/syncTriggered").and_then(|v| v.as_bool()),
        Some(true)
    );
    assert!(!vault.join("archive").exists());
    assert!(plugin_dir.join("sync-request.json").is_file());

    let history: serde_json::Value =
        serde_json::from_slice(&std::fs::read(plugin_dir.join("file-history.json"))?)
            .map_err(io::Error::other)?;
    let entries = history
        .as_object()
        .ok_or_else(|| io::Error::other("history is not an object"))?;
    assert_eq!(entries.len(), 4);
    assert!(entries.contains_key("e2e-session\tarchive/2023/"));

    std::fs::remove_dir_all(&vault)?;
    Ok(())
}

#[test]
fn missing_collaborator_leaves_vault_untouched() -> io::Result<()> {
    let vault = temp_vault("no-plugin")?;
    std::fs::write(vault.join("note.md"), "keep")?;

    let output = run_in_vault(
        &vault,
        &["delete", "--overrides-json", SESSION_OVERRIDES, "note.md"],
    )?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("status: collaboratorMissing"));
    assert!(stdout.contains("collaborator: pluginMissing"));
    assert!(vault.join("note.md").is_file());

    std::fs::remove_dir_all(&vault)?;
    Ok(())
}

#[test]
fn ds_store_cleanup_reports_notice() -> io::Result<()> {
    let vault = temp_vault("ds-store")?;
    install_plugin(&vault)?;
    std::fs::create_dir_all(vault.join("notes"))?;
    std::fs::write(vault.join("notes/.DS_Store"), "x")?;

    let output = run_in_vault(
        &vault,
        &[
            "ds-store",
            "--overrides-json",
            r#"{"sync":{"sessionId":"e2e-session","trigger":"disabled"}}"#,
        ],
    )?;
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("notice: 1 .DS_Store file deleted in vault."));
    assert!(!vault.join("notes/.DS_Store").exists());

    let empty = run_in_vault(
        &vault,
        &["ds-store", "--overrides-json", SESSION_OVERRIDES],
    )?;
    assert!(empty.status.success());
    let stdout = String::from_utf8_lossy(&empty.stdout);
    let stderr = String::from_utf8_lossy(&empty.stderr);
    assert!(stdout.contains("status: noMatches"));
    assert!(stderr.contains("notice: No .DS_Store files found in vault."));

    std::fs::remove_dir_all(&vault)?;
    Ok(())
}

#[test]
fn ndjson_delete_streams_keys_then_summary() -> io::Result<()> {
    let vault = temp_vault("ndjson")?;
    install_plugin(&vault)?;
    std::fs::write(vault.join("a.md"), "a")?;
    std::fs::write(vault.join("b.md"), "b")?;

    let output = run_in_vault(
        &vault,
        &[
            "delete",
            "--agent",
            "--overrides-json",
            r#"{"sync":{"sessionId":"e2e-session","trigger":"disabled"}}"#,
            "a.md",
            "b.md",
        ],
    )?;
    assert!(output.status.success());
    assert!(output.stderr.is_empty());

    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()
        .map_err(io::Error::other)?;
    let types: Vec<&str> = lines
        .iter()
        .filter_map(|line| line.get("type").and_then(|value| value.as_str()))
        .collect();
    assert_eq!(types, ["deleted", "deleted", "summary"]);

    std::fs::remove_dir_all(&vault)?;
    Ok(())
}

#[test]
fn status_reports_session_history() -> io::Result<()> {
    let vault = temp_vault("status")?;
    let plugin_dir = install_plugin(&vault)?;
    std::fs::write(
        plugin_dir.join("file-history.json"),
        r#"{"e2e-session\tgone.md":{"key":"gone.md","actionType":"delete"}}"#,
    )?;

    let output = run_in_vault(
        &vault,
        &["status", "--output", "json", "--overrides-json", SESSION_OVERRIDES],
    )?;
    assert!(output.status.success());
    let value = stdout_json(&output)?;
    assert_eq!(
        value.pointer("/collaborator/state").and_then(|v| v.as_str()),
        Some("ready")
    );
    assert_eq!(
        value.pointer("/history/sessionEntryCount").and_then(|v| v.as_u64()),
        Some(1)
    );

    std::fs::remove_dir_all(&vault)?;
    Ok(())
}

#[test]
fn missing_vault_root_exits_with_invalid_input() -> io::Result<()> {
    let vault = temp_vault("missing-root")?;
    let missing = vault.join("nope");
    let missing = missing.to_string_lossy();

    let output = run_in_vault(&vault, &["status", "--vault-root", &missing])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ERR_CORE_NOT_FOUND"));

    std::fs::remove_dir_all(&vault)?;
    Ok(())
}
