//! Status command handler.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, ndjson_line, pretty_json};
use crate::{CliOutput, format_error_output, infra_exit_code};
use tombstone_facade::{CliStatus, HistoryStoreStatus, LocalOptions, read_status_local};

/// Run the status command.
pub fn run_status(mode: OutputMode, options: &LocalOptions) -> Result<CliOutput, CliError> {
    match read_status_local(options) {
        Ok(status) => format_status_output(mode, &status),
        Err(error) => Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    }
}

fn format_status_output(mode: OutputMode, status: &CliStatus) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_ndjson() {
        let mut payload = status_json(status)?;
        if let Some(map) = payload.as_object_mut() {
            map.insert("type".to_string(), "summary".into());
        }
        ndjson_line(&payload)?
    } else if mode.is_json() {
        pretty_json(&status_json(status)?)?
    } else {
        format_status_text(status)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn status_json(status: &CliStatus) -> Result<serde_json::Value, CliError> {
    Ok(serde_json::json!({
        "status": "ok",
        "vaultRoot": status.vault_root.to_string_lossy(),
        "configDir": status.config_dir.to_string_lossy(),
        "os": serde_json::to_value(status.os)?,
        "commands": status.commands,
        "collaborator": {
            "state": status.collaborator.as_str(),
            "pluginDir": status.plugin_dir.to_string_lossy(),
            "sessionId": status.session_id,
            "trigger": status.trigger.as_str(),
            "commandId": status.command_id,
        },
        "onItemFailure": status.on_item_failure.as_str(),
        "history": history_json(&status.history),
    }))
}

fn history_json(history: &HistoryStoreStatus) -> serde_json::Value {
    serde_json::json!({
        "path": history.path.to_string_lossy(),
        "exists": history.exists,
        "updatedAtMs": history.updated_at_ms,
        "entryCount": history.entry_count,
        "sessionEntryCount": history.session_entry_count,
    })
}

fn format_status_text(status: &CliStatus) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    push_line(&mut out, "vaultRoot", &status.vault_root.to_string_lossy());
    push_line(&mut out, "configDir", &status.config_dir.to_string_lossy());
    push_line(&mut out, "collaborator", status.collaborator.as_str());
    push_line(&mut out, "pluginDir", &status.plugin_dir.to_string_lossy());
    push_line(
        &mut out,
        "sessionId",
        status.session_id.as_deref().unwrap_or("none"),
    );
    push_line(&mut out, "trigger", status.trigger.as_str());
    push_line(&mut out, "commandId", &status.command_id);
    push_line(&mut out, "onItemFailure", status.on_item_failure.as_str());

    let history = &status.history;
    push_line(&mut out, "history", &history.path.to_string_lossy());
    push_line(
        &mut out,
        "historyEntries",
        &optional_count(history.entry_count),
    );
    push_line(
        &mut out,
        "historySessionEntries",
        &optional_count(history.session_entry_count),
    );
    for command in &status.commands {
        push_line(&mut out, "command", command.id);
    }
    out
}

fn optional_count(value: Option<usize>) -> String {
    value.map_or_else(|| "none".to_string(), |count| count.to_string())
}

fn push_line(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}
