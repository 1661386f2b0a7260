//! Deletion command handlers: `delete`, `ds-store`, and `config-dir`.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, ndjson_line, pretty_json};
use crate::{CliOutput, format_error_output, infra_exit_code};
use std::path::PathBuf;
use tombstone_facade::{
    DeleteSelectionOutput, InfraError, LocalOptions, LocalRunReport, SelectionKind,
    SelectionStatus, error_to_dto, run_config_dir_local, run_delete_local, run_ds_store_local,
};

/// Run the delete command.
pub fn run_delete(
    mode: OutputMode,
    options: &LocalOptions,
    paths: &[PathBuf],
) -> Result<CliOutput, CliError> {
    format_run(mode, "delete", run_delete_local(options, paths))
}

/// Run the `.DS_Store` cleanup command.
pub fn run_ds_store(mode: OutputMode, options: &LocalOptions) -> Result<CliOutput, CliError> {
    format_run(mode, "dsStore", run_ds_store_local(options))
}

/// Run a config-directory deletion command.
pub fn run_config_dir(
    mode: OutputMode,
    options: &LocalOptions,
    kind: SelectionKind,
    picks: Vec<PathBuf>,
) -> Result<CliOutput, CliError> {
    format_run(mode, "configDir", run_config_dir_local(options, kind, picks))
}

fn format_run(
    mode: OutputMode,
    kind: &str,
    result: Result<LocalRunReport, InfraError>,
) -> Result<CliOutput, CliError> {
    match result {
        Ok(report) => format_report(mode, kind, &report),
        Err(error) => Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    }
}

fn format_report(
    mode: OutputMode,
    kind: &str,
    report: &LocalRunReport,
) -> Result<CliOutput, CliError> {
    let status = status_label(kind, report);
    let stdout = if mode.is_ndjson() {
        format_report_ndjson(kind, status, report)?
    } else if mode.is_json() {
        pretty_json(&report_json(kind, status, report))?
    } else {
        format_report_text(status, report)
    };

    let mut stderr = String::new();
    if !mode.quiet {
        for notice in &report.notices {
            stderr.push_str("notice: ");
            stderr.push_str(notice);
            stderr.push('\n');
        }
    }

    let exit_code = match report.selection.as_ref().map(|selection| selection.status) {
        Some(SelectionStatus::CompletedWithFailures) => ExitCode::InvalidInput,
        _ => ExitCode::Ok,
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code,
    })
}

fn status_label(kind: &str, report: &LocalRunReport) -> &'static str {
    match (&report.selection, kind) {
        (Some(selection), _) => selection.status.as_str(),
        (None, "dsStore") => "noMatches",
        (None, _) => "dismissed",
    }
}

fn report_json(kind: &str, status: &str, report: &LocalRunReport) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "kind": kind,
        "vaultRoot": report.vault_root.to_string_lossy(),
        "collaborator": report.collaborator.as_str(),
        "command": report.command,
        "matched": report.matched,
        "selection": report.selection.as_ref().map(selection_json),
        "notices": report.notices,
    })
}

fn selection_json(selection: &DeleteSelectionOutput) -> serde_json::Value {
    let deleted: Vec<&str> = selection.deleted.iter().map(|key| key.as_str()).collect();
    let skipped: Vec<String> = selection
        .skipped
        .iter()
        .map(|path| path.to_string_lossy().to_string())
        .collect();
    serde_json::json!({
        "deleted": deleted,
        "tombstonesWritten": selection.tombstones_written(),
        "alreadyAbsent": selection.already_absent,
        "failures": selection.failures.iter().map(|failure| serde_json::json!({
            "path": failure.path.to_string_lossy(),
            "error": error_to_dto(&failure.error),
        })).collect::<Vec<_>>(),
        "skipped": skipped,
        "syncTriggered": selection.sync_triggered,
    })
}

fn format_report_ndjson(
    kind: &str,
    status: &str,
    report: &LocalRunReport,
) -> Result<String, CliError> {
    let mut out = String::new();
    if let Some(selection) = report.selection.as_ref() {
        for key in &selection.deleted {
            out.push_str(&ndjson_line(&serde_json::json!({
                "type": "deleted",
                "key": key.as_str(),
            }))?);
        }
        for failure in &selection.failures {
            out.push_str(&ndjson_line(&serde_json::json!({
                "type": "failure",
                "path": failure.path.to_string_lossy(),
                "error": error_to_dto(&failure.error),
            }))?);
        }
    }

    out.push_str(&ndjson_line(&serde_json::json!({
        "type": "summary",
        "status": status,
        "kind": kind,
        "collaborator": report.collaborator.as_str(),
        "matched": report.matched,
        "deleted": report.selection.as_ref().map(|selection| selection.deleted.len()),
        "failed": report.selection.as_ref().map(|selection| selection.failures.len()),
        "syncTriggered": report
            .selection
            .as_ref()
            .is_some_and(|selection| selection.sync_triggered),
    }))?);
    Ok(out)
}

fn format_report_text(status: &str, report: &LocalRunReport) -> String {
    let mut out = format!(
        "status: {status}\nvaultRoot: {}\ncollaborator: {}\n",
        report.vault_root.to_string_lossy(),
        report.collaborator.as_str(),
    );
    if let Some(command) = report.command {
        out.push_str(&format!("command: {}\n", command.id));
    }
    if let Some(matched) = report.matched {
        out.push_str(&format!("matched: {matched}\n"));
    }

    let Some(selection) = report.selection.as_ref() else {
        return out;
    };
    out.push_str(&format!(
        "deleted: {}\nalreadyAbsent: {}\nfailed: {}\nsyncTriggered: {}\n",
        selection.deleted.len(),
        selection.already_absent,
        selection.failures.len(),
        selection.sync_triggered,
    ));
    for key in &selection.deleted {
        out.push_str(&format!("  - {key}\n"));
    }
    for failure in &selection.failures {
        out.push_str(&format!(
            "  ! {}: {} ({})\n",
            failure.path.to_string_lossy(),
            failure.error.message,
            failure.error.code,
        ));
    }
    for path in &selection.skipped {
        out.push_str(&format!("  ~ {} (kept)\n", path.to_string_lossy()));
    }
    out
}
