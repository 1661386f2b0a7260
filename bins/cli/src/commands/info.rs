//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, ndjson_line, pretty_json};
use tombstone_facade::{ConfigDirCommand, PlatformCapabilities, facade_crate_version};

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let platform = PlatformCapabilities::detect();
    let commands = platform.config_dir_commands();
    let os = serde_json::to_value(platform.os())?;
    let os_label = os.as_str().unwrap_or("other").to_string();

    let stdout = if mode.is_ndjson() {
        ndjson_line(&serde_json::json!({
            "type": "summary",
            "status": "ok",
            "kind": "info",
            "build": build_json(),
            "os": os,
            "commands": commands,
        }))?
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "build": build_json(),
            "os": os,
            "commands": commands,
        }))?
    } else {
        format_info_text(&os_label, &commands)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn build_json() -> serde_json::Value {
    serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "facadeVersion": facade_crate_version(),
    })
}

fn format_info_text(os: &str, commands: &[ConfigDirCommand]) -> String {
    let mut out = format!(
        "status: ok\nname: {}\nversion: {}\nfacade: {}\nos: {os}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        facade_crate_version(),
    );
    out.push_str("commands:\n");
    for command in commands {
        out.push_str("  ");
        out.push_str(command.id);
        out.push_str(" (");
        out.push_str(command.name);
        out.push_str(")\n");
    }
    out
}
