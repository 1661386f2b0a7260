//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::{run_config_dir, run_delete, run_ds_store, run_info, run_status};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode, ndjson_line, pretty_json};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tombstone_facade::{
    ErrorDto, ErrorDtoKind, InfraError, LocalOptions, OnItemFailure, SelectionKind,
    config_schema_json, error_to_dto, is_io_failure, load_effective_config_json,
    load_effective_config_toml,
};

#[derive(Debug, Parser)]
#[command(
    name = "tomb",
    version,
    about = "Delete vault files while recording sync tombstones",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build, platform, and command details.
    Info,
    /// Report vault, sync collaborator, and history store status.
    Status {
        #[command(flatten)]
        vault: VaultArgs,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Delete files or folders, writing a tombstone for every removed item.
    Delete {
        #[command(flatten)]
        vault: VaultArgs,
        /// Paths to delete (relative paths resolve against the working directory).
        #[arg(value_name = "PATHS", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete every `.DS_Store` file in the vault.
    DsStore {
        #[command(flatten)]
        vault: VaultArgs,
    },
    /// Delete entries of the vault config directory.
    ConfigDir {
        #[command(flatten)]
        vault: VaultArgs,
        /// Selection kind; availability depends on the platform.
        #[arg(value_enum)]
        kind: SelectionKindArg,
        /// Entries to delete (relative paths resolve against the config directory).
        #[arg(value_name = "PATHS", required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Validate config loading, merging, and normalization.
    Check {
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Show the effective config after applying overrides.
    Show {
        #[command(flatten)]
        source: ConfigSourceArgs,
        /// Render text output as TOML instead of JSON.
        #[arg(long)]
        toml: bool,
    },
    /// Validate config loading and overrides.
    Validate {
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Print the config file JSON Schema.
    Schema,
}

#[derive(Debug, Args)]
struct ConfigSourceArgs {
    /// Optional config file path (JSON/TOML).
    #[arg(long)]
    path: Option<PathBuf>,
    /// Optional JSON overrides (partial config).
    #[arg(long)]
    overrides_json: Option<String>,
}

#[derive(Debug, Args)]
struct VaultArgs {
    /// Optional config file path (JSON/TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Optional JSON overrides (partial config).
    #[arg(long)]
    overrides_json: Option<String>,
    /// Vault root (defaults to the configured root, then the current directory).
    #[arg(long)]
    vault_root: Option<PathBuf>,
    /// What to do after an item fails.
    #[arg(long, value_enum)]
    on_item_failure: Option<FailurePolicyArg>,
}

impl VaultArgs {
    fn to_options(&self) -> LocalOptions {
        LocalOptions {
            config_path: self.config.clone(),
            overrides_json: self.overrides_json.clone(),
            vault_root: self.vault_root.clone(),
            on_item_failure: self.on_item_failure.map(OnItemFailure::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FailurePolicyArg {
    Abort,
    Continue,
}

impl From<FailurePolicyArg> for OnItemFailure {
    fn from(value: FailurePolicyArg) -> Self {
        match value {
            FailurePolicyArg::Abort => Self::Abort,
            FailurePolicyArg::Continue => Self::Continue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SelectionKindArg {
    Files,
    Folders,
    Mixed,
}

impl From<SelectionKindArg> for SelectionKind {
    fn from(value: SelectionKindArg) -> Self {
        match value {
            SelectionKindArg::Files => Self::Files,
            SelectionKindArg::Folders => Self::Folders,
            SelectionKindArg::Mixed => Self::Mixed,
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => run_info(mode),
        Commands::Status { vault } => run_status(mode, &vault.to_options()),
        Commands::Config { command } => {
            let env = collect_scoped_env("TOMB_");
            match command {
                ConfigCommands::Check { source } => config_check(mode, &env, source),
                ConfigCommands::Show { source, toml } => config_show(mode, &env, source, *toml),
                ConfigCommands::Validate { source } => config_validate(mode, &env, source),
                ConfigCommands::Schema => config_schema(mode),
            }
        },
        Commands::Delete { vault, paths } => run_delete(mode, &vault.to_options(), paths),
        Commands::DsStore { vault } => run_ds_store(mode, &vault.to_options()),
        Commands::ConfigDir { vault, kind, paths } => {
            run_config_dir(mode, &vault.to_options(), (*kind).into(), paths.clone())
        },
    }
}

fn config_check(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    source: &ConfigSourceArgs,
) -> Result<CliOutput, CliError> {
    let path = source.path.as_deref();
    let config_json =
        match load_effective_config_json(env, path, source.overrides_json.as_deref()) {
            Ok(config) => config,
            Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
        };

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.quiet);

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config")
    } else if mode.is_json() {
        let config_value: serde_json::Value = serde_json::from_str(config_json.trim())?;
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": path_label(path),
            "effectiveConfig": config_value,
        }))?
    } else {
        path.map_or_else(
            || "status: ok\nconfig: ok\n".to_string(),
            |path| format!("status: ok\nconfig: ok\npath: {}\n", path.to_string_lossy()),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn config_show(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    source: &ConfigSourceArgs,
    as_toml: bool,
) -> Result<CliOutput, CliError> {
    let path = source.path.as_deref();
    let overrides = source.overrides_json.as_deref();
    let rendered = if as_toml && !mode.is_json() && !mode.is_ndjson() {
        load_effective_config_toml(env, path, overrides)
    } else {
        load_effective_config_json(env, path, overrides)
    };
    let rendered = match rendered {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.quiet);

    let stdout = if mode.is_ndjson() || mode.is_json() {
        let config_value: serde_json::Value = serde_json::from_str(rendered.trim())?;
        if mode.is_ndjson() {
            ndjson_line(&serde_json::json!({
                "type": "summary",
                "status": "ok",
                "kind": "config",
                "effectiveConfig": config_value,
            }))?
        } else {
            pretty_json(&serde_json::json!({
                "status": "ok",
                "configPath": path_label(path),
                "effectiveConfig": config_value,
            }))?
        }
    } else {
        let mut out = String::new();
        out.push_str("status: ok\nconfig:\n");
        out.push_str(&rendered);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn config_validate(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    source: &ConfigSourceArgs,
) -> Result<CliOutput, CliError> {
    let path = source.path.as_deref();
    if let Err(error) = load_effective_config_json(env, path, source.overrides_json.as_deref()) {
        return Ok(format_error_output(mode, &error, infra_exit_code(&error)));
    }

    let mut stderr = String::new();
    log_info(&mut stderr, "config validate completed", mode.quiet);

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config")
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": path_label(path),
        }))?
    } else {
        path.map_or_else(
            || "status: ok\nconfig: ok\n".to_string(),
            |path| format!("status: ok\nconfig: ok\npath: {}\n", path.to_string_lossy()),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn config_schema(mode: OutputMode) -> Result<CliOutput, CliError> {
    let schema = match config_schema_json() {
        Ok(schema) => schema,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };

    let stdout = if mode.is_ndjson() {
        let schema_value: serde_json::Value = serde_json::from_str(schema.trim())?;
        ndjson_line(&serde_json::json!({
            "type": "summary",
            "status": "ok",
            "kind": "configSchema",
            "schema": schema_value,
        }))?
    } else {
        schema
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn path_label(path: Option<&Path>) -> Option<String> {
    path.map(|value| value.to_string_lossy().to_string())
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &InfraError,
    exit_code: ExitCode,
) -> CliOutput {
    let dto = error_to_dto(error);

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.quiet);

    let stdout = if mode.is_ndjson() {
        format_ndjson_error(&dto)
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": dto,
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        pretty_json(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}\n".to_string()
        })
    } else {
        format_error_text(&dto)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

pub(crate) fn infra_exit_code(error: &InfraError) -> ExitCode {
    if is_io_failure(error) {
        return ExitCode::Io;
    }
    match error_to_dto(error).kind {
        ErrorDtoKind::Expected => ExitCode::InvalidInput,
        ErrorDtoKind::Invariant | ErrorDtoKind::Unexpected => ExitCode::Internal,
    }
}

fn format_error_text(error: &ErrorDto) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code);
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(match error.kind {
        ErrorDtoKind::Expected => "EXPECTED",
        ErrorDtoKind::Invariant => "INVARIANT",
        ErrorDtoKind::Unexpected => "UNEXPECTED",
    });
    out.push('\n');

    if let Some(meta) = error.meta.as_ref()
        && !meta.is_empty()
    {
        out.push_str("meta:\n");
        for (key, value) in meta {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }

    out
}

fn log_info(stderr: &mut String, message: &str, quiet: bool) {
    if quiet {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

fn format_ndjson_summary(status: &str, kind: &str) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "type".to_string(),
        serde_json::Value::String("summary".to_string()),
    );
    payload.insert(
        "status".to_string(),
        serde_json::Value::String(status.to_string()),
    );
    payload.insert(
        "kind".to_string(),
        serde_json::Value::String(kind.to_string()),
    );
    ndjson_line(&serde_json::Value::Object(payload)).unwrap_or_else(|_| {
        "{\"type\":\"summary\",\"status\":\"error\",\"kind\":\"internal\"}\n".to_string()
    })
}

fn format_ndjson_error(error: &ErrorDto) -> String {
    let payload = serde_json::json!({
        "type": "error",
        "status": "error",
        "error": error,
    });
    ndjson_line(&payload).unwrap_or_else(|_| {
        "{\"type\":\"error\",\"status\":\"error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}\n".to_string()
    })
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}
