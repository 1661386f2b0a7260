//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{
    SyncTriggerKind, TombstoneConfig, TombstoneEnv, ValidatedTombstoneConfig,
    apply_env_overrides,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tombstone_domain::OnItemFailure;
use tombstone_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the tombstone config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`TombstoneEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`TombstoneConfig::default()`)
pub fn load_tombstone_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &TombstoneEnv,
) -> Result<ValidatedTombstoneConfig, ErrorEnvelope> {
    let mut config = match config_json {
        None => TombstoneConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };

    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        apply_overrides(&mut config, overrides);
    }

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

/// Load the tombstone config from an optional file path.
pub fn load_tombstone_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &TombstoneEnv,
) -> Result<ValidatedTombstoneConfig, ErrorEnvelope> {
    let mut config = match config_path {
        None => TombstoneConfig::default(),
        Some(path) => {
            let config_text = read_config_file(path)?;
            let format = detect_config_format(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };

    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        apply_overrides(&mut config, overrides);
    }

    apply_env_overrides(config, env)
}

/// Load the tombstone config from std env and an optional file path.
pub fn load_tombstone_config_std_env(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<ValidatedTombstoneConfig, ErrorEnvelope> {
    let env = TombstoneEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_tombstone_config_from_path(config_path, overrides_json, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &TombstoneConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &TombstoneConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<TombstoneConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<TombstoneConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct TombstoneConfigOverrides {
    version: Option<u32>,
    vault: VaultConfigOverrides,
    sync: SyncConfigOverrides,
    deletion: DeletionConfigOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct VaultConfigOverrides {
    root: Option<PathBuf>,
    config_dir: Option<Box<str>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct SyncConfigOverrides {
    plugin_id: Option<Box<str>>,
    command_id: Option<Box<str>>,
    session_id: Option<Box<str>>,
    history_store_path: Option<PathBuf>,
    trigger: Option<SyncTriggerKind>,
    command: Option<Vec<String>>,
    marker_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct DeletionConfigOverrides {
    on_item_failure: Option<OnItemFailure>,
}

fn apply_overrides(config: &mut TombstoneConfig, overrides: TombstoneConfigOverrides) {
    if let Some(version) = overrides.version {
        config.version = version;
    }

    let vault = overrides.vault;
    if vault.root.is_some() {
        config.vault.root = vault.root;
    }
    if let Some(config_dir) = vault.config_dir {
        config.vault.config_dir = config_dir;
    }

    let sync = overrides.sync;
    if let Some(plugin_id) = sync.plugin_id {
        config.sync.plugin_id = plugin_id;
    }
    if let Some(command_id) = sync.command_id {
        config.sync.command_id = command_id;
    }
    if sync.session_id.is_some() {
        config.sync.session_id = sync.session_id;
    }
    if sync.history_store_path.is_some() {
        config.sync.history_store_path = sync.history_store_path;
    }
    if let Some(trigger) = sync.trigger {
        config.sync.trigger = trigger;
    }
    if let Some(command) = sync.command {
        config.sync.command = command;
    }
    if sync.marker_path.is_some() {
        config.sync.marker_path = sync.marker_path;
    }

    if let Some(policy) = overrides.deletion.on_item_failure {
        config.deletion.on_item_failure = policy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_merge_over_file_values() -> Result<(), ErrorEnvelope> {
        let config = load_tombstone_config_from_sources(
            Some(r#"{"sync":{"sessionId":"file-id","pluginId":"custom-sync"}}"#),
            Some(r#"{"sync":{"sessionId":"override-id"}}"#),
            &TombstoneEnv::default(),
        )?;
        assert_eq!(config.sync.session_id.as_deref(), Some("override-id"));
        assert_eq!(&*config.sync.plugin_id, "custom-sync");
        Ok(())
    }

    #[test]
    fn env_wins_over_overrides() -> Result<(), ErrorEnvelope> {
        let env = TombstoneEnv {
            on_item_failure: Some(OnItemFailure::Continue),
            ..TombstoneEnv::default()
        };
        let config = load_tombstone_config_from_sources(
            None,
            Some(r#"{"deletion":{"onItemFailure":"abort"}}"#),
            &env,
        )?;
        assert_eq!(config.on_item_failure(), OnItemFailure::Continue);
        Ok(())
    }

    #[test]
    fn unknown_override_fields_are_rejected() {
        let error = load_tombstone_config_from_sources(
            None,
            Some(r#"{"sync":{"bogus":1}}"#),
            &TombstoneEnv::default(),
        )
        .err();
        assert!(error.is_some_and(|error| {
            error.code == ErrorCode::new("config", "invalid_json")
                && error.metadata_value("source") == Some("overrides")
        }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let error = detect_config_format(Path::new("tomb.yaml")).err();
        assert!(error.is_some_and(|error| error.metadata_value("extension") == Some("yaml")));
    }

    #[test]
    fn pretty_toml_round_trips() -> Result<(), ErrorEnvelope> {
        let mut config = TombstoneConfig::default();
        config.sync.session_id = Some("vault-1".into());
        let text = to_pretty_toml(&config)?;
        let parsed = parse_config_unvalidated(&text, ConfigFormat::Toml)?;
        assert_eq!(parsed, config);
        Ok(())
    }
}
