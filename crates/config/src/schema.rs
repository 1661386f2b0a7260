//! Tombstone configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims string fields so later layers see canonical values.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tombstone_domain::{OnItemFailure, SessionId};
use tombstone_shared::{ErrorCode, ErrorEnvelope};

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;
/// Default vault configuration directory name.
pub const DEFAULT_CONFIG_DIR: &str = ".obsidian";
/// Default sync plugin id.
pub const DEFAULT_SYNC_PLUGIN_ID: &str = "remotely-save";
/// Default sync command id.
pub const DEFAULT_SYNC_COMMAND_ID: &str = "remotely-save:start-sync";
/// File name of the history store inside the plugin directory.
pub const HISTORY_STORE_FILE_NAME: &str = "file-history.json";
/// File name of the sync request marker inside the plugin directory.
pub const SYNC_MARKER_FILE_NAME: &str = "sync-request.json";

const SYNC_COMMAND_ARGS_MAX: usize = 32;

/// Top-level tombstone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct TombstoneConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Vault location settings.
    pub vault: VaultConfig,
    /// Sync collaborator settings.
    pub sync: SyncConfig,
    /// Batch deletion settings.
    pub deletion: DeletionConfig,
}

impl Default for TombstoneConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            vault: VaultConfig::default(),
            sync: SyncConfig::default(),
            deletion: DeletionConfig::default(),
        }
    }
}

impl TombstoneConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(
        mut self,
    ) -> Result<ValidatedTombstoneConfig, ConfigSchemaError> {
        self.validate_version()?;
        self.vault.normalize_and_validate()?;
        let session_id = self.sync.normalize_and_validate()?;
        Ok(ValidatedTombstoneConfig {
            raw: self,
            session_id,
        })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

/// Validated config wrapper carrying parsed identifiers.
#[derive(Debug, Clone)]
pub struct ValidatedTombstoneConfig {
    raw: TombstoneConfig,
    session_id: Option<SessionId>,
}

impl ValidatedTombstoneConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &TombstoneConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> TombstoneConfig {
        self.raw
    }

    /// Parsed session id, if one is configured.
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Configured batch failure policy.
    #[must_use]
    pub const fn on_item_failure(&self) -> OnItemFailure {
        self.raw.deletion.on_item_failure
    }

    /// `<vault>/<configDir>`.
    #[must_use]
    pub fn config_dir_path(&self, vault_root: &Path) -> PathBuf {
        vault_root.join(&*self.raw.vault.config_dir)
    }

    /// `<vault>/<configDir>/plugins/<pluginId>`.
    #[must_use]
    pub fn plugin_dir(&self, vault_root: &Path) -> PathBuf {
        self.config_dir_path(vault_root)
            .join("plugins")
            .join(&*self.raw.sync.plugin_id)
    }

    /// History store location; relative overrides resolve against the vault root.
    #[must_use]
    pub fn history_store_path(&self, vault_root: &Path) -> PathBuf {
        self.raw.sync.history_store_path.as_ref().map_or_else(
            || self.plugin_dir(vault_root).join(HISTORY_STORE_FILE_NAME),
            |path| vault_root.join(path),
        )
    }

    /// Sync marker location; relative overrides resolve against the vault root.
    #[must_use]
    pub fn marker_path(&self, vault_root: &Path) -> PathBuf {
        self.raw.sync.marker_path.as_ref().map_or_else(
            || self.plugin_dir(vault_root).join(SYNC_MARKER_FILE_NAME),
            |path| vault_root.join(path),
        )
    }
}

impl AsRef<TombstoneConfig> for ValidatedTombstoneConfig {
    fn as_ref(&self) -> &TombstoneConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedTombstoneConfig {
    type Target = TombstoneConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse a tombstone config from a JSON string, applying validation and normalization.
pub fn parse_tombstone_config_json(
    input: &str,
) -> Result<ValidatedTombstoneConfig, ErrorEnvelope> {
    let config: TombstoneConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a tombstone config from a TOML string, applying validation and normalization.
pub fn parse_tombstone_config_toml(
    input: &str,
) -> Result<ValidatedTombstoneConfig, ErrorEnvelope> {
    let config: TombstoneConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Vault location settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct VaultConfig {
    /// Vault root; the CLI falls back to the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Configuration directory name inside the vault.
    pub config_dir: Box<str>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: None,
            config_dir: DEFAULT_CONFIG_DIR.into(),
        }
    }
}

impl VaultConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        if let Some(root) = &self.root
            && root.as_os_str().is_empty()
        {
            return Err(ConfigSchemaError::EmptyField {
                section: "vault",
                field: "root",
            });
        }
        self.config_dir = validate_segment("vault", "configDir", &self.config_dir)?;
        Ok(())
    }
}

/// How a sync run is requested once a selection has been deleted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SyncTriggerKind {
    /// Write a request marker into the plugin directory.
    #[default]
    Marker,
    /// Spawn a configured program with the command id appended.
    Command,
    /// Record tombstones but never request a sync.
    Disabled,
}

impl SyncTriggerKind {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Command => "command",
            Self::Disabled => "disabled",
        }
    }

    /// Parse a label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "marker" => Some(Self::Marker),
            "command" => Some(Self::Command),
            "disabled" | "none" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for SyncTriggerKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Sync collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SyncConfig {
    /// Plugin id; its directory must exist for tombstones to be recorded.
    pub plugin_id: Box<str>,
    /// Command id passed to the sync trigger.
    pub command_id: Box<str>,
    /// Vault/session identifier used as the history key prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Box<str>>,
    /// History store override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_store_path: Option<PathBuf>,
    /// Trigger mechanism.
    pub trigger: SyncTriggerKind,
    /// Program and arguments for the `command` trigger.
    pub command: Vec<String>,
    /// Marker file override for the `marker` trigger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            plugin_id: DEFAULT_SYNC_PLUGIN_ID.into(),
            command_id: DEFAULT_SYNC_COMMAND_ID.into(),
            session_id: None,
            history_store_path: None,
            trigger: SyncTriggerKind::default(),
            command: Vec::new(),
            marker_path: None,
        }
    }
}

impl SyncConfig {
    fn normalize_and_validate(&mut self) -> Result<Option<SessionId>, ConfigSchemaError> {
        self.plugin_id = validate_segment("sync", "pluginId", &self.plugin_id)?;
        self.command_id = validate_non_empty("sync", "commandId", &self.command_id)?;

        let session_id = match self.session_id.as_deref() {
            None => None,
            Some(raw) => {
                let parsed = SessionId::parse(raw).map_err(|error| {
                    ConfigSchemaError::InvalidSessionId {
                        reason: error.to_string(),
                    }
                })?;
                self.session_id = Some(parsed.as_str().into());
                Some(parsed)
            },
        };

        if self.command.len() > SYNC_COMMAND_ARGS_MAX {
            return Err(ConfigSchemaError::ListTooLarge {
                section: "sync",
                field: "command",
                len: self.command.len(),
                max: SYNC_COMMAND_ARGS_MAX,
            });
        }
        if let Some(index) = self.command.iter().position(|arg| arg.trim().is_empty()) {
            return Err(ConfigSchemaError::EmptyListEntry {
                section: "sync",
                field: "command",
                index,
            });
        }
        if self.trigger == SyncTriggerKind::Command && self.command.is_empty() {
            return Err(ConfigSchemaError::MissingSyncCommand);
        }

        for (field, path) in [
            ("historyStorePath", &self.history_store_path),
            ("markerPath", &self.marker_path),
        ] {
            if path.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
                return Err(ConfigSchemaError::EmptyField {
                    section: "sync",
                    field,
                });
            }
        }

        Ok(session_id)
    }
}

/// Batch deletion settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DeletionConfig {
    /// What a batch does after an item fails (`abort` or `continue`).
    #[schemars(with = "String")]
    pub on_item_failure: OnItemFailure,
}

fn validate_non_empty(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<Box<str>, ConfigSchemaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigSchemaError::EmptyField { section, field });
    }
    Ok(trimmed.into())
}

fn validate_segment(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<Box<str>, ConfigSchemaError> {
    let trimmed = validate_non_empty(section, field, value)?;
    if &*trimmed == "." || &*trimmed == ".." || trimmed.contains(['/', '\\']) {
        return Err(ConfigSchemaError::InvalidPathSegment {
            section,
            field,
            value: trimmed.into(),
        });
    }
    Ok(trimmed)
}

/// Validation failures for `TombstoneConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A required string field is empty after trimming.
    EmptyField {
        /// Schema section (e.g. `sync`).
        section: &'static str,
        /// Field name in the config file (e.g. `commandId`).
        field: &'static str,
    },
    /// A field that names a single directory contains separators or traversal.
    InvalidPathSegment {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// The session id cannot be used as a history key prefix.
    InvalidSessionId {
        /// Parser message.
        reason: String,
    },
    /// The `command` trigger was selected without a program.
    MissingSyncCommand,
    /// A list field exceeds the maximum allowed size.
    ListTooLarge {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Number of entries.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A list field contains an empty entry.
    EmptyListEntry {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Position of the empty entry.
        index: usize,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::EmptyField { .. } => ErrorCode::new("config", "empty_field"),
            Self::InvalidPathSegment { .. } => ErrorCode::new("config", "invalid_path_segment"),
            Self::InvalidSessionId { .. } => ErrorCode::new("config", "invalid_session_id"),
            Self::MissingSyncCommand => ErrorCode::new("config", "missing_sync_command"),
            Self::ListTooLarge { .. } => ErrorCode::new("config", "list_too_large"),
            Self::EmptyListEntry { .. } => ErrorCode::new("config", "empty_list_entry"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::EmptyField { section, field } => {
                write!(formatter, "{section}.{field} must be non-empty")
            },
            Self::InvalidPathSegment {
                section,
                field,
                value,
            } => write!(
                formatter,
                "{section}.{field} must be a single directory name (got `{value}`)"
            ),
            Self::InvalidSessionId { reason } => {
                write!(formatter, "sync.sessionId is invalid: {reason}")
            },
            Self::MissingSyncCommand => formatter
                .write_str("sync.command must be set when sync.trigger is `command`"),
            Self::ListTooLarge {
                section,
                field,
                len,
                max,
            } => write!(
                formatter,
                "{section}.{field} must have at most {max} entries (got {len})"
            ),
            Self::EmptyListEntry {
                section,
                field,
                index,
            } => write!(formatter, "{section}.{field}[{index}] must be non-empty"),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => {
                envelope = envelope
                    .with_metadata("found", found.to_string())
                    .with_metadata("supported", supported.to_string());
            },
            ConfigSchemaError::EmptyField { section, field } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field);
            },
            ConfigSchemaError::InvalidPathSegment {
                section,
                field,
                value,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("value", value);
            },
            ConfigSchemaError::InvalidSessionId { .. } => {
                envelope = envelope
                    .with_metadata("section", "sync")
                    .with_metadata("field", "sessionId");
            },
            ConfigSchemaError::MissingSyncCommand => {
                envelope = envelope
                    .with_metadata("section", "sync")
                    .with_metadata("field", "command");
            },
            ConfigSchemaError::ListTooLarge {
                section,
                field,
                len,
                max,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("len", len.to_string())
                    .with_metadata("max", max.to_string());
            },
            ConfigSchemaError::EmptyListEntry {
                section,
                field,
                index,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("index", index.to_string());
            },
        }

        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() -> Result<(), ConfigSchemaError> {
        let validated = TombstoneConfig::default().validate_and_normalize()?;
        assert_eq!(&*validated.vault.config_dir, ".obsidian");
        assert_eq!(validated.sync.trigger, SyncTriggerKind::Marker);
        assert!(validated.session_id().is_none());
        assert_eq!(validated.on_item_failure(), OnItemFailure::Abort);
        Ok(())
    }

    #[test]
    fn derived_paths_follow_plugin_dir() -> Result<(), ConfigSchemaError> {
        let validated = TombstoneConfig::default().validate_and_normalize()?;
        let root = Path::new("/vault");
        assert_eq!(
            validated.plugin_dir(root),
            PathBuf::from("/vault/.obsidian/plugins/remotely-save")
        );
        assert_eq!(
            validated.history_store_path(root),
            PathBuf::from("/vault/.obsidian/plugins/remotely-save/file-history.json")
        );
        assert_eq!(
            validated.marker_path(root),
            PathBuf::from("/vault/.obsidian/plugins/remotely-save/sync-request.json")
        );
        Ok(())
    }

    #[test]
    fn relative_overrides_resolve_against_vault() -> Result<(), ConfigSchemaError> {
        let mut config = TombstoneConfig::default();
        config.sync.history_store_path = Some(PathBuf::from("history.json"));
        config.sync.marker_path = Some(PathBuf::from("/tmp/marker.json"));
        let validated = config.validate_and_normalize()?;
        let root = Path::new("/vault");
        assert_eq!(
            validated.history_store_path(root),
            PathBuf::from("/vault/history.json")
        );
        assert_eq!(validated.marker_path(root), PathBuf::from("/tmp/marker.json"));
        Ok(())
    }

    #[test]
    fn session_id_is_trimmed() -> Result<(), ConfigSchemaError> {
        let mut config = TombstoneConfig::default();
        config.sync.session_id = Some("  vault-9 ".into());
        let validated = config.validate_and_normalize()?;
        assert_eq!(validated.session_id().map(SessionId::as_str), Some("vault-9"));
        assert_eq!(validated.sync.session_id.as_deref(), Some("vault-9"));
        Ok(())
    }

    #[test]
    fn config_dir_must_be_single_segment() {
        let mut config = TombstoneConfig::default();
        config.vault.config_dir = "a/b".into();
        let error = config.validate_and_normalize().err();
        assert!(matches!(
            error,
            Some(ConfigSchemaError::InvalidPathSegment {
                field: "configDir",
                ..
            })
        ));
    }

    #[test]
    fn command_trigger_requires_program() {
        let mut config = TombstoneConfig::default();
        config.sync.trigger = SyncTriggerKind::Command;
        let error = config.validate_and_normalize().err();
        assert_eq!(error, Some(ConfigSchemaError::MissingSyncCommand));
    }

    #[test]
    fn unsupported_version_maps_to_envelope() {
        let config = TombstoneConfig {
            version: 2,
            ..TombstoneConfig::default()
        };
        let envelope = config
            .validate_and_normalize()
            .err()
            .map(ErrorEnvelope::from);
        assert!(envelope.is_some_and(|envelope| {
            envelope.code == ErrorCode::new("config", "unsupported_version")
                && envelope.metadata_value("found") == Some("2")
        }));
    }
}
