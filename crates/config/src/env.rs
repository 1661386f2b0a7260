//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present but empty or invalid
//! fails fast instead of silently falling back to the file value.

use crate::schema::{SyncTriggerKind, TombstoneConfig, ValidatedTombstoneConfig};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tombstone_domain::OnItemFailure;
use tombstone_shared::{ErrorCode, ErrorEnvelope};

/// Env var: vault root.
pub const ENV_VAULT_ROOT: &str = "TOMB_VAULT_ROOT";
/// Env var: vault configuration directory name.
pub const ENV_CONFIG_DIR: &str = "TOMB_CONFIG_DIR";
/// Env var: sync plugin id.
pub const ENV_SYNC_PLUGIN_ID: &str = "TOMB_SYNC_PLUGIN_ID";
/// Env var: sync command id.
pub const ENV_SYNC_COMMAND_ID: &str = "TOMB_SYNC_COMMAND_ID";
/// Env var: session id used as the history key prefix.
pub const ENV_SESSION_ID: &str = "TOMB_SESSION_ID";
/// Env var: history store override.
pub const ENV_HISTORY_STORE_PATH: &str = "TOMB_HISTORY_STORE_PATH";
/// Env var: sync trigger kind (`marker`, `command`, `disabled`).
pub const ENV_SYNC_TRIGGER: &str = "TOMB_SYNC_TRIGGER";
/// Env var: sync command program and arguments (CSV).
pub const ENV_SYNC_COMMAND: &str = "TOMB_SYNC_COMMAND";
/// Env var: sync marker override.
pub const ENV_SYNC_MARKER_PATH: &str = "TOMB_SYNC_MARKER_PATH";
/// Env var: batch failure policy (`abort`, `continue`).
pub const ENV_ON_ITEM_FAILURE: &str = "TOMB_ON_ITEM_FAILURE";

const ALL_ENV_VARS: [&str; 10] = [
    ENV_VAULT_ROOT,
    ENV_CONFIG_DIR,
    ENV_SYNC_PLUGIN_ID,
    ENV_SYNC_COMMAND_ID,
    ENV_SESSION_ID,
    ENV_HISTORY_STORE_PATH,
    ENV_SYNC_TRIGGER,
    ENV_SYNC_COMMAND,
    ENV_SYNC_MARKER_PATH,
    ENV_ON_ITEM_FAILURE,
];

/// Parsed `TOMB_*` overrides. `None` means the variable was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TombstoneEnv {
    /// `TOMB_VAULT_ROOT`.
    pub vault_root: Option<PathBuf>,
    /// `TOMB_CONFIG_DIR`.
    pub config_dir: Option<Box<str>>,
    /// `TOMB_SYNC_PLUGIN_ID`.
    pub sync_plugin_id: Option<Box<str>>,
    /// `TOMB_SYNC_COMMAND_ID`.
    pub sync_command_id: Option<Box<str>>,
    /// `TOMB_SESSION_ID`.
    pub session_id: Option<Box<str>>,
    /// `TOMB_HISTORY_STORE_PATH`.
    pub history_store_path: Option<PathBuf>,
    /// `TOMB_SYNC_TRIGGER`.
    pub sync_trigger: Option<SyncTriggerKind>,
    /// `TOMB_SYNC_COMMAND`.
    pub sync_command: Option<Vec<String>>,
    /// `TOMB_SYNC_MARKER_PATH`.
    pub sync_marker_path: Option<PathBuf>,
    /// `TOMB_ON_ITEM_FAILURE`.
    pub on_item_failure: Option<OnItemFailure>,
}

impl TombstoneEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            vault_root: parse_optional_path(map, ENV_VAULT_ROOT)?,
            config_dir: parse_optional_trimmed_string(map, ENV_CONFIG_DIR)?,
            sync_plugin_id: parse_optional_trimmed_string(map, ENV_SYNC_PLUGIN_ID)?,
            sync_command_id: parse_optional_trimmed_string(map, ENV_SYNC_COMMAND_ID)?,
            session_id: parse_optional_trimmed_string(map, ENV_SESSION_ID)?,
            history_store_path: parse_optional_path(map, ENV_HISTORY_STORE_PATH)?,
            sync_trigger: parse_optional_enum(map, ENV_SYNC_TRIGGER, SyncTriggerKind::parse)?,
            sync_command: parse_optional_csv(map, ENV_SYNC_COMMAND)?,
            sync_marker_path: parse_optional_path(map, ENV_SYNC_MARKER_PATH)?,
            on_item_failure: parse_optional_enum(map, ENV_ON_ITEM_FAILURE, OnItemFailure::parse)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ALL_ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }

    /// Whether any override is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: TombstoneConfig,
    env: &TombstoneEnv,
) -> Result<ValidatedTombstoneConfig, ErrorEnvelope> {
    let mut config = base;

    set_opt_clone(&mut config.vault.root, env.vault_root.as_ref());
    set_clone(&mut config.vault.config_dir, env.config_dir.as_ref());
    set_clone(&mut config.sync.plugin_id, env.sync_plugin_id.as_ref());
    set_clone(&mut config.sync.command_id, env.sync_command_id.as_ref());
    set_opt_clone(&mut config.sync.session_id, env.session_id.as_ref());
    set_opt_clone(
        &mut config.sync.history_store_path,
        env.history_store_path.as_ref(),
    );
    if let Some(trigger) = env.sync_trigger {
        config.sync.trigger = trigger;
    }
    set_clone(&mut config.sync.command, env.sync_command.as_ref());
    set_opt_clone(&mut config.sync.marker_path, env.sync_marker_path.as_ref());
    if let Some(policy) = env.on_item_failure {
        config.deletion.on_item_failure = policy;
    }

    config.validate_and_normalize().map_err(Into::into)
}

fn set_clone<T: Clone>(field: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

fn set_opt_clone<T: Clone>(field: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *field = Some(value.clone());
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// CSV contained an empty entry.
    InvalidCsvEntry {
        /// Env var name.
        var: &'static str,
        /// Position of the empty entry.
        index: usize,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
            Self::InvalidCsvEntry { .. } => ErrorCode::new("config", "invalid_env_csv"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
            Self::InvalidCsvEntry { var, index } => {
                write!(formatter, "{var} contains an empty entry at position {index}")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => {
                envelope = envelope.with_metadata("env_var", var);
            },
            EnvParseError::InvalidEnum { var, value } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", value);
            },
            EnvParseError::InvalidCsvEntry { var, index } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("index", index.to_string());
            },
        }

        envelope
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_path(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<PathBuf>, EnvParseError> {
    Ok(parse_optional_trimmed_string(map, var)?.map(|value| PathBuf::from(&*value)))
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };
    parse(&raw[..]).map(Some).ok_or_else(|| EnvParseError::InvalidEnum {
        var,
        value: raw.into(),
    })
}

fn parse_optional_csv(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Vec<String>>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    let mut items = Vec::new();
    for (index, entry) in raw.split(',').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(EnvParseError::InvalidCsvEntry { var, index });
        }
        items.push(entry.to_string());
    }
    Ok(Some(items))
}
