//! # tombstone-facade
//!
//! Facade API for consumers (the CLI and future hosts).
//! This crate depends on `infra`, `app`, `config`, and `domain`.

/// Stable error payloads.
pub mod error;

pub use error::{ErrorDto, ErrorDtoKind, ErrorDtoMeta, error_to_dto, is_io_failure};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
pub use tombstone_app::{DeleteSelectionOutput, ItemFailure, SelectionStatus};
pub use tombstone_domain::{
    ConfigDirCommand, OnItemFailure, OsKind, PlatformCapabilities, SelectionKind, VaultKey,
};
pub use tombstone_infra::{
    CliStatus, CollaboratorState, HistoryStoreStatus, InfraError, LocalOptions, LocalRunReport,
};
use tombstone_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Returns the facade crate version.
#[must_use]
pub const fn facade_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Validate that the provided env overrides can be parsed and merged into a config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> Result<(), InfraError> {
    tombstone_infra::validate_env_parsing(env)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<String, InfraError> {
    tombstone_infra::load_effective_config_json(env, config_path, overrides_json)
}

/// Load and validate the effective config, returning deterministic pretty TOML.
pub fn load_effective_config_toml(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<String, InfraError> {
    tombstone_infra::load_effective_config_toml(env, config_path, overrides_json)
}

/// JSON Schema of the config file, pretty-printed with a trailing newline.
pub fn config_schema_json() -> Result<String, InfraError> {
    let schema = tombstone_config::tombstone_config_schema();
    let mut output = serde_json::to_string_pretty(&schema).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config schema: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Delete arbitrary vault paths with tombstones.
pub fn run_delete_local(
    options: &LocalOptions,
    paths: &[PathBuf],
) -> Result<LocalRunReport, InfraError> {
    tombstone_infra::run_delete_local(options, paths)
}

/// Delete every `.DS_Store` file in the vault.
pub fn run_ds_store_local(options: &LocalOptions) -> Result<LocalRunReport, InfraError> {
    tombstone_infra::run_ds_store_local(options)
}

/// Delete picked entries of the vault config directory.
pub fn run_config_dir_local(
    options: &LocalOptions,
    kind: SelectionKind,
    picks: Vec<PathBuf>,
) -> Result<LocalRunReport, InfraError> {
    tombstone_infra::run_config_dir_local(options, kind, picks)
}

/// Read vault, collaborator, and history store status.
pub fn read_status_local(options: &LocalOptions) -> Result<CliStatus, InfraError> {
    tombstone_infra::read_status_local(options)
}
