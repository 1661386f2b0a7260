//! Environment validation helpers for CLI surfaces.

use std::collections::BTreeMap;
use tombstone_config::{TombstoneConfig, TombstoneEnv, apply_env_overrides};
use tombstone_shared::ErrorEnvelope;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that the provided env overrides can be parsed and merged into a config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = TombstoneEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let _ = apply_env_overrides(TombstoneConfig::default(), &parsed)?;
    Ok(())
}
