//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use std::collections::BTreeMap;
use std::path::Path;
use tombstone_config::{
    TombstoneEnv, ValidatedTombstoneConfig, load_tombstone_config_from_path, to_pretty_json,
    to_pretty_toml,
};
use tombstone_shared::ErrorEnvelope;

/// Load and validate the effective config from an explicit env map.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<ValidatedTombstoneConfig> {
    let env = TombstoneEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_tombstone_config_from_path(config_path, overrides_json, &env)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    to_pretty_json(&config)
}

/// Load and validate the effective config, returning deterministic pretty TOML.
pub fn load_effective_config_toml(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    to_pretty_toml(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_json_applies_env_map() -> InfraResult<()> {
        let mut env = BTreeMap::new();
        env.insert("TOMB_SESSION_ID".to_string(), "vault-env".to_string());
        let json = load_effective_config_json(&env, None, None)?;
        assert!(json.contains("\"sessionId\": \"vault-env\""));
        Ok(())
    }

    #[test]
    fn effective_toml_has_sections() -> InfraResult<()> {
        let toml = load_effective_config_toml(&BTreeMap::new(), None, None)?;
        assert!(toml.contains("[sync]"));
        assert!(toml.contains("configDir = \".obsidian\""));
        Ok(())
    }
}
