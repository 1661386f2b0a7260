//! # tombstone-config
//!
//! Configuration schema, env parsing, validation, and loading for the CLI.
//! This crate depends on `domain` and `shared` only.

/// JSON Schema export.
pub mod config_schema;
/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use config_schema::tombstone_config_schema;
pub use env::{
    ENV_CONFIG_DIR, ENV_HISTORY_STORE_PATH, ENV_ON_ITEM_FAILURE, ENV_SESSION_ID, ENV_SYNC_COMMAND,
    ENV_SYNC_COMMAND_ID, ENV_SYNC_MARKER_PATH, ENV_SYNC_PLUGIN_ID, ENV_SYNC_TRIGGER,
    ENV_VAULT_ROOT, EnvParseError, TombstoneEnv, apply_env_overrides,
};
pub use load::{
    load_tombstone_config_from_path, load_tombstone_config_from_sources,
    load_tombstone_config_std_env, to_pretty_json, to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_CONFIG_DIR, DEFAULT_SYNC_COMMAND_ID,
    DEFAULT_SYNC_PLUGIN_ID, DeletionConfig, HISTORY_STORE_FILE_NAME, SYNC_MARKER_FILE_NAME,
    SyncConfig, SyncTriggerKind, TombstoneConfig, ValidatedTombstoneConfig, VaultConfig,
    parse_tombstone_config_json, parse_tombstone_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tombstone_domain::domain_crate_version;
    use tombstone_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_domain_and_shared() {
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
