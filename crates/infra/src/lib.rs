//! # tombstone-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Local CLI orchestration helpers.
pub mod cli_local;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Env-driven logger and telemetry wiring.
pub mod observability;
/// Sync collaborator resolution.
pub mod sync_factory;

pub use cli_local::{
    CliStatus, HistoryStoreStatus, LocalOptions, LocalRunReport, read_status_local,
    run_config_dir_local, run_delete_local, run_ds_store_local,
};
pub use config_check::{load_effective_config, load_effective_config_json, load_effective_config_toml};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use observability::{
    Observability, observability_from_env, observability_from_lookup, scope_logger,
    scope_telemetry,
};
pub use sync_factory::{
    CollaboratorState, ResolvedCollaborator, build_sync_trigger, resolve_collaborator,
};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
