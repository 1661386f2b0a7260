//! # tombstone-app
//!
//! Application use cases: walking a tree in deletion order, deleting single
//! paths and whole selections with tombstones, and the vault-level commands.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod delete;
pub mod vault_commands;
pub mod walker;

pub use delete::{
    DeleteSelectionInput, DeleteSelectionOutput, DeletionDeps, ItemFailure, ItemOutcome,
    SelectionStatus, delete_one, delete_selection,
};
pub use vault_commands::{
    CleanDsStoreInput, CleanDsStoreOutput, ConfigDirDeleteInput, ConfigDirDeleteOutput,
    DS_STORE_PATTERN, VaultCommandDeps, clean_ds_store, delete_in_config_dir,
};
pub use walker::enumerate;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
