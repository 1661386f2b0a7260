//! # tombstone-domain
//!
//! Domain model for recording deletions as sync tombstones.
//!
//! - **Primitives** - `SessionId`, `VaultKey`, `HistoryKey`
//! - **Tombstones** - `TombstoneRecord`, `StatInfo`, `build_tombstone`
//! - **Paths** - `vault_relative_key`
//! - **Platform** - `PlatformCapabilities`, `SelectionKind`
//! - **Deletion** - `DeletionError`, `WalkEntry`, `OnItemFailure`
//!
//! ## Dependency Rules
//!
//! - Depends only on the `shared` crate
//! - No I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use tombstone_shared::shared_crate_version;

pub mod deletion;
pub mod paths;
pub mod platform;
pub mod primitives;
pub mod tombstone;

pub use deletion::{DeletionError, EntryKind, OnItemFailure, WalkEntry};
pub use paths::{resolve_vault_path, vault_relative_key};
pub use platform::{
    ConfigDirCommand, DS_STORE_COMMAND_ID, OsKind, PlatformCapabilities, SelectionKind,
};
pub use primitives::{HistoryKey, PrimitiveError, SessionId, VaultKey};
pub use tombstone::{ActionType, KeyType, StatInfo, TombstoneRecord, build_tombstone};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
