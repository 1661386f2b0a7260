//! # tombstone-adapters
//!
//! Adapter implementations for ports: the local filesystem, the JSON-file
//! history store, sync triggers, selection sources, notifications, and
//! JSON observability. This crate depends on `ports`, `domain` and `shared`.

pub mod fs;
pub mod history_store;
pub mod log_sink;
pub mod logger;
pub mod notifier;
pub mod selection;
pub mod sync_trigger;
pub mod telemetry;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
