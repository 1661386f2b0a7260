//! # tombstone-ports
//!
//! Port traits for the tombstone hexagonal architecture.
//!
//! This crate defines the interfaces between the deletion use cases and the
//! outside world: the filesystem, the sync engine's history store and
//! trigger, selection sources, notifications, and observability. It depends
//! only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod filesystem;
pub mod history;
pub mod logger;
pub mod notifier;
pub mod selection;
pub mod sync;
pub mod telemetry;

pub use filesystem::*;
pub use history::*;
pub use logger::*;
pub use notifier::*;
pub use selection::*;
pub use sync::*;
pub use telemetry::*;

// Domain types used in port signatures, so adapter crates can implement
// ports without naming `tombstone-domain` directly.
pub use tombstone_domain::{
    EntryKind, HistoryKey, SelectionKind, SessionId, StatInfo, TombstoneRecord,
};
