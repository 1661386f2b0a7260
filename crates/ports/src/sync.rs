//! Sync engine boundary contract.

use crate::history::HistorySinkPort;
use std::fmt;
use std::sync::Arc;
use tombstone_domain::SessionId;
use tombstone_shared::{RequestContext, Result};

/// Asks the external sync engine to start a pass.
///
/// Fire-and-forget: implementations return once the request is handed off
/// and never wait for the sync itself.
pub trait SyncTriggerPort: Send + Sync {
    /// Request a sync pass.
    fn start_sync(&self, ctx: &RequestContext) -> Result<()>;

    /// Command id the request is addressed to.
    fn command_id(&self) -> &str;
}

/// Capabilities of an installed sync engine, resolved once per operation.
#[derive(Clone)]
pub struct SyncCollaborator {
    /// Tombstone destination.
    pub history: Arc<dyn HistorySinkPort>,
    /// Sync pass trigger.
    pub trigger: Arc<dyn SyncTriggerPort>,
    /// Session that owns the history store.
    pub session_id: SessionId,
}

impl fmt::Debug for SyncCollaborator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncCollaborator")
            .field("session_id", &self.session_id)
            .field("command_id", &self.trigger.command_id())
            .finish_non_exhaustive()
    }
}
