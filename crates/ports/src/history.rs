//! History store boundary contract.

use crate::BoxFuture;
use tombstone_domain::{HistoryKey, TombstoneRecord};
use tombstone_shared::{RequestContext, Result};

/// Write side of the sync engine's file-history store.
///
/// Writes are idempotent overwrites keyed by [`HistoryKey`]. The future
/// resolves once the record is durable in the store.
pub trait HistorySinkPort: Send + Sync {
    /// Store `record` under `key`, replacing any previous record.
    fn set_item(
        &self,
        ctx: &RequestContext,
        key: HistoryKey,
        record: TombstoneRecord,
    ) -> BoxFuture<'_, Result<()>>;
}
