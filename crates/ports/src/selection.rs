//! Selection source boundary contract.

use crate::BoxFuture;
use std::path::PathBuf;
use tombstone_domain::SelectionKind;
use tombstone_shared::{RequestContext, Result};

/// How a selection should be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRequest {
    /// Every path under `root` matching `pattern`, dot-files included.
    Glob {
        /// Absolute search root.
        root: PathBuf,
        /// Pattern relative to `root`, e.g. `**/.DS_Store`.
        pattern: Box<str>,
    },
    /// An interactive or pre-supplied pick starting at `default_dir`.
    Picker {
        /// Directory the picker opens in; relative picks resolve against it.
        default_dir: PathBuf,
        /// What the pick may contain.
        kind: SelectionKind,
    },
}

/// Produces the ordered list of absolute paths to delete.
pub trait SelectionSourcePort: Send + Sync {
    /// Resolve a selection. `None` means the pick was dismissed.
    fn select(
        &self,
        ctx: &RequestContext,
        request: SelectionRequest,
    ) -> BoxFuture<'_, Result<Option<Vec<PathBuf>>>>;
}
