//! Filesystem boundary contract for deletion.

use crate::BoxFuture;
use std::path::PathBuf;
use tombstone_domain::{EntryKind, StatInfo};
use tombstone_shared::{RequestContext, Result};

/// Directory entry returned by `list_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemDirEntry {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Entry kind; symlinks are reported as files.
    pub kind: EntryKind,
}

/// Boundary contract for the filesystem operations deletion needs.
///
/// All paths are absolute. Symlinks are never followed.
pub trait DeletionFileSystemPort: Send + Sync {
    /// Capture pre-deletion metadata; `None` when the path does not exist.
    fn snapshot(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Option<StatInfo>>>;

    /// List direct children in a stable order. A missing directory yields no entries.
    fn list_dir(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>>;

    /// Remove a file or a whole directory tree. A missing path is success.
    fn remove_all(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<()>>;
}
