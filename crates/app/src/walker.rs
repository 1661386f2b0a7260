//! Depth-first tree walker producing paths in deletion order.

use std::path::Path;
use tombstone_domain::{DeletionError, EntryKind, WalkEntry};
use tombstone_ports::{DeletionFileSystemPort, FileSystemDirEntry};
use tombstone_shared::RequestContext;

struct Frame {
    pending: std::vec::IntoIter<FileSystemDirEntry>,
    directory: Option<WalkEntry>,
}

/// Enumerate every descendant of `directory`, leaves before their parents.
///
/// Children are visited in listing order. A subdirectory's own entry follows
/// all of its descendants. `directory` itself is not included. Symlinks are
/// listed as files and never entered.
pub async fn enumerate(
    ctx: &RequestContext,
    fs: &dyn DeletionFileSystemPort,
    directory: &Path,
) -> Result<Vec<WalkEntry>, DeletionError> {
    let mut entries = Vec::new();
    let mut stack = vec![Frame {
        pending: list(ctx, fs, directory).await?.into_iter(),
        directory: None,
    }];

    while let Some(frame) = stack.last_mut() {
        match frame.pending.next() {
            Some(child) if child.kind == EntryKind::Directory => {
                let pending = list(ctx, fs, &child.path).await?.into_iter();
                stack.push(Frame {
                    pending,
                    directory: Some(WalkEntry::directory(child.path)),
                });
            },
            Some(child) => entries.push(WalkEntry::file(child.path)),
            None => {
                if let Some(finished) = stack.pop().and_then(|frame| frame.directory) {
                    entries.push(finished);
                }
            },
        }
    }

    Ok(entries)
}

async fn list(
    ctx: &RequestContext,
    fs: &dyn DeletionFileSystemPort,
    directory: &Path,
) -> Result<Vec<FileSystemDirEntry>, DeletionError> {
    fs.list_dir(ctx, directory.to_path_buf())
        .await
        .map_err(|cause| DeletionError::list(directory.display().to_string(), cause))
}
