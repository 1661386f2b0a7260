//! Local filesystem adapter for deletion.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tombstone_ports::{
    BoxFuture, DeletionFileSystemPort, EntryKind, FileSystemDirEntry, StatInfo,
};
use tombstone_shared::{ErrorEnvelope, RequestContext, Result};

/// Local filesystem adapter using tokio's async IO.
///
/// Symlinks are reported as files and never followed, so removing a symlink
/// to a directory removes only the link.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Build the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DeletionFileSystemPort for LocalFileSystem {
    fn snapshot(
        &self,
        _ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Option<StatInfo>>> {
        Box::pin(async move {
            let metadata = match tokio::fs::symlink_metadata(&path).await {
                Ok(metadata) => metadata,
                Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(error) => return Err(io_error(&error, "fs.snapshot", &path)),
            };

            Ok(Some(StatInfo {
                is_directory: metadata.file_type().is_dir(),
                ctime_ms: change_time_ms(&metadata),
                mtime_ms: system_time_ms(metadata.modified()),
                size_bytes: metadata.len(),
            }))
        })
    }

    fn list_dir(
        &self,
        _ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>> {
        Box::pin(async move {
            let mut read_dir = match tokio::fs::read_dir(&path).await {
                Ok(read_dir) => read_dir,
                Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(error) => return Err(io_error(&error, "fs.list_dir", &path)),
            };

            let mut entries = Vec::new();
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|error| io_error(&error, "fs.list_dir", &path))?
            {
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
                    Err(error) => return Err(io_error(&error, "fs.list_dir", &entry.path())),
                };
                let kind = if file_type.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                entries.push(FileSystemDirEntry {
                    path: entry.path(),
                    kind,
                });
            }

            entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
            Ok(entries)
        })
    }

    fn remove_all(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let metadata = match tokio::fs::symlink_metadata(&path).await {
                Ok(metadata) => metadata,
                Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(error) => return Err(io_error(&error, "fs.remove_all", &path)),
            };

            let removed = if metadata.file_type().is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match removed {
                Err(error) if error.kind() != io::ErrorKind::NotFound => {
                    Err(io_error(&error, "fs.remove_all", &path))
                },
                _ => Ok(()),
            }
        })
    }
}

fn io_error(error: &io::Error, operation: &'static str, path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::from_io(error, operation).with_metadata("path", path.display().to_string())
}

fn system_time_ms(time: io::Result<SystemTime>) -> i64 {
    let Ok(time) = time else {
        return 0;
    };
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

#[cfg(unix)]
fn change_time_ms(metadata: &std::fs::Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;

    metadata
        .ctime()
        .saturating_mul(1_000)
        .saturating_add(metadata.ctime_nsec() / 1_000_000)
}

#[cfg(not(unix))]
fn change_time_ms(metadata: &std::fs::Metadata) -> i64 {
    system_time_ms(metadata.created().or_else(|_| metadata.modified()))
}
