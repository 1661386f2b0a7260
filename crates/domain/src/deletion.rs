//! Deletion errors, walk entries, and the batch failure policy.

use crate::platform::{OsKind, SelectionKind};
use crate::primitives::PrimitiveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tombstone_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Kind of an entry produced by the tree walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Anything that is not a directory, symlinks included.
    File,
    /// A real directory.
    Directory,
}

/// One path in deletion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute path.
    pub path: PathBuf,
    /// Entry kind as listed.
    pub kind: EntryKind,
}

impl WalkEntry {
    /// Build a file entry.
    #[must_use]
    pub const fn file(path: PathBuf) -> Self {
        Self {
            path,
            kind: EntryKind::File,
        }
    }

    /// Build a directory entry.
    #[must_use]
    pub const fn directory(path: PathBuf) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
        }
    }
}

/// What a batch does after an item fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnItemFailure {
    /// Stop at the first failure.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Continue,
}

impl OnItemFailure {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Continue => "continue",
        }
    }

    /// Parse a label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "continue" => Some(Self::Continue),
            _ => None,
        }
    }
}

impl fmt::Display for OnItemFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Failures raised while deleting a selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeletionError {
    /// The history store rejected a tombstone; the item was not removed.
    #[error("failed to write tombstone for `{key}`")]
    HistoryWriteFailed {
        /// Storage key of the tombstone.
        key: String,
        /// Underlying failure.
        #[source]
        cause: ErrorEnvelope,
    },
    /// Physical removal failed after the tombstone was written.
    #[error("failed to remove `{path}`")]
    RemovalFailed {
        /// Absolute path.
        path: String,
        /// Underlying failure.
        #[source]
        cause: ErrorEnvelope,
    },
    /// Stat failed for a reason other than absence.
    #[error("failed to stat `{path}`")]
    SnapshotFailed {
        /// Absolute path.
        path: String,
        /// Underlying failure.
        #[source]
        cause: ErrorEnvelope,
    },
    /// A directory could not be listed.
    #[error("failed to list `{path}`")]
    ListFailed {
        /// Absolute path.
        path: String,
        /// Underlying failure.
        #[source]
        cause: ErrorEnvelope,
    },
    /// A selected path could not be mapped to a vault key.
    #[error(transparent)]
    InvalidPath(#[from] PrimitiveError),
    /// A selected item does not match the command's selection kind.
    #[error("`{path}` is not allowed in a {expected} selection")]
    SelectionKindMismatch {
        /// Absolute path.
        path: String,
        /// Kind the command accepts.
        expected: SelectionKind,
    },
    /// The selection kind is not offered on this platform.
    #[error("{kind} selection is not available on {os}")]
    UnsupportedOnPlatform {
        /// Requested kind.
        kind: SelectionKind,
        /// Host OS family.
        os: OsKind,
    },
}

impl DeletionError {
    /// Stable error code.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::HistoryWriteFailed { .. } => ErrorCode::new("tombstone", "history_write_failed"),
            Self::RemovalFailed { .. } => ErrorCode::new("tombstone", "removal_failed"),
            Self::SnapshotFailed { .. } => ErrorCode::new("tombstone", "snapshot_failed"),
            Self::ListFailed { .. } => ErrorCode::new("tombstone", "list_failed"),
            Self::InvalidPath(_) => ErrorCode::new("tombstone", "path_outside_vault"),
            Self::SelectionKindMismatch { .. } => {
                ErrorCode::new("tombstone", "selection_kind_mismatch")
            },
            Self::UnsupportedOnPlatform { .. } => {
                ErrorCode::new("tombstone", "unsupported_on_platform")
            },
        }
    }
}

fn with_cause(envelope: ErrorEnvelope, cause: &ErrorEnvelope) -> ErrorEnvelope {
    envelope
        .with_metadata("cause_code", cause.code.to_string())
        .with_metadata("cause", cause.message.clone())
}

impl From<DeletionError> for ErrorEnvelope {
    fn from(error: DeletionError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        match error {
            DeletionError::HistoryWriteFailed { key, cause } => {
                let envelope = Self::unexpected(code, message, cause.class);
                with_cause(envelope.with_metadata("key", key), &cause)
            },
            DeletionError::RemovalFailed { path, cause }
            | DeletionError::SnapshotFailed { path, cause }
            | DeletionError::ListFailed { path, cause } => {
                let envelope = Self::unexpected(code, message, cause.class);
                with_cause(envelope.with_metadata("path", path), &cause)
            },
            DeletionError::InvalidPath(inner) => inner.into(),
            DeletionError::SelectionKindMismatch { path, expected } => Self::expected(code, message)
                .with_metadata("path", path)
                .with_metadata("expected", expected.as_str()),
            DeletionError::UnsupportedOnPlatform { kind, os } => Self::expected(code, message)
                .with_metadata("kind", kind.as_str())
                .with_metadata("os", os.as_str()),
        }
    }
}

impl DeletionError {
    /// Wrap a history sink failure.
    #[must_use]
    pub fn history_write(key: impl Into<String>, cause: ErrorEnvelope) -> Self {
        Self::HistoryWriteFailed {
            key: key.into(),
            cause,
        }
    }

    /// Wrap a removal failure.
    #[must_use]
    pub fn removal(path: impl Into<String>, cause: ErrorEnvelope) -> Self {
        Self::RemovalFailed {
            path: path.into(),
            cause,
        }
    }

    /// Wrap a stat failure.
    #[must_use]
    pub fn snapshot(path: impl Into<String>, cause: ErrorEnvelope) -> Self {
        Self::SnapshotFailed {
            path: path.into(),
            cause,
        }
    }

    /// Wrap a directory listing failure.
    #[must_use]
    pub fn list(path: impl Into<String>, cause: ErrorEnvelope) -> Self {
        Self::ListFailed {
            path: path.into(),
            cause,
        }
    }

    /// Returns true when retrying the item might succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::HistoryWriteFailed { cause, .. }
            | Self::RemovalFailed { cause, .. }
            | Self::SnapshotFailed { cause, .. }
            | Self::ListFailed { cause, .. } => matches!(cause.class, ErrorClass::Retriable),
            _ => false,
        }
    }
}
