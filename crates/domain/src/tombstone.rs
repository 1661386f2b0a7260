//! Tombstone record and builder.

use crate::primitives::{SessionId, VaultKey};
use serde::{Deserialize, Serialize};

/// Action recorded by a tombstone. Only deletions are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// The item was deleted locally.
    Delete,
}

/// Item kind at deletion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Regular file (or any non-directory entry).
    File,
    /// Directory.
    Folder,
}

impl KeyType {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

/// Pre-deletion metadata for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatInfo {
    /// Whether the path is a directory (symlinks are not followed).
    pub is_directory: bool,
    /// Change time, milliseconds since the epoch.
    pub ctime_ms: i64,
    /// Modification time, milliseconds since the epoch.
    pub mtime_ms: i64,
    /// Size in bytes.
    pub size_bytes: u64,
}

impl StatInfo {
    /// Kind derived from the stat result.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        if self.is_directory {
            KeyType::Folder
        } else {
            KeyType::File
        }
    }
}

/// Deletion record written into the sync history store.
///
/// Serializes with the field names the history store's owner reads; the
/// session field is emitted as `vaultRandomID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TombstoneRecord {
    /// Vault-relative key; folder keys end with `/`.
    pub key: VaultKey,
    /// Change time in ms, `0` for folders.
    pub ctime: i64,
    /// Modification time in ms, `0` for folders.
    pub mtime: i64,
    /// Size in bytes, `0` for folders.
    pub size: u64,
    /// Wall-clock time the record was built, in ms.
    pub action_when: i64,
    /// Always [`ActionType::Delete`].
    pub action_type: ActionType,
    /// Kind taken from the pre-deletion stat result.
    pub key_type: KeyType,
    /// Reserved for renames; always empty.
    pub rename_to: String,
    /// Owning vault/session.
    #[serde(rename = "vaultRandomID")]
    pub session_id: SessionId,
}

/// Build the tombstone for an item about to be removed.
///
/// The record's kind always follows `snapshot`, and the key is reshaped to
/// match it. Directory records zero out `ctime`, `mtime` and `size`.
#[must_use]
pub fn build_tombstone(
    key: VaultKey,
    snapshot: &StatInfo,
    session_id: &SessionId,
    action_when_ms: i64,
) -> TombstoneRecord {
    let key_type = snapshot.key_type();
    let (ctime, mtime, size) = match key_type {
        KeyType::Folder => (0, 0, 0),
        KeyType::File => (snapshot.ctime_ms, snapshot.mtime_ms, snapshot.size_bytes),
    };

    TombstoneRecord {
        key: key.with_key_type(key_type),
        ctime,
        mtime,
        size,
        action_when: action_when_ms,
        action_type: ActionType::Delete,
        key_type,
        rename_to: String::new(),
        session_id: session_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimitiveError;

    fn session() -> Result<SessionId, PrimitiveError> {
        SessionId::parse("vault-rand")
    }

    #[test]
    fn file_tombstone_carries_stat_values() -> Result<(), PrimitiveError> {
        let stat = StatInfo {
            is_directory: false,
            ctime_ms: 1_700_000_000_000,
            mtime_ms: 1_700_000_000_500,
            size_bytes: 6148,
        };
        let record = build_tombstone(VaultKey::parse(".DS_Store")?, &stat, &session()?, 42);

        assert_eq!(record.ctime, 1_700_000_000_000);
        assert_eq!(record.mtime, 1_700_000_000_500);
        assert_eq!(record.size, 6148);
        assert_eq!(record.action_when, 42);
        assert_eq!(record.key_type, KeyType::File);
        assert!(record.rename_to.is_empty());
        Ok(())
    }

    #[test]
    fn folder_tombstone_zeroes_stat_values() -> Result<(), PrimitiveError> {
        let stat = StatInfo {
            is_directory: true,
            ctime_ms: 9,
            mtime_ms: 9,
            size_bytes: 4096,
        };
        let record = build_tombstone(VaultKey::parse("plugins/foo")?, &stat, &session()?, 7);

        assert_eq!((record.ctime, record.mtime, record.size), (0, 0, 0));
        assert_eq!(record.key_type, KeyType::Folder);
        assert_eq!(record.key.as_str(), "plugins/foo/");
        Ok(())
    }

    #[test]
    fn record_serializes_with_store_field_names() -> Result<(), Box<dyn std::error::Error>> {
        let stat = StatInfo {
            is_directory: false,
            ctime_ms: 1,
            mtime_ms: 2,
            size_bytes: 3,
        };
        let record = build_tombstone(VaultKey::parse("a.md")?, &stat, &session()?, 4);
        let value = serde_json::to_value(&record)?;

        assert_eq!(
            value,
            serde_json::json!({
                "key": "a.md",
                "ctime": 1,
                "mtime": 2,
                "size": 3,
                "actionWhen": 4,
                "actionType": "delete",
                "keyType": "file",
                "renameTo": "",
                "vaultRandomID": "vault-rand",
            })
        );

        let decoded: TombstoneRecord = serde_json::from_value(value)?;
        assert_eq!(decoded, record);
        Ok(())
    }
}
