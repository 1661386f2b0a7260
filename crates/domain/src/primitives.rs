//! Domain primitives with validated constructors.

use crate::tombstone::KeyType;
use serde::{Deserialize, Serialize};
use std::fmt;
use tombstone_shared::{ErrorCode, ErrorEnvelope};

/// Validation failures for domain primitives and vault paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimitiveError {
    /// `SessionId` is empty after trimming.
    #[error("SessionId must be non-empty")]
    EmptySessionId {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `SessionId` contains a character reserved by the storage key format.
    #[error("SessionId must not contain tab or newline characters")]
    InvalidSessionId {
        /// Trimmed session id that failed validation.
        input: String,
    },
    /// `VaultKey` has an empty, `.` or `..` segment.
    #[error("VaultKey segment `{segment}` is invalid")]
    InvalidVaultKey {
        /// Raw key that failed validation.
        key: String,
        /// Offending segment.
        segment: String,
    },
    /// Path does not live under the vault root.
    #[error("path is outside the vault root")]
    PathOutsideVault {
        /// Offending path (lossy).
        path: String,
        /// Vault root (lossy).
        vault_root: String,
    },
    /// Path is the vault root itself, which has no key.
    #[error("the vault root itself cannot be deleted")]
    PathIsVaultRoot {
        /// Offending path (lossy).
        path: String,
    },
    /// Path contains a component that is not valid UTF-8.
    #[error("path is not valid UTF-8")]
    NonUtf8Path {
        /// Offending path (lossy).
        path: String,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptySessionId { .. } | Self::InvalidSessionId { .. } => {
                ErrorCode::new("domain", "invalid_session_id")
            },
            Self::InvalidVaultKey { .. } => ErrorCode::new("domain", "invalid_vault_key"),
            Self::PathOutsideVault { .. }
            | Self::PathIsVaultRoot { .. }
            | Self::NonUtf8Path { .. } => ErrorCode::new("tombstone", "path_outside_vault"),
        }
    }
}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            PrimitiveError::EmptySessionId { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::InvalidSessionId { input } => envelope.with_metadata("input", input),
            PrimitiveError::InvalidVaultKey { key, segment } => envelope
                .with_metadata("key", key)
                .with_metadata("segment", segment),
            PrimitiveError::PathOutsideVault { path, vault_root } => envelope
                .with_metadata("path", path)
                .with_metadata("vault_root", vault_root)
                .with_metadata("reason", "outside_root"),
            PrimitiveError::PathIsVaultRoot { path } => envelope
                .with_metadata("path", path)
                .with_metadata("reason", "vault_root"),
            PrimitiveError::NonUtf8Path { path } => envelope
                .with_metadata("path", path)
                .with_metadata("reason", "non_utf8"),
        }
    }
}

/// Identifier of the vault/session that owns a history store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(Box<str>);

impl SessionId {
    /// Parse a `SessionId` from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveError::EmptySessionId {
                input_length: raw.len(),
            });
        }
        if trimmed.contains(['\t', '\n', '\r']) {
            return Err(PrimitiveError::InvalidSessionId {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(value: SessionId) -> Self {
        value.0.into()
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Vault-relative, `/`-separated item key. Folder keys end with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VaultKey(Box<str>);

impl VaultKey {
    /// Parse a key in wire form (`a/b.json` or `a/b/`).
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let (body, key_type) = raw
            .strip_suffix('/')
            .map_or((raw, KeyType::File), |body| (body, KeyType::Folder));
        Self::from_segments(body.split('/'), key_type).map_err(|error| match error {
            PrimitiveError::InvalidVaultKey { segment, .. } => PrimitiveError::InvalidVaultKey {
                key: raw.to_owned(),
                segment,
            },
            other => other,
        })
    }

    /// Build a key from already split path segments.
    pub fn from_segments<'a>(
        segments: impl IntoIterator<Item = &'a str>,
        key_type: KeyType,
    ) -> Result<Self, PrimitiveError> {
        let mut key = String::new();
        for segment in segments {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') {
                return Err(PrimitiveError::InvalidVaultKey {
                    key: key.clone(),
                    segment: segment.to_owned(),
                });
            }
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(segment);
        }
        if key.is_empty() {
            return Err(PrimitiveError::InvalidVaultKey {
                key,
                segment: String::new(),
            });
        }
        if key_type == KeyType::Folder {
            key.push('/');
        }
        Ok(Self(key.into_boxed_str()))
    }

    /// Access the key in wire form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind implied by the key shape.
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        if self.0.ends_with('/') {
            KeyType::Folder
        } else {
            KeyType::File
        }
    }

    /// Same path, re-shaped for the given kind.
    #[must_use]
    pub fn with_key_type(self, key_type: KeyType) -> Self {
        if self.key_type() == key_type {
            return self;
        }
        let body = self.0.trim_end_matches('/');
        match key_type {
            KeyType::Folder => Self(format!("{body}/").into_boxed_str()),
            KeyType::File => Self(body.into()),
        }
    }
}

impl TryFrom<String> for VaultKey {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<VaultKey> for String {
    fn from(value: VaultKey) -> Self {
        value.0.into()
    }
}

impl AsRef<str> for VaultKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for VaultKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// History store key: `<session>\t<vault key>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryKey(Box<str>);

impl HistoryKey {
    /// Compose the storage key for a session and item.
    #[must_use]
    pub fn new(session_id: &SessionId, key: &VaultKey) -> Self {
        Self(format!("{}\t{}", session_id.as_str(), key.as_str()).into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HistoryKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
