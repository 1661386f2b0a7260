//! Stable error payloads for CLI output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tombstone_shared::{ErrorCode, ErrorEnvelope, ErrorKind};

/// Error metadata map.
pub type ErrorDtoMeta = BTreeMap<String, String>;

/// Error category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorDtoKind {
    /// Caller-correctable failure (bad input, missing paths).
    Expected,
    /// Bug or broken invariant.
    Invariant,
    /// Environment failure (filesystem, spawned processes).
    Unexpected,
}

/// Serializable error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    /// Stable code, e.g. `ERR_CONFIG_INVALID_JSON`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Error category.
    pub kind: ErrorDtoKind,
    /// Diagnostic metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ErrorDtoMeta>,
}

/// Map an error envelope into its stable payload.
#[must_use]
pub fn error_to_dto(envelope: &ErrorEnvelope) -> ErrorDto {
    ErrorDto {
        code: stable_code(&envelope.code),
        message: envelope.message.clone(),
        kind: match envelope.kind {
            ErrorKind::Expected => ErrorDtoKind::Expected,
            ErrorKind::Invariant => ErrorDtoKind::Invariant,
            ErrorKind::Unexpected => ErrorDtoKind::Unexpected,
        },
        meta: (!envelope.metadata.is_empty()).then(|| envelope.metadata.clone()),
    }
}

/// Returns true for failures caused by the environment rather than the caller or a bug.
#[must_use]
pub fn is_io_failure(envelope: &ErrorEnvelope) -> bool {
    envelope.kind == ErrorKind::Unexpected && envelope.code != ErrorCode::internal()
}

fn stable_code(code: &ErrorCode) -> String {
    format!(
        "ERR_{}_{}",
        sanitize_code_segment(code.namespace()),
        sanitize_code_segment(code.code())
    )
}

fn sanitize_code_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tombstone_shared::ErrorClass;

    #[test]
    fn dto_carries_stable_code_and_meta() -> Result<(), Box<dyn std::error::Error>> {
        let envelope = ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_session_id"),
            "bad session",
        )
        .with_metadata("field", "sync.sessionId");

        let dto = error_to_dto(&envelope);
        let meta = dto
            .meta
            .ok_or_else(|| std::io::Error::other("meta should be present"))?;
        assert_eq!(dto.code, "ERR_CONFIG_INVALID_SESSION_ID");
        assert_eq!(dto.kind, ErrorDtoKind::Expected);
        assert_eq!(meta.get("field").map(String::as_str), Some("sync.sessionId"));
        Ok(())
    }

    #[test]
    fn empty_metadata_is_omitted() -> Result<(), Box<dyn std::error::Error>> {
        let dto = error_to_dto(&ErrorEnvelope::invariant(ErrorCode::internal(), "boom"));
        let json = serde_json::to_string(&dto)?;
        assert!(!json.contains("meta"));
        assert!(json.contains("\"kind\":\"INVARIANT\""));
        Ok(())
    }

    #[test]
    fn io_failures_exclude_internal_errors() {
        let io = ErrorEnvelope::from_io(&std::io::Error::other("disk"), "test.io");
        let internal =
            ErrorEnvelope::unexpected(ErrorCode::internal(), "mtime", ErrorClass::NonRetriable);
        let expected = ErrorEnvelope::expected(ErrorCode::invalid_input(), "bad");
        assert!(is_io_failure(&io));
        assert!(!is_io_failure(&internal));
        assert!(!is_io_failure(&expected));
    }
}
