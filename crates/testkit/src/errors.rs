//! Test fixtures for shared error codes and envelopes.

use tombstone_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Codes the deletion use cases surface, by namespace.
pub fn tombstone_error_codes() -> Vec<ErrorCode> {
    [
        "history_write_failed",
        "removal_failed",
        "snapshot_failed",
        "list_failed",
        "path_outside_vault",
        "selection_kind_mismatch",
        "unsupported_on_platform",
    ]
    .into_iter()
    .map(|code| ErrorCode::new("tombstone", code))
    .collect()
}

/// A cancellation error fixture.
pub fn cancelled_error() -> ErrorEnvelope {
    ErrorEnvelope::cancelled("cancelled")
}

/// An invalid input error fixture.
pub fn invalid_input_error() -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::invalid_input(), "invalid input")
}

/// A retriable storage error fixture.
pub fn storage_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(ErrorCode::io(), "storage unavailable", ErrorClass::Retriable)
}
