//! Selection source adapters: glob matching and pre-supplied picks.

use glob::{MatchOptions, Pattern};
use std::path::PathBuf;
use tombstone_ports::{BoxFuture, SelectionRequest, SelectionSourcePort};
use tombstone_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Selection source for a non-interactive host.
///
/// Glob requests are matched against the local filesystem. Picker requests
/// return the picks supplied at construction, resolving relative paths
/// against the picker's default directory; no picks means the picker was
/// dismissed.
#[derive(Debug, Clone, Default)]
pub struct LocalSelectionSource {
    picks: Option<Vec<PathBuf>>,
}

impl LocalSelectionSource {
    /// Source with no picks (every picker request is dismissed).
    #[must_use]
    pub const fn new() -> Self {
        Self { picks: None }
    }

    /// Source answering picker requests with `picks`.
    #[must_use]
    pub const fn with_picks(picks: Vec<PathBuf>) -> Self {
        Self { picks: Some(picks) }
    }
}

impl SelectionSourcePort for LocalSelectionSource {
    fn select(
        &self,
        _ctx: &RequestContext,
        request: SelectionRequest,
    ) -> BoxFuture<'_, Result<Option<Vec<PathBuf>>>> {
        Box::pin(async move {
            match request {
                SelectionRequest::Glob { root, pattern } => glob_matches(&root, &pattern).map(Some),
                SelectionRequest::Picker { default_dir, .. } => Ok(self.picks.as_ref().map(|picks| {
                    picks
                        .iter()
                        .map(|pick| default_dir.join(pick))
                        .collect()
                })),
            }
        })
    }
}

/// Match `pattern` under `root`, dot-files included. Unreadable directories
/// are skipped.
pub fn glob_matches(root: &std::path::Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let root_str = root.to_str().ok_or_else(|| {
        ErrorEnvelope::expected(ErrorCode::invalid_input(), "glob root is not valid UTF-8")
            .with_metadata("root", root.display().to_string())
    })?;
    let full_pattern = format!(
        "{}/{}",
        Pattern::escape(root_str.trim_end_matches(['/', '\\'])),
        pattern
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let paths = glob::glob_with(&full_pattern, options).map_err(|error| {
        ErrorEnvelope::expected(ErrorCode::invalid_input(), error.to_string())
            .with_metadata("pattern", pattern.to_owned())
    })?;
    Ok(paths.filter_map(std::result::Result::ok).collect())
}
