//! Vault-level commands built on `delete_selection`.

use crate::delete::{
    DeleteSelectionInput, DeleteSelectionOutput, DeletionDeps, SelectionStatus, delete_selection,
};
use std::path::PathBuf;
use std::sync::Arc;
use tombstone_domain::{
    ConfigDirCommand, DeletionError, OnItemFailure, PlatformCapabilities, SelectionKind,
};
use tombstone_ports::{SelectionRequest, SelectionSourcePort, log_fields};
use tombstone_shared::{ErrorEnvelope, RequestContext, Result};

/// Glob used to find `.DS_Store` files anywhere in the vault.
pub const DS_STORE_PATTERN: &str = "**/.DS_Store";

/// Dependencies for the vault commands.
#[derive(Clone)]
pub struct VaultCommandDeps {
    /// Deletion dependencies.
    pub deletion: DeletionDeps,
    /// Source of selections (glob or picker).
    pub selection: Arc<dyn SelectionSourcePort>,
    /// Host platform facts.
    pub platform: PlatformCapabilities,
}

/// Input payload for the `.DS_Store` cleanup.
#[derive(Debug, Clone)]
pub struct CleanDsStoreInput {
    /// Absolute vault root.
    pub vault_root: PathBuf,
    /// Batch behavior after an item fails.
    pub on_item_failure: OnItemFailure,
}

/// Result of the `.DS_Store` cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanDsStoreOutput {
    /// Number of matched files.
    pub matched: usize,
    /// Selection summary; `None` when nothing matched.
    pub selection: Option<DeleteSelectionOutput>,
}

/// Delete every `.DS_Store` file in the vault.
///
/// No match yields a notice and nothing else, not even a sync request.
/// Without a sync engine the command stays silent.
pub async fn clean_ds_store(
    ctx: &RequestContext,
    deps: &VaultCommandDeps,
    input: CleanDsStoreInput,
) -> Result<CleanDsStoreOutput> {
    let request = SelectionRequest::Glob {
        root: input.vault_root.clone(),
        pattern: DS_STORE_PATTERN.into(),
    };
    let matches = deps.selection.select(ctx, request).await?.unwrap_or_default();

    if matches.is_empty() {
        notify(&deps.deletion, "No .DS_Store files found in vault.");
        return Ok(CleanDsStoreOutput {
            matched: 0,
            selection: None,
        });
    }

    let matched = matches.len();
    let output = delete_selection(
        ctx,
        &deps.deletion,
        DeleteSelectionInput {
            vault_root: input.vault_root,
            paths: matches,
            on_item_failure: input.on_item_failure,
            notify_items: false,
        },
    )
    .await?;

    if output.status == SelectionStatus::CollaboratorMissing {
        return Ok(CleanDsStoreOutput {
            matched,
            selection: Some(output),
        });
    }

    let written = output.tombstones_written();
    let plural = if written == 1 { "" } else { "s" };
    notify(
        &deps.deletion,
        &format!("{written} .DS_Store file{plural} deleted in vault."),
    );

    Ok(CleanDsStoreOutput {
        matched,
        selection: Some(output),
    })
}

/// Input payload for a config-directory deletion.
#[derive(Debug, Clone)]
pub struct ConfigDirDeleteInput {
    /// Absolute vault root.
    pub vault_root: PathBuf,
    /// Config directory name relative to the vault root.
    pub config_dir: String,
    /// Requested selection kind.
    pub kind: SelectionKind,
    /// Batch behavior after an item fails.
    pub on_item_failure: OnItemFailure,
}

/// Result of a config-directory deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDirDeleteOutput {
    /// Command that ran.
    pub command: ConfigDirCommand,
    /// Selection summary; `None` when the picker was dismissed.
    pub selection: Option<DeleteSelectionOutput>,
}

/// Delete picked files and/or folders inside the config directory.
///
/// Existing picks must match the command's selection kind; a mismatch
/// rejects the whole pick before anything is deleted. Missing picks are
/// skipped by the deletion itself.
pub async fn delete_in_config_dir(
    ctx: &RequestContext,
    deps: &VaultCommandDeps,
    input: ConfigDirDeleteInput,
) -> Result<ConfigDirDeleteOutput> {
    let command = deps.platform.command_for(input.kind).ok_or_else(|| {
        ErrorEnvelope::from(DeletionError::UnsupportedOnPlatform {
            kind: input.kind,
            os: deps.platform.os(),
        })
    })?;

    let default_dir = deps
        .platform
        .default_config_dir(&input.vault_root, &input.config_dir);
    let request = SelectionRequest::Picker {
        default_dir,
        kind: input.kind,
    };
    let Some(picks) = deps.selection.select(ctx, request).await? else {
        if let Some(logger) = deps.deletion.logger.as_ref() {
            logger.info(
                "config_dir.dismissed",
                "Picker dismissed",
                Some(log_fields([("commandId", command.id.into())])),
            );
        }
        return Ok(ConfigDirDeleteOutput {
            command,
            selection: None,
        });
    };

    for pick in &picks {
        let stat = deps
            .deletion
            .fs
            .snapshot(ctx, pick.clone())
            .await
            .map_err(|cause| DeletionError::snapshot(pick.display().to_string(), cause))?;
        if let Some(stat) = stat
            && !input.kind.accepts(stat.is_directory)
        {
            return Err(DeletionError::SelectionKindMismatch {
                path: pick.display().to_string(),
                expected: input.kind,
            }
            .into());
        }
    }

    let output = delete_selection(
        ctx,
        &deps.deletion,
        DeleteSelectionInput {
            vault_root: input.vault_root,
            paths: picks,
            on_item_failure: input.on_item_failure,
            notify_items: true,
        },
    )
    .await?;

    Ok(ConfigDirDeleteOutput {
        command,
        selection: Some(output),
    })
}

fn notify(deps: &DeletionDeps, message: &str) {
    if let Some(notifier) = deps.notifier.as_ref() {
        notifier.notify(message);
    }
}
