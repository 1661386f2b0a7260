//! Delete vault paths, recording a sync tombstone before each removal.

use crate::walker;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tombstone_domain::{
    DeletionError, EntryKind, HistoryKey, OnItemFailure, TombstoneRecord, VaultKey,
    WalkEntry, build_tombstone, resolve_vault_path, vault_relative_key,
};
use tombstone_ports::{
    ClockPort, DeletionFileSystemPort, LogFields, LogLevel, LoggerPort, NotifierPort,
    SyncCollaborator, TelemetryPort, log_fields, metric_names,
};
use tombstone_shared::{ErrorEnvelope, RequestContext, Result};

/// Dependencies shared by the deletion use cases.
#[derive(Clone)]
pub struct DeletionDeps {
    /// Filesystem adapter.
    pub fs: Arc<dyn DeletionFileSystemPort>,
    /// Installed sync engine; `None` turns every deletion into a no-op.
    pub collaborator: Option<SyncCollaborator>,
    /// Clock for `actionWhen`.
    pub clock: Arc<dyn ClockPort>,
    /// Optional user notifications.
    pub notifier: Option<Arc<dyn NotifierPort>>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Result of deleting a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Tombstone written and path removed.
    Deleted(TombstoneRecord),
    /// The path did not exist; nothing was written.
    AlreadyAbsent,
    /// No sync engine is installed; nothing was touched.
    CollaboratorMissing,
}

/// Input payload for deleting a selection.
#[derive(Debug, Clone)]
pub struct DeleteSelectionInput {
    /// Absolute vault root.
    pub vault_root: PathBuf,
    /// Selected absolute paths, in order.
    pub paths: Vec<PathBuf>,
    /// Batch behavior after an item fails.
    pub on_item_failure: OnItemFailure,
    /// Emit a notice for every deleted item.
    pub notify_items: bool,
}

/// Overall selection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    /// Every item was processed without failure.
    Completed,
    /// Some items failed; the rest were processed.
    CompletedWithFailures,
    /// No sync engine is installed; nothing was touched.
    CollaboratorMissing,
}

impl SelectionStatus {
    /// Stable camelCase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedWithFailures => "completedWithFailures",
            Self::CollaboratorMissing => "collaboratorMissing",
        }
    }
}

/// An item that failed under the `continue` policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Absolute path of the item.
    pub path: PathBuf,
    /// Failure details.
    pub error: ErrorEnvelope,
}

/// Summary of a processed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSelectionOutput {
    /// Overall status.
    pub status: SelectionStatus,
    /// Keys deleted, in write order.
    pub deleted: Vec<VaultKey>,
    /// Items that were already gone.
    pub already_absent: usize,
    /// Failed items.
    pub failures: Vec<ItemFailure>,
    /// Directories left in place because part of their subtree failed.
    pub skipped: Vec<PathBuf>,
    /// Whether the sync trigger accepted the request.
    pub sync_triggered: bool,
}

impl DeleteSelectionOutput {
    fn new(status: SelectionStatus) -> Self {
        Self {
            status,
            deleted: Vec::new(),
            already_absent: 0,
            failures: Vec::new(),
            skipped: Vec::new(),
            sync_triggered: false,
        }
    }

    /// Number of tombstones written.
    #[must_use]
    pub fn tombstones_written(&self) -> usize {
        self.deleted.len()
    }
}

/// Delete one path: snapshot, write its tombstone, then remove it.
///
/// A missing path or a missing sync engine is not an error.
pub async fn delete_one(
    ctx: &RequestContext,
    deps: &DeletionDeps,
    vault_root: &Path,
    path: &Path,
) -> Result<ItemOutcome> {
    let Some(collaborator) = deps.collaborator.as_ref() else {
        return Ok(ItemOutcome::CollaboratorMissing);
    };
    ctx.ensure_not_cancelled("delete_one.start")?;
    let path = &resolve_vault_path(vault_root, path)
        .map_err(|error| ErrorEnvelope::from(DeletionError::from(error)))?;

    delete_item(ctx, deps, collaborator, vault_root, path)
        .await
        .map_err(|error| {
            let envelope = ErrorEnvelope::from(error);
            log_item_failure(deps, path, &envelope);
            envelope
        })
}

/// Delete every selected path, children before parents, then request a sync once.
///
/// Paths are validated against the vault root before anything is touched.
/// Under [`OnItemFailure::Abort`] the first failure stops the batch; the sync
/// is still requested and the error is returned with `tombstonesWritten` and
/// `syncTriggered` metadata.
pub async fn delete_selection(
    ctx: &RequestContext,
    deps: &DeletionDeps,
    input: DeleteSelectionInput,
) -> Result<DeleteSelectionOutput> {
    ctx.ensure_not_cancelled("delete_selection.start")?;

    let Some(collaborator) = deps.collaborator.as_ref() else {
        if let Some(logger) = deps.logger.as_ref() {
            logger.info(
                "delete.selection.skipped",
                "Sync engine not installed; nothing deleted",
                Some(log_fields([("selected", input.paths.len().into())])),
            );
        }
        return Ok(DeleteSelectionOutput::new(
            SelectionStatus::CollaboratorMissing,
        ));
    };

    let paths = input
        .paths
        .iter()
        .map(|path| {
            resolve_vault_path(&input.vault_root, path)
                .map_err(|error| ErrorEnvelope::from(DeletionError::from(error)))
        })
        .collect::<Result<Vec<_>>>()?;
    let input = DeleteSelectionInput { paths, ..input };

    let started_at = Instant::now();
    let timer = deps
        .telemetry
        .as_ref()
        .map(|telemetry| telemetry.start_timer(metric_names::SELECTION_TIMER, None));
    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "delete.selection.start",
            "Delete selection started",
            Some(log_fields_start(&input)),
        );
    }

    let mut batch = Batch {
        deps,
        collaborator,
        input: &input,
        output: DeleteSelectionOutput::new(SelectionStatus::Completed),
        blocked: Vec::new(),
    };
    let result = batch.run(ctx).await;
    let mut output = batch.output;
    output.sync_triggered = request_sync(ctx, deps, collaborator);

    if let Some(timer) = timer.as_ref() {
        timer.stop();
    }

    match result {
        Ok(()) => {
            if !output.failures.is_empty() {
                output.status = SelectionStatus::CompletedWithFailures;
            }
            if let Some(logger) = deps.logger.as_ref() {
                logger.info(
                    "delete.selection.completed",
                    "Delete selection completed",
                    Some(log_fields_completed(&output, started_at)),
                );
            }
            Ok(output)
        },
        Err(error) => {
            let envelope = ErrorEnvelope::from(error)
                .with_metadata("tombstonesWritten", output.tombstones_written().to_string())
                .with_metadata("syncTriggered", output.sync_triggered.to_string());
            if let Some(logger) = deps.logger.as_ref() {
                logger.failure(
                    LogLevel::Error,
                    "delete.selection.failed",
                    "Delete selection aborted",
                    Some(log_fields_completed(&output, started_at)),
                    &envelope,
                );
            }
            Err(envelope)
        },
    }
}

struct Batch<'a> {
    deps: &'a DeletionDeps,
    collaborator: &'a SyncCollaborator,
    input: &'a DeleteSelectionInput,
    output: DeleteSelectionOutput,
    blocked: Vec<PathBuf>,
}

impl Batch<'_> {
    async fn run(&mut self, ctx: &RequestContext) -> Result<(), DeletionError> {
        let input = self.input;
        for path in &input.paths {
            let snapshot = self.deps.fs.snapshot(ctx, path.clone()).await;
            let stat = match snapshot {
                Ok(Some(stat)) => stat,
                Ok(None) => {
                    self.output.already_absent += 1;
                    continue;
                },
                Err(cause) => {
                    let error = DeletionError::snapshot(path.display().to_string(), cause);
                    self.fail(path, error)?;
                    continue;
                },
            };

            if !stat.is_directory {
                self.process(ctx, WalkEntry::file(path.clone())).await?;
                continue;
            }

            let entries = match walker::enumerate(ctx, self.deps.fs.as_ref(), path).await {
                Ok(entries) => entries,
                Err(error) => {
                    self.fail(path, error)?;
                    continue;
                },
            };
            for entry in entries {
                self.process(ctx, entry).await?;
            }
            self.process(ctx, WalkEntry::directory(path.clone())).await?;
        }
        Ok(())
    }

    async fn process(&mut self, ctx: &RequestContext, entry: WalkEntry) -> Result<(), DeletionError> {
        if entry.kind == EntryKind::Directory
            && self.blocked.iter().any(|failed| failed.starts_with(&entry.path))
        {
            if let Some(logger) = self.deps.logger.as_ref() {
                logger.warn(
                    "delete.item.skipped",
                    "Directory kept because part of its subtree failed",
                    Some(path_fields(&entry.path)),
                );
            }
            self.output.skipped.push(entry.path);
            return Ok(());
        }

        match delete_item(ctx, self.deps, self.collaborator, &self.input.vault_root, &entry.path)
            .await
        {
            Ok(ItemOutcome::Deleted(record)) => {
                if self.input.notify_items
                    && let Some(notifier) = self.deps.notifier.as_ref()
                {
                    notifier.notify(&format!("File {} deleted.", record.key));
                }
                self.output.deleted.push(record.key);
                Ok(())
            },
            Ok(ItemOutcome::AlreadyAbsent | ItemOutcome::CollaboratorMissing) => {
                self.output.already_absent += 1;
                Ok(())
            },
            Err(error) => self.fail(&entry.path, error),
        }
    }

    fn fail(&mut self, path: &Path, error: DeletionError) -> Result<(), DeletionError> {
        if self.input.on_item_failure == OnItemFailure::Abort {
            return Err(error);
        }
        let envelope = ErrorEnvelope::from(error);
        log_item_failure(self.deps, path, &envelope);
        self.output.failures.push(ItemFailure {
            path: path.to_path_buf(),
            error: envelope,
        });
        self.blocked.push(path.to_path_buf());
        Ok(())
    }
}

async fn delete_item(
    ctx: &RequestContext,
    deps: &DeletionDeps,
    collaborator: &SyncCollaborator,
    vault_root: &Path,
    path: &Path,
) -> Result<ItemOutcome, DeletionError> {
    let display = || path.display().to_string();

    let snapshot = deps
        .fs
        .snapshot(ctx, path.to_path_buf())
        .await
        .map_err(|cause| DeletionError::snapshot(display(), cause))?;
    let Some(stat) = snapshot else {
        increment(deps, metric_names::ITEM_ABSENT);
        if let Some(logger) = deps.logger.as_ref() {
            logger.debug("delete.item.absent", "Item already absent", Some(path_fields(path)));
        }
        return Ok(ItemOutcome::AlreadyAbsent);
    };

    let key = vault_relative_key(vault_root, path, stat.key_type())?;
    let record = build_tombstone(key, &stat, &collaborator.session_id, deps.clock.now_ms());
    let history_key = HistoryKey::new(&collaborator.session_id, &record.key);
    collaborator
        .history
        .set_item(ctx, history_key.clone(), record.clone())
        .await
        .map_err(|cause| DeletionError::history_write(history_key.as_str(), cause))?;
    increment(deps, metric_names::TOMBSTONE_WRITTEN);

    deps.fs
        .remove_all(ctx, path.to_path_buf())
        .await
        .map_err(|cause| DeletionError::removal(display(), cause))?;
    increment(deps, metric_names::ITEM_REMOVED);

    if let Some(logger) = deps.logger.as_ref() {
        logger.debug(
            "delete.item.removed",
            "Tombstone written and item removed",
            Some(log_fields([
                ("key", record.key.as_str().into()),
                ("keyType", record.key_type.as_str().into()),
            ])),
        );
    }
    Ok(ItemOutcome::Deleted(record))
}

fn request_sync(
    ctx: &RequestContext,
    deps: &DeletionDeps,
    collaborator: &SyncCollaborator,
) -> bool {
    match collaborator.trigger.start_sync(ctx) {
        Ok(()) => {
            increment(deps, metric_names::SYNC_TRIGGERED);
            if let Some(logger) = deps.logger.as_ref() {
                logger.debug(
                    "sync.trigger.requested",
                    "Sync requested",
                    Some(log_fields([(
                        "commandId",
                        collaborator.trigger.command_id().into(),
                    )])),
                );
            }
            true
        },
        Err(error) => {
            if let Some(logger) = deps.logger.as_ref() {
                logger.failure(
                    LogLevel::Warn,
                    "sync.trigger.failed",
                    "Sync request failed",
                    Some(log_fields([(
                        "commandId",
                        collaborator.trigger.command_id().into(),
                    )])),
                    &error,
                );
            }
            false
        },
    }
}

fn increment(deps: &DeletionDeps, name: &str) {
    if let Some(telemetry) = deps.telemetry.as_ref() {
        telemetry.increment_counter(name, 1, None);
    }
}

fn log_item_failure(deps: &DeletionDeps, path: &Path, error: &ErrorEnvelope) {
    increment(deps, metric_names::ITEM_FAILED);
    if let Some(logger) = deps.logger.as_ref() {
        logger.failure(
            LogLevel::Warn,
            "delete.item.failed",
            "Item deletion failed",
            Some(path_fields(path)),
            error,
        );
    }
}

fn path_fields(path: &Path) -> LogFields {
    log_fields([("path", Value::String(path.display().to_string()))])
}

fn log_fields_start(input: &DeleteSelectionInput) -> LogFields {
    log_fields([
        ("vaultRoot", Value::String(input.vault_root.display().to_string())),
        ("selected", input.paths.len().into()),
        ("onItemFailure", input.on_item_failure.as_str().into()),
    ])
}

fn log_fields_completed(output: &DeleteSelectionOutput, started_at: Instant) -> LogFields {
    log_fields([
        ("tombstonesWritten", output.tombstones_written().into()),
        ("alreadyAbsent", output.already_absent.into()),
        ("failures", output.failures.len().into()),
        ("skipped", output.skipped.len().into()),
        ("syncTriggered", output.sync_triggered.into()),
        (
            "durationMs",
            u64::try_from(started_at.elapsed().as_millis())
                .unwrap_or(u64::MAX)
                .into(),
        ),
    ])
}
