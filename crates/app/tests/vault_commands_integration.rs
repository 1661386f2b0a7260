//! Integration tests for the `.DS_Store` cleanup and config-directory commands.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tombstone_app::{
    CleanDsStoreInput, ConfigDirDeleteInput, DS_STORE_PATTERN, DeletionDeps, SelectionStatus,
    VaultCommandDeps, clean_ds_store, delete_in_config_dir,
};
use tombstone_domain::{OnItemFailure, OsKind, PlatformCapabilities, SelectionKind, SessionId};
use tombstone_ports::{SelectionRequest, SyncCollaborator};
use tombstone_shared::{ErrorCode, RequestContext, Result};
use tombstone_testkit::in_memory::{
    FixedClock, InMemoryFileSystem, InMemoryHistorySink, InMemoryNotifier, NoopLogger,
    NoopTelemetry, RecordingSyncTrigger, StaticSelection,
};

struct Harness {
    fs: Arc<InMemoryFileSystem>,
    history: Arc<InMemoryHistorySink>,
    trigger: Arc<RecordingSyncTrigger>,
    notifier: Arc<InMemoryNotifier>,
    selection: Arc<StaticSelection>,
    deps: VaultCommandDeps,
}

fn harness(fs: InMemoryFileSystem, selection: StaticSelection, os: OsKind) -> Result<Harness> {
    let fs = Arc::new(fs);
    let history = Arc::new(InMemoryHistorySink::new());
    let trigger = Arc::new(RecordingSyncTrigger::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let selection = Arc::new(selection);
    let deps = VaultCommandDeps {
        deletion: DeletionDeps {
            fs: fs.clone(),
            collaborator: Some(SyncCollaborator {
                history: history.clone(),
                trigger: trigger.clone(),
                session_id: SessionId::parse("vault-rand-2")?,
            }),
            clock: Arc::new(FixedClock(42)),
            notifier: Some(notifier.clone()),
            logger: Some(Arc::new(NoopLogger)),
            telemetry: Some(Arc::new(NoopTelemetry)),
        },
        selection: selection.clone(),
        platform: PlatformCapabilities::new(os),
    };
    Ok(Harness {
        fs,
        history,
        trigger,
        notifier,
        selection,
        deps,
    })
}

fn ds_store_input() -> CleanDsStoreInput {
    CleanDsStoreInput {
        vault_root: PathBuf::from("/vault"),
        on_item_failure: OnItemFailure::Abort,
    }
}

fn config_input(kind: SelectionKind) -> ConfigDirDeleteInput {
    ConfigDirDeleteInput {
        vault_root: PathBuf::from("/vault"),
        config_dir: ".obsidian".to_owned(),
        kind,
        on_item_failure: OnItemFailure::Abort,
    }
}

fn config_tree() -> InMemoryFileSystem {
    InMemoryFileSystem::new()
        .with_file("/vault/.obsidian/workspace.json", 30)
        .with_file("/vault/.obsidian/plugins/foo/main.js", 300)
        .with_file("/vault/.obsidian/plugins/foo/data.json", 3)
}

#[tokio::test]
async fn ds_store_cleanup_reports_written_count() -> Result<()> {
    let fs = InMemoryFileSystem::new()
        .with_file("/vault/.DS_Store", 6)
        .with_file("/vault/notes/.DS_Store", 6)
        .with_file("/vault/notes/a.md", 1);
    let h = harness(
        fs,
        StaticSelection::new(vec![
            PathBuf::from("/vault/.DS_Store"),
            PathBuf::from("/vault/notes/.DS_Store"),
        ]),
        OsKind::MacOs,
    )?;
    let ctx = RequestContext::new_request();

    let output = clean_ds_store(&ctx, &h.deps, ds_store_input()).await?;

    assert_eq!(output.matched, 2);
    assert_eq!(h.history.keys().await, vec![".DS_Store", "notes/.DS_Store"]);
    assert_eq!(h.notifier.messages(), vec!["2 .DS_Store files deleted in vault."]);
    assert_eq!(h.trigger.calls(), 1);
    assert!(h.fs.exists("/vault/notes/a.md").await);
    assert_eq!(
        h.selection.requests(),
        vec![SelectionRequest::Glob {
            root: PathBuf::from("/vault"),
            pattern: DS_STORE_PATTERN.into(),
        }]
    );
    Ok(())
}

#[tokio::test]
async fn ds_store_cleanup_is_silent_without_sync_engine() -> Result<()> {
    let fs = InMemoryFileSystem::new().with_file("/vault/.DS_Store", 6);
    let mut h = harness(
        fs,
        StaticSelection::new(vec![PathBuf::from("/vault/.DS_Store")]),
        OsKind::MacOs,
    )?;
    h.deps.deletion.collaborator = None;
    let ctx = RequestContext::new_request();

    let output = clean_ds_store(&ctx, &h.deps, ds_store_input()).await?;

    assert_eq!(output.matched, 1);
    let selection = output
        .selection
        .ok_or_else(|| io::Error::other("selection summary missing"))?;
    assert_eq!(selection.status, SelectionStatus::CollaboratorMissing);
    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.trigger.calls(), 0);
    assert!(h.history.is_empty().await);
    assert!(h.fs.exists("/vault/.DS_Store").await);
    Ok(())
}

#[tokio::test]
async fn ds_store_notice_counts_only_written_tombstones() -> Result<()> {
    let fs = InMemoryFileSystem::new().with_file("/vault/b/.DS_Store", 6);
    let h = harness(
        fs,
        StaticSelection::new(vec![
            PathBuf::from("/vault/a/.DS_Store"),
            PathBuf::from("/vault/b/.DS_Store"),
        ]),
        OsKind::Linux,
    )?;
    let ctx = RequestContext::new_request();

    let output = clean_ds_store(&ctx, &h.deps, ds_store_input()).await?;

    assert_eq!(output.matched, 2);
    let selection = output
        .selection
        .ok_or_else(|| io::Error::other("selection summary missing"))?;
    assert_eq!(selection.tombstones_written(), 1);
    assert_eq!(h.notifier.messages(), vec!["1 .DS_Store file deleted in vault."]);
    assert_eq!(h.trigger.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn ds_store_without_matches_does_not_sync() -> Result<()> {
    let h = harness(InMemoryFileSystem::new(), StaticSelection::new(Vec::new()), OsKind::MacOs)?;
    let ctx = RequestContext::new_request();

    let output = clean_ds_store(&ctx, &h.deps, ds_store_input()).await?;

    assert_eq!(output.matched, 0);
    assert!(output.selection.is_none());
    assert_eq!(h.notifier.messages(), vec!["No .DS_Store files found in vault."]);
    assert_eq!(h.trigger.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn mixed_pick_on_macos_deletes_files_and_folders() -> Result<()> {
    let h = harness(
        config_tree(),
        StaticSelection::new(vec![
            PathBuf::from("/vault/.obsidian/workspace.json"),
            PathBuf::from("/vault/.obsidian/plugins/foo"),
        ]),
        OsKind::MacOs,
    )?;
    let ctx = RequestContext::new_request();

    let output = delete_in_config_dir(&ctx, &h.deps, config_input(SelectionKind::Mixed)).await?;

    assert_eq!(output.command.id, "delete-in-obsidian-config");
    assert_eq!(
        h.history.keys().await,
        vec![
            ".obsidian/workspace.json",
            ".obsidian/plugins/foo/main.js",
            ".obsidian/plugins/foo/data.json",
            ".obsidian/plugins/foo/",
        ]
    );
    assert_eq!(h.trigger.calls(), 1);
    assert_eq!(
        h.notifier.messages().first().map(String::as_str),
        Some("File .obsidian/workspace.json deleted.")
    );
    assert_eq!(h.notifier.messages().len(), 4);
    assert_eq!(
        h.selection.requests(),
        vec![SelectionRequest::Picker {
            default_dir: PathBuf::from("/vault/.obsidian"),
            kind: SelectionKind::Mixed,
        }]
    );
    Ok(())
}

#[tokio::test]
async fn files_command_rejects_a_folder_pick_before_deleting() -> Result<()> {
    let h = harness(
        config_tree(),
        StaticSelection::new(vec![
            PathBuf::from("/vault/.obsidian/workspace.json"),
            PathBuf::from("/vault/.obsidian/plugins/foo"),
        ]),
        OsKind::Linux,
    )?;
    let ctx = RequestContext::new_request();

    let error = delete_in_config_dir(&ctx, &h.deps, config_input(SelectionKind::Files))
        .await
        .err()
        .ok_or_else(|| io::Error::other("folder pick should be rejected"))?;

    assert_eq!(error.code, ErrorCode::new("tombstone", "selection_kind_mismatch"));
    assert_eq!(error.metadata_value("expected"), Some("files"));
    assert!(h.history.is_empty().await);
    assert!(h.fs.exists("/vault/.obsidian/workspace.json").await);
    assert_eq!(h.trigger.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn folders_command_deletes_picked_folders() -> Result<()> {
    let h = harness(
        config_tree(),
        StaticSelection::new(vec![PathBuf::from("/vault/.obsidian/plugins/foo")]),
        OsKind::Windows,
    )?;
    let ctx = RequestContext::new_request();

    let output = delete_in_config_dir(&ctx, &h.deps, config_input(SelectionKind::Folders)).await?;

    assert_eq!(output.command.id, "delete-folders-in-obsidian-config");
    let selection = output
        .selection
        .ok_or_else(|| io::Error::other("selection summary missing"))?;
    assert_eq!(selection.tombstones_written(), 3);
    assert!(!h.fs.exists("/vault/.obsidian/plugins/foo").await);
    assert!(h.fs.exists("/vault/.obsidian/plugins").await);
    assert!(h.fs.exists("/vault/.obsidian/workspace.json").await);
    Ok(())
}

#[tokio::test]
async fn split_commands_are_unavailable_on_macos() -> Result<()> {
    let h = harness(config_tree(), StaticSelection::new(Vec::new()), OsKind::MacOs)?;
    let ctx = RequestContext::new_request();

    let error = delete_in_config_dir(&ctx, &h.deps, config_input(SelectionKind::Files))
        .await
        .err()
        .ok_or_else(|| io::Error::other("files command should be unavailable"))?;

    assert_eq!(error.code, ErrorCode::new("tombstone", "unsupported_on_platform"));
    assert_eq!(error.metadata_value("os"), Some("macos"));
    assert!(h.selection.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn dismissed_picker_is_a_no_op() -> Result<()> {
    let h = harness(config_tree(), StaticSelection::dismissed(), OsKind::Linux)?;
    let ctx = RequestContext::new_request();

    let output = delete_in_config_dir(&ctx, &h.deps, config_input(SelectionKind::Folders)).await?;

    assert!(output.selection.is_none());
    assert!(h.history.is_empty().await);
    assert_eq!(h.trigger.calls(), 0);
    assert!(h.notifier.messages().is_empty());
    Ok(())
}
