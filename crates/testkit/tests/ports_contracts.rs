//! Contract tests for the in-memory port implementations.

use std::io;
use std::path::PathBuf;
use tombstone_domain::{KeyType, SessionId, StatInfo, VaultKey, build_tombstone};
use tombstone_ports::{
    DeletionFileSystemPort, EntryKind, HistoryKey, HistorySinkPort, SelectionKind,
    SelectionRequest, SelectionSourcePort, SyncTriggerPort,
};
use tombstone_shared::{RequestContext, Result};
use tombstone_testkit::in_memory::{
    DEFAULT_TIME_MS, DIRECTORY_SIZE, InMemoryFileSystem, InMemoryHistorySink,
    RecordingSyncTrigger, StaticSelection,
};

fn tombstone(raw_key: &str) -> Result<(HistoryKey, tombstone_domain::TombstoneRecord)> {
    let session = SessionId::parse("vault-1")?;
    let key = VaultKey::parse(raw_key)?;
    let stat = StatInfo {
        is_directory: key.key_type() == KeyType::Folder,
        ctime_ms: 1,
        mtime_ms: 2,
        size_bytes: 3,
    };
    let record = build_tombstone(key, &stat, &session, 10);
    Ok((HistoryKey::new(&session, &record.key), record))
}

#[tokio::test]
async fn filesystem_lists_children_in_insertion_order() -> Result<()> {
    let ctx = RequestContext::new_request();
    let fs = InMemoryFileSystem::new()
        .with_file("/vault/z.md", 1)
        .with_dir("/vault/sub")
        .with_file("/vault/a.md", 1)
        .with_file("/vault/sub/deep.md", 1);

    let entries = fs.list_dir(&ctx, PathBuf::from("/vault")).await?;
    let names: Vec<_> = entries.iter().map(|entry| entry.path.clone()).collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("/vault/z.md"),
            PathBuf::from("/vault/sub"),
            PathBuf::from("/vault/a.md"),
        ]
    );
    let sub = entries
        .get(1)
        .ok_or_else(|| io::Error::other("missing sub entry"))?;
    assert_eq!(sub.kind, EntryKind::Directory);

    let missing = fs.list_dir(&ctx, PathBuf::from("/vault/none")).await?;
    assert!(missing.is_empty());
    Ok(())
}

#[tokio::test]
async fn filesystem_snapshot_reports_stat_or_none() -> Result<()> {
    let ctx = RequestContext::new_request();
    let fs = InMemoryFileSystem::new().with_file_times("/vault/a.md", 7, 11, 12);

    let file = fs.snapshot(&ctx, PathBuf::from("/vault/a.md")).await?;
    assert_eq!(
        file,
        Some(StatInfo {
            is_directory: false,
            ctime_ms: 11,
            mtime_ms: 12,
            size_bytes: 7,
        })
    );

    let dir = fs
        .snapshot(&ctx, PathBuf::from("/vault"))
        .await?
        .ok_or_else(|| io::Error::other("vault dir missing"))?;
    assert!(dir.is_directory);
    assert_eq!(dir.size_bytes, DIRECTORY_SIZE);
    assert_eq!(dir.mtime_ms, DEFAULT_TIME_MS);

    assert_eq!(fs.snapshot(&ctx, PathBuf::from("/vault/b.md")).await?, None);
    Ok(())
}

#[tokio::test]
async fn filesystem_remove_all_is_recursive_and_tolerates_missing() -> Result<()> {
    let ctx = RequestContext::new_request();
    let fs = InMemoryFileSystem::new()
        .with_file("/vault/sub/a.md", 1)
        .with_file("/vault/sub/inner/b.md", 1)
        .with_file("/vault/keep.md", 1);

    fs.remove_all(&ctx, PathBuf::from("/vault/sub")).await?;
    fs.remove_all(&ctx, PathBuf::from("/vault/sub")).await?;

    assert!(!fs.exists("/vault/sub/inner/b.md").await);
    assert!(fs.exists("/vault/keep.md").await);
    assert_eq!(fs.removed().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn filesystem_injected_failures_surface_as_errors() {
    let ctx = RequestContext::new_request();
    let fs = InMemoryFileSystem::new()
        .with_file("/vault/locked.md", 1)
        .with_failing_removal("/vault/locked.md")
        .with_failing_snapshot("/vault/hidden.md");

    let removal = fs.remove_all(&ctx, PathBuf::from("/vault/locked.md")).await;
    assert!(removal.is_err());
    assert!(fs.exists("/vault/locked.md").await);

    let snapshot = fs.snapshot(&ctx, PathBuf::from("/vault/hidden.md")).await;
    assert!(snapshot.is_err());
}

#[tokio::test]
async fn history_sink_records_writes_in_order() -> Result<()> {
    let ctx = RequestContext::new_request();
    let sink = InMemoryHistorySink::new().with_failing_key("bad.md");

    for raw in ["a/b.json", "a/"] {
        let (key, record) = tombstone(raw)?;
        sink.set_item(&ctx, key, record).await?;
    }
    let (key, record) = tombstone("bad.md")?;
    assert!(sink.set_item(&ctx, key, record).await.is_err());

    assert_eq!(sink.keys().await, vec!["a/b.json".to_owned(), "a/".to_owned()]);
    let writes = sink.writes().await;
    let (first_key, _) = writes
        .first()
        .ok_or_else(|| io::Error::other("no writes"))?;
    assert_eq!(first_key.as_str(), "vault-1\ta/b.json");
    Ok(())
}

#[tokio::test]
async fn cancelled_context_rejects_operations() {
    let ctx = RequestContext::new_request();
    ctx.cancel();
    let fs = InMemoryFileSystem::new().with_file("/vault/a.md", 1);

    let result = fs.remove_all(&ctx, PathBuf::from("/vault/a.md")).await;
    assert!(result.is_err_and(|error| error.is_cancelled()));
    assert!(fs.exists("/vault/a.md").await);
}

#[test]
fn sync_trigger_counts_requests() {
    let ctx = RequestContext::new_request();
    let trigger = RecordingSyncTrigger::default();
    assert!(trigger.start_sync(&ctx).is_ok());
    assert_eq!(trigger.calls(), 1);
    assert_eq!(trigger.command_id(), "remotely-save:start-sync");

    let failing = RecordingSyncTrigger::failing("x:y");
    assert!(failing.start_sync(&ctx).is_err());
    assert_eq!(failing.calls(), 1);
}

#[tokio::test]
async fn static_selection_records_requests() -> Result<()> {
    let ctx = RequestContext::new_request();
    let selection = StaticSelection::new(vec![PathBuf::from("/vault/.obsidian/a.json")]);
    let request = SelectionRequest::Picker {
        default_dir: PathBuf::from("/vault/.obsidian"),
        kind: SelectionKind::Files,
    };

    let picks = selection.select(&ctx, request.clone()).await?;
    assert_eq!(picks.map(|picks| picks.len()), Some(1));
    assert_eq!(selection.requests(), vec![request]);

    let dismissed = StaticSelection::dismissed();
    assert_eq!(
        dismissed
            .select(
                &ctx,
                SelectionRequest::Glob {
                    root: PathBuf::from("/vault"),
                    pattern: "**/.DS_Store".into(),
                },
            )
            .await?,
        None
    );
    Ok(())
}
