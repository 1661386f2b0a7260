//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests of the deletion use cases
//! - Deterministic ordering (listings follow insertion order)
//! - Fault injection on specific paths and keys

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;
use tombstone_ports::{
    BoxFuture, ClockPort, DeletionFileSystemPort, EntryKind, FileSystemDirEntry, HistoryKey,
    HistorySinkPort, LogEvent, LogFields, LogLevel, LoggerPort, NotifierPort, SelectionRequest,
    SelectionSourcePort, StatInfo, SyncTriggerPort, TelemetryPort, TelemetryTags, TelemetryTimer,
    TombstoneRecord,
};
use tombstone_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Change/modification time given to nodes that do not set one.
pub const DEFAULT_TIME_MS: i64 = 1_700_000_000_000;

/// Size reported for directories.
pub const DIRECTORY_SIZE: u64 = 4096;

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingLogger {
    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the recorded events, in order.
    pub fn event_names(&self) -> Vec<String> {
        self.events().iter().map(|event| event.event.to_string()).collect()
    }

    /// Recorded events at `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .collect()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, event: LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(NoopLogger)
    }
}

/// A no-op telemetry timer.
#[derive(Debug, Default)]
pub struct NoopTimer;

impl TelemetryTimer for NoopTimer {
    fn stop(&self) {}
}

/// A no-op telemetry implementation.
#[derive(Debug, Default)]
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn increment_counter(&self, _name: &str, _value: u64, _tags: Option<&TelemetryTags>) {}

    fn record_timer_ms(&self, _name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {}

    fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(NoopTimer)
    }
}

/// Telemetry that sums counters by name.
#[derive(Debug, Default)]
pub struct CountingTelemetry {
    counters: Mutex<Vec<(String, u64)>>,
}

impl CountingTelemetry {
    /// Total recorded for `name`.
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(counter, _)| counter == name)
            .map(|(_, value)| value)
            .sum()
    }
}

impl TelemetryPort for CountingTelemetry {
    fn increment_counter(&self, name: &str, value: u64, _tags: Option<&TelemetryTags>) {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_owned(), value));
    }

    fn record_timer_ms(&self, _name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {}

    fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(NoopTimer)
    }
}

#[derive(Debug, Clone)]
struct Node {
    path: PathBuf,
    stat: StatInfo,
}

#[derive(Debug, Default)]
struct FsState {
    nodes: Vec<Node>,
    failing_snapshots: HashSet<PathBuf>,
    failing_removals: HashSet<PathBuf>,
    removed: Vec<PathBuf>,
}

impl FsState {
    fn contains(&self, path: &Path) -> bool {
        self.nodes.iter().any(|node| node.path == path)
    }

    fn ensure_dir(&mut self, path: &Path) {
        if self.contains(path) {
            return;
        }
        if let Some(parent) = path.parent()
            && parent.parent().is_some()
        {
            self.ensure_dir(parent);
        }
        self.nodes.push(Node {
            path: path.to_path_buf(),
            stat: StatInfo {
                is_directory: true,
                ctime_ms: DEFAULT_TIME_MS,
                mtime_ms: DEFAULT_TIME_MS,
                size_bytes: DIRECTORY_SIZE,
            },
        });
    }

    fn insert_file(&mut self, path: &Path, stat: StatInfo) {
        if let Some(parent) = path.parent()
            && parent.parent().is_some()
        {
            self.ensure_dir(parent);
        }
        self.nodes.retain(|node| node.path != path);
        self.nodes.push(Node {
            path: path.to_path_buf(),
            stat,
        });
    }
}

/// In-memory vault tree.
///
/// Directory listings follow insertion order, which lets tests pin the exact
/// deletion order. Parents are created on demand.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    state: RwLock<FsState>,
}

impl InMemoryFileSystem {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory (and any missing parents).
    #[must_use]
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.state.get_mut().ensure_dir(path.as_ref());
        self
    }

    /// Add a file with default times.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, size_bytes: u64) -> Self {
        self.with_file_times(path, size_bytes, DEFAULT_TIME_MS, DEFAULT_TIME_MS)
    }

    /// Add a file with explicit times.
    #[must_use]
    pub fn with_file_times(
        mut self,
        path: impl AsRef<Path>,
        size_bytes: u64,
        ctime_ms: i64,
        mtime_ms: i64,
    ) -> Self {
        self.state.get_mut().insert_file(
            path.as_ref(),
            StatInfo {
                is_directory: false,
                ctime_ms,
                mtime_ms,
                size_bytes,
            },
        );
        self
    }

    /// Make `snapshot` fail for `path`.
    #[must_use]
    pub fn with_failing_snapshot(mut self, path: impl AsRef<Path>) -> Self {
        self.state
            .get_mut()
            .failing_snapshots
            .insert(path.as_ref().to_path_buf());
        self
    }

    /// Make `remove_all` fail for `path`.
    #[must_use]
    pub fn with_failing_removal(mut self, path: impl AsRef<Path>) -> Self {
        self.state
            .get_mut()
            .failing_removals
            .insert(path.as_ref().to_path_buf());
        self
    }

    /// Returns true if `path` is still present.
    pub async fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.state.read().await.contains(path.as_ref())
    }

    /// Paths passed to successful `remove_all` calls, in order.
    pub async fn removed(&self) -> Vec<PathBuf> {
        self.state.read().await.removed.clone()
    }

    /// Every path still present, in insertion order.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.state
            .read()
            .await
            .nodes
            .iter()
            .map(|node| node.path.clone())
            .collect()
    }

    /// Remove `path` without recording it, simulating a concurrent deletion.
    pub async fn vanish(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.state
            .write()
            .await
            .nodes
            .retain(|node| !node.path.starts_with(path));
    }
}

fn injected_failure(operation: &'static str, path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::from_io(
        &io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("injected failure for {}", path.display()),
        ),
        operation,
    )
}

impl DeletionFileSystemPort for InMemoryFileSystem {
    fn snapshot(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Option<StatInfo>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory_fs.snapshot")?;
            let state = self.state.read().await;
            if state.failing_snapshots.contains(&path) {
                return Err(injected_failure("fs.snapshot", &path));
            }
            Ok(state
                .nodes
                .iter()
                .find(|node| node.path == path)
                .map(|node| node.stat))
        })
    }

    fn list_dir(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory_fs.list_dir")?;
            let state = self.state.read().await;
            Ok(state
                .nodes
                .iter()
                .filter(|node| node.path.parent() == Some(path.as_path()))
                .map(|node| FileSystemDirEntry {
                    path: node.path.clone(),
                    kind: if node.stat.is_directory {
                        EntryKind::Directory
                    } else {
                        EntryKind::File
                    },
                })
                .collect())
        })
    }

    fn remove_all(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory_fs.remove_all")?;
            let mut state = self.state.write().await;
            if state.failing_removals.contains(&path) {
                return Err(injected_failure("fs.remove", &path));
            }
            state.nodes.retain(|node| !node.path.starts_with(&path));
            state.removed.push(path);
            Ok(())
        })
    }
}

/// In-memory history store keeping writes in order.
#[derive(Debug, Default)]
pub struct InMemoryHistorySink {
    writes: RwLock<Vec<(HistoryKey, TombstoneRecord)>>,
    failing_keys: HashSet<String>,
}

impl InMemoryHistorySink {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose vault key equals `key` (e.g. `a/b.json`, `a/`).
    #[must_use]
    pub fn with_failing_key(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Every accepted write, in order.
    pub async fn writes(&self) -> Vec<(HistoryKey, TombstoneRecord)> {
        self.writes.read().await.clone()
    }

    /// Vault keys of accepted writes, in order.
    pub async fn keys(&self) -> Vec<String> {
        self.writes
            .read()
            .await
            .iter()
            .map(|(_, record)| record.key.as_str().to_owned())
            .collect()
    }

    /// Number of accepted writes.
    pub async fn len(&self) -> usize {
        self.writes.read().await.len()
    }

    /// Returns true if nothing was written.
    pub async fn is_empty(&self) -> bool {
        self.writes.read().await.is_empty()
    }
}

impl HistorySinkPort for InMemoryHistorySink {
    fn set_item(
        &self,
        ctx: &RequestContext,
        key: HistoryKey,
        record: TombstoneRecord,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory_history.set_item")?;
            if self.failing_keys.contains(record.key.as_str()) {
                return Err(ErrorEnvelope::unexpected(
                    ErrorCode::io(),
                    format!("injected history failure for {}", record.key),
                    ErrorClass::Retriable,
                ));
            }
            self.writes.write().await.push((key, record));
            Ok(())
        })
    }
}

/// Sync trigger that counts requests.
#[derive(Debug)]
pub struct RecordingSyncTrigger {
    command_id: String,
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingSyncTrigger {
    /// Trigger addressed to `command_id`.
    #[must_use]
    pub fn new(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Trigger that counts requests and then rejects them.
    #[must_use]
    pub fn failing(command_id: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(command_id)
        }
    }

    /// Number of `start_sync` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for RecordingSyncTrigger {
    fn default() -> Self {
        Self::new("remotely-save:start-sync")
    }
}

impl SyncTriggerPort for RecordingSyncTrigger {
    fn start_sync(&self, _ctx: &RequestContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::new("sync", "trigger_failed"),
                "injected trigger failure",
                ErrorClass::NonRetriable,
            ));
        }
        Ok(())
    }

    fn command_id(&self) -> &str {
        &self.command_id
    }
}

/// Clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl ClockPort for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// Notifier that keeps every message.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl InMemoryNotifier {
    /// Messages shown so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotifierPort for InMemoryNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}

/// Selection source answering every request with a fixed pick.
#[derive(Debug, Default)]
pub struct StaticSelection {
    picks: Option<Vec<PathBuf>>,
    requests: Mutex<Vec<SelectionRequest>>,
}

impl StaticSelection {
    /// Answer with `picks`.
    #[must_use]
    pub fn new(picks: Vec<PathBuf>) -> Self {
        Self {
            picks: Some(picks),
            requests: Mutex::default(),
        }
    }

    /// Behave like a dismissed picker.
    #[must_use]
    pub fn dismissed() -> Self {
        Self::default()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<SelectionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SelectionSourcePort for StaticSelection {
    fn select(
        &self,
        _ctx: &RequestContext,
        request: SelectionRequest,
    ) -> BoxFuture<'_, Result<Option<Vec<PathBuf>>>> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);
            Ok(self.picks.clone())
        })
    }
}
