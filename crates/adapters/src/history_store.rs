//! JSON-file history store adapter.
//!
//! The store is a single JSON object keyed by storage key. Each write is a
//! read-modify-write of the whole file, replaced atomically via a temp file.

use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tombstone_ports::{BoxFuture, HistoryKey, HistorySinkPort, TombstoneRecord};
use tombstone_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};

/// History sink persisting records into a JSON object file.
///
/// `set_item` rewrites the whole file before returning, so a selection of N
/// items costs N full store rewrites. Every returned write is already on
/// disk.
#[derive(Debug)]
pub struct JsonFileHistorySink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileHistorySink {
    /// Build a sink for the store file at `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry currently in the store. A missing file is empty.
    pub async fn load_entries(&self) -> Result<Map<String, Value>> {
        load_store(&self.path).await
    }
}

impl HistorySinkPort for JsonFileHistorySink {
    fn set_item(
        &self,
        _ctx: &RequestContext,
        key: HistoryKey,
        record: TombstoneRecord,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let value = serde_json::to_value(&record).map_err(|error| {
                ErrorEnvelope::invariant(ErrorCode::internal(), error.to_string())
                    .with_metadata("operation", "history.encode")
            })?;

            let _guard = self.write_lock.lock().await;
            let mut entries = load_store(&self.path).await?;
            entries.insert(key.as_str().to_owned(), value);
            write_store(&self.path, &entries).await
        })
    }
}

async fn load_store(path: &Path) -> Result<Map<String, Value>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(error) => return Err(store_io_error(&error, "history.read", path)),
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(&raw) {
        Ok(Value::Object(entries)) => Ok(entries),
        Ok(_) => Err(corrupt_store(path, "history store is not a JSON object")),
        Err(error) => Err(corrupt_store(path, &error.to_string())),
    }
}

async fn write_store(path: &Path, entries: &Map<String, Value>) -> Result<()> {
    let mut encoded = serde_json::to_vec_pretty(entries).map_err(|error| {
        ErrorEnvelope::invariant(ErrorCode::internal(), error.to_string())
            .with_metadata("operation", "history.encode")
    })?;
    encoded.push(b'\n');

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    tokio::fs::write(&temp_path, &encoded)
        .await
        .map_err(|error| store_io_error(&error, "history.write", &temp_path))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|error| store_io_error(&error, "history.write", path))
}

fn store_io_error(error: &io::Error, operation: &'static str, path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::from_io(error, operation).with_metadata("path", path.display().to_string())
}

fn corrupt_store(path: &Path, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("tombstone", "history_store_corrupt"),
        message,
        ErrorClass::NonRetriable,
    )
    .with_metadata("path", path.display().to_string())
}
