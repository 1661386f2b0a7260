//! Sync trigger adapters.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};
use tombstone_ports::SyncTriggerPort;
use tombstone_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequestMarker<'a> {
    command_id: &'a str,
    request_id: String,
    requested_at_ms: u64,
    correlation_id: &'a str,
}

/// Requests a sync by dropping a marker file the sync engine watches.
#[derive(Debug, Clone)]
pub struct MarkerFileSyncTrigger {
    marker_path: PathBuf,
    command_id: Box<str>,
}

impl MarkerFileSyncTrigger {
    /// Build a trigger writing to `marker_path`.
    #[must_use]
    pub fn new(marker_path: PathBuf, command_id: impl Into<Box<str>>) -> Self {
        Self {
            marker_path,
            command_id: command_id.into(),
        }
    }

    /// Marker file location.
    #[must_use]
    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }
}

impl SyncTriggerPort for MarkerFileSyncTrigger {
    fn start_sync(&self, ctx: &RequestContext) -> Result<()> {
        let marker = SyncRequestMarker {
            command_id: &self.command_id,
            request_id: uuid::Uuid::new_v4().to_string(),
            requested_at_ms: now_epoch_ms(),
            correlation_id: ctx.correlation_id().as_str(),
        };
        let mut encoded = serde_json::to_vec_pretty(&marker).map_err(|error| {
            ErrorEnvelope::invariant(ErrorCode::internal(), error.to_string())
                .with_metadata("operation", "sync.marker.encode")
        })?;
        encoded.push(b'\n');

        std::fs::write(&self.marker_path, encoded).map_err(|error| {
            ErrorEnvelope::from_io(&error, "sync.marker.write")
                .with_metadata("path", self.marker_path.display().to_string())
        })
    }

    fn command_id(&self) -> &str {
        &self.command_id
    }
}

/// Requests a sync by spawning an external program.
///
/// The command id is appended as the last argument. The child is not waited
/// on.
#[derive(Debug, Clone)]
pub struct CommandSyncTrigger {
    program: Box<str>,
    args: Vec<Box<str>>,
    command_id: Box<str>,
}

impl CommandSyncTrigger {
    /// Build a trigger from an argv-style command line.
    pub fn new(argv: &[String], command_id: impl Into<Box<str>>) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "sync command must name a program",
            ));
        };
        Ok(Self {
            program: program.as_str().into(),
            args: args.iter().map(|arg| arg.as_str().into()).collect(),
            command_id: command_id.into(),
        })
    }
}

impl SyncTriggerPort for CommandSyncTrigger {
    fn start_sync(&self, _ctx: &RequestContext) -> Result<()> {
        Command::new(&*self.program)
            .args(self.args.iter().map(|arg| &**arg))
            .arg(&*self.command_id)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|error: io::Error| {
                ErrorEnvelope::from_io(&error, "sync.command.spawn")
                    .with_metadata("program", self.program.to_string())
            })
    }

    fn command_id(&self) -> &str {
        &self.command_id
    }
}

/// Trigger that only acknowledges requests.
#[derive(Debug, Clone)]
pub struct DisabledSyncTrigger {
    command_id: Box<str>,
}

impl DisabledSyncTrigger {
    /// Build a disabled trigger for `command_id`.
    #[must_use]
    pub fn new(command_id: impl Into<Box<str>>) -> Self {
        Self {
            command_id: command_id.into(),
        }
    }
}

impl SyncTriggerPort for DisabledSyncTrigger {
    fn start_sync(&self, _ctx: &RequestContext) -> Result<()> {
        Ok(())
    }

    fn command_id(&self) -> &str {
        &self.command_id
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
