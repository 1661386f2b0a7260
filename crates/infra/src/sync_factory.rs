//! Sync collaborator resolution.
//!
//! Tombstones are only recorded when the sync plugin is installed in the
//! vault and a session id is configured.

use crate::InfraResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tombstone_adapters::history_store::JsonFileHistorySink;
use tombstone_adapters::sync_trigger::{
    CommandSyncTrigger, DisabledSyncTrigger, MarkerFileSyncTrigger,
};
use tombstone_config::{SyncTriggerKind, ValidatedTombstoneConfig};
use tombstone_ports::{SyncCollaborator, SyncTriggerPort};

/// Why a collaborator is or is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorState {
    /// Plugin directory exists and a session id is configured.
    Ready,
    /// The plugin directory does not exist.
    PluginMissing,
    /// No session id is configured.
    SessionMissing,
}

impl CollaboratorState {
    /// Stable camelCase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::PluginMissing => "pluginMissing",
            Self::SessionMissing => "sessionMissing",
        }
    }
}

/// Outcome of collaborator resolution for one vault.
#[derive(Debug, Clone)]
pub struct ResolvedCollaborator {
    /// Resolution state.
    pub state: CollaboratorState,
    /// `<vault>/<configDir>/plugins/<pluginId>`.
    pub plugin_dir: PathBuf,
    /// History store location.
    pub history_store_path: PathBuf,
    /// Collaborator handed to the use cases, when ready.
    pub collaborator: Option<SyncCollaborator>,
}

/// Resolve the sync collaborator for `vault_root`.
pub fn resolve_collaborator(
    config: &ValidatedTombstoneConfig,
    vault_root: &Path,
) -> InfraResult<ResolvedCollaborator> {
    let plugin_dir = config.plugin_dir(vault_root);
    let history_store_path = config.history_store_path(vault_root);

    let state = if !plugin_dir.is_dir() {
        CollaboratorState::PluginMissing
    } else if config.session_id().is_none() {
        CollaboratorState::SessionMissing
    } else {
        CollaboratorState::Ready
    };

    let collaborator = match (state, config.session_id()) {
        (CollaboratorState::Ready, Some(session_id)) => Some(SyncCollaborator {
            history: Arc::new(JsonFileHistorySink::new(history_store_path.clone())),
            trigger: build_sync_trigger(config, vault_root)?,
            session_id: session_id.clone(),
        }),
        _ => None,
    };

    Ok(ResolvedCollaborator {
        state,
        plugin_dir,
        history_store_path,
        collaborator,
    })
}

/// Build the configured sync trigger.
pub fn build_sync_trigger(
    config: &ValidatedTombstoneConfig,
    vault_root: &Path,
) -> InfraResult<Arc<dyn SyncTriggerPort>> {
    let command_id = config.sync.command_id.clone();
    let trigger: Arc<dyn SyncTriggerPort> = match config.sync.trigger {
        SyncTriggerKind::Marker => Arc::new(MarkerFileSyncTrigger::new(
            config.marker_path(vault_root),
            command_id,
        )),
        SyncTriggerKind::Command => {
            Arc::new(CommandSyncTrigger::new(&config.sync.command, command_id)?)
        },
        SyncTriggerKind::Disabled => Arc::new(DisabledSyncTrigger::new(command_id)),
    };
    Ok(trigger)
}
