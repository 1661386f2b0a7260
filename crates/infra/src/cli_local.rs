//! Local CLI orchestration helpers.

use crate::observability::{observability_from_env, scope_logger, scope_telemetry};
use crate::sync_factory::{CollaboratorState, ResolvedCollaborator, resolve_collaborator};
use crate::{InfraError, InfraResult};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tombstone_adapters::fs::LocalFileSystem;
use tombstone_adapters::history_store::JsonFileHistorySink;
use tombstone_adapters::notifier::{BufferedNotifier, SystemClock};
use tombstone_adapters::selection::LocalSelectionSource;
use tombstone_app::{
    CleanDsStoreInput, ConfigDirDeleteInput, DeleteSelectionInput, DeleteSelectionOutput,
    DeletionDeps, VaultCommandDeps, clean_ds_store, delete_in_config_dir, delete_selection,
};
use tombstone_config::{SyncTriggerKind, ValidatedTombstoneConfig, load_tombstone_config_std_env};
use tombstone_domain::{ConfigDirCommand, OnItemFailure, OsKind, PlatformCapabilities, SelectionKind};
use tombstone_ports::{LoggerPort, NotifierPort, SelectionSourcePort, TelemetryPort, log_fields};
use tombstone_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext};

/// Options shared by every local command.
#[derive(Debug, Clone, Default)]
pub struct LocalOptions {
    /// Explicit config file (JSON or TOML).
    pub config_path: Option<PathBuf>,
    /// Partial config JSON applied over the file.
    pub overrides_json: Option<String>,
    /// Vault root; falls back to the config, then the working directory.
    pub vault_root: Option<PathBuf>,
    /// Failure policy override.
    pub on_item_failure: Option<OnItemFailure>,
}

/// Result of a local deletion command.
#[derive(Debug, Clone)]
pub struct LocalRunReport {
    /// Absolute vault root used for keys.
    pub vault_root: PathBuf,
    /// Collaborator resolution state.
    pub collaborator: CollaboratorState,
    /// Config-directory command that ran, if any.
    pub command: Option<ConfigDirCommand>,
    /// `.DS_Store` match count, for the cleanup command.
    pub matched: Option<usize>,
    /// Selection summary; `None` when nothing was selected.
    pub selection: Option<DeleteSelectionOutput>,
    /// Notices emitted during the run, in order.
    pub notices: Vec<String>,
}

/// Summary of local CLI status information.
#[derive(Debug, Clone)]
pub struct CliStatus {
    /// Absolute vault root.
    pub vault_root: PathBuf,
    /// `<vault>/<configDir>`.
    pub config_dir: PathBuf,
    /// Host OS family.
    pub os: OsKind,
    /// Config-directory commands available on this platform.
    pub commands: Vec<ConfigDirCommand>,
    /// Collaborator resolution state.
    pub collaborator: CollaboratorState,
    /// Sync plugin directory.
    pub plugin_dir: PathBuf,
    /// Configured session id.
    pub session_id: Option<String>,
    /// Trigger mechanism.
    pub trigger: SyncTriggerKind,
    /// Sync command id.
    pub command_id: String,
    /// Failure policy.
    pub on_item_failure: OnItemFailure,
    /// History store status.
    pub history: HistoryStoreStatus,
}

/// History store information for CLI status output.
#[derive(Debug, Clone)]
pub struct HistoryStoreStatus {
    /// Store path.
    pub path: PathBuf,
    /// Whether the store file exists.
    pub exists: bool,
    /// Last modified timestamp (ms since epoch) when available.
    pub updated_at_ms: Option<u64>,
    /// Total entries in the store.
    pub entry_count: Option<usize>,
    /// Entries owned by the configured session.
    pub session_entry_count: Option<usize>,
}

/// Delete arbitrary vault paths. Relative paths resolve against the working directory.
pub fn run_delete_local(options: &LocalOptions, paths: &[PathBuf]) -> InfraResult<LocalRunReport> {
    let session = LocalSession::prepare(options)?;
    let paths = paths
        .iter()
        .map(|path| absolute_path(path))
        .collect::<InfraResult<Vec<_>>>()?;
    let input = DeleteSelectionInput {
        vault_root: session.vault_root.clone(),
        paths,
        on_item_failure: session.on_item_failure,
        notify_items: true,
    };

    let deps = session.deletion_deps();
    let output = run_async_with_ctx(session.ctx.clone(), move |ctx| async move {
        delete_selection(&ctx, &deps, input).await
    })?;

    Ok(session.finish(None, None, Some(output)))
}

/// Delete every `.DS_Store` file in the vault.
pub fn run_ds_store_local(options: &LocalOptions) -> InfraResult<LocalRunReport> {
    let session = LocalSession::prepare(options)?;
    let deps = session.command_deps(Arc::new(LocalSelectionSource::new()));
    let input = CleanDsStoreInput {
        vault_root: session.vault_root.clone(),
        on_item_failure: session.on_item_failure,
    };

    let output = run_async_with_ctx(session.ctx.clone(), move |ctx| async move {
        clean_ds_store(&ctx, &deps, input).await
    })?;

    Ok(session.finish(None, Some(output.matched), output.selection))
}

/// Delete picked entries of the config directory.
///
/// Relative picks resolve against `<vault>/<configDir>`.
pub fn run_config_dir_local(
    options: &LocalOptions,
    kind: SelectionKind,
    picks: Vec<PathBuf>,
) -> InfraResult<LocalRunReport> {
    let session = LocalSession::prepare(options)?;
    let deps = session.command_deps(Arc::new(LocalSelectionSource::with_picks(picks)));
    let input = ConfigDirDeleteInput {
        vault_root: session.vault_root.clone(),
        config_dir: session.config.vault.config_dir.to_string(),
        kind,
        on_item_failure: session.on_item_failure,
    };

    let output = run_async_with_ctx(session.ctx.clone(), move |ctx| async move {
        delete_in_config_dir(&ctx, &deps, input).await
    })?;

    Ok(session.finish(Some(output.command), None, output.selection))
}

/// Read the vault, collaborator, and history store status.
pub fn read_status_local(options: &LocalOptions) -> InfraResult<CliStatus> {
    let config = load_tombstone_config_std_env(
        options.config_path.as_deref(),
        options.overrides_json.as_deref(),
    )?;
    let vault_root = resolve_vault_root(options.vault_root.as_deref(), &config)?;
    let resolved = resolve_collaborator(&config, &vault_root)?;
    let platform = PlatformCapabilities::detect();
    let session_id = config.session_id().map(|id| id.as_str().to_owned());
    let history = history_store_status(&resolved.history_store_path, session_id.as_deref())?;

    Ok(CliStatus {
        config_dir: config.config_dir_path(&vault_root),
        vault_root,
        os: platform.os(),
        commands: platform.config_dir_commands(),
        collaborator: resolved.state,
        plugin_dir: resolved.plugin_dir,
        session_id,
        trigger: config.sync.trigger,
        command_id: config.sync.command_id.to_string(),
        on_item_failure: options
            .on_item_failure
            .unwrap_or_else(|| config.on_item_failure()),
        history,
    })
}

struct LocalSession {
    config: ValidatedTombstoneConfig,
    vault_root: PathBuf,
    on_item_failure: OnItemFailure,
    resolved: ResolvedCollaborator,
    ctx: RequestContext,
    notifier: Arc<BufferedNotifier>,
    logger: Option<Arc<dyn LoggerPort>>,
    telemetry: Option<Arc<dyn TelemetryPort>>,
}

impl LocalSession {
    fn prepare(options: &LocalOptions) -> InfraResult<Self> {
        let config = load_tombstone_config_std_env(
            options.config_path.as_deref(),
            options.overrides_json.as_deref(),
        )?;
        let vault_root = resolve_vault_root(options.vault_root.as_deref(), &config)?;
        let resolved = resolve_collaborator(&config, &vault_root)?;
        let observability = observability_from_env();
        let ctx = RequestContext::new_request();
        let logger = scope_logger(observability.logger.as_ref(), &ctx);
        let telemetry = scope_telemetry(observability.telemetry.as_ref(), &ctx);

        if let Some(logger) = logger.as_ref() {
            logger.debug(
                "collaborator.resolved",
                "sync collaborator resolved",
                Some(log_fields([
                    ("state", resolved.state.as_str().into()),
                    (
                        "pluginDir",
                        resolved.plugin_dir.to_string_lossy().into_owned().into(),
                    ),
                ])),
            );
        }

        Ok(Self {
            on_item_failure: options
                .on_item_failure
                .unwrap_or_else(|| config.on_item_failure()),
            config,
            vault_root,
            resolved,
            ctx,
            notifier: Arc::new(BufferedNotifier::new()),
            logger,
            telemetry,
        })
    }

    fn deletion_deps(&self) -> DeletionDeps {
        let notifier: Arc<dyn NotifierPort> = self.notifier.clone();
        DeletionDeps {
            fs: Arc::new(LocalFileSystem::new()),
            collaborator: self.resolved.collaborator.clone(),
            clock: Arc::new(SystemClock),
            notifier: Some(notifier),
            logger: self.logger.clone(),
            telemetry: self.telemetry.clone(),
        }
    }

    fn command_deps(&self, selection: Arc<dyn SelectionSourcePort>) -> VaultCommandDeps {
        VaultCommandDeps {
            deletion: self.deletion_deps(),
            selection,
            platform: PlatformCapabilities::detect(),
        }
    }

    fn finish(
        self,
        command: Option<ConfigDirCommand>,
        matched: Option<usize>,
        selection: Option<DeleteSelectionOutput>,
    ) -> LocalRunReport {
        LocalRunReport {
            vault_root: self.vault_root,
            collaborator: self.resolved.state,
            command,
            matched,
            selection,
            notices: self.notifier.take(),
        }
    }
}

fn resolve_vault_root(
    explicit: Option<&Path>,
    config: &ValidatedTombstoneConfig,
) -> InfraResult<PathBuf> {
    let root = match explicit.or(config.vault.root.as_deref()) {
        Some(root) => absolute_path(root)?,
        None => std::env::current_dir().map_err(InfraError::from)?,
    };
    if !root.is_dir() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::not_found(),
            "vault root is not a directory",
        )
        .with_metadata("path", root.to_string_lossy().to_string()));
    }
    Ok(root)
}

fn absolute_path(path: &Path) -> InfraResult<PathBuf> {
    std::path::absolute(path).map_err(|error| {
        ErrorEnvelope::from_io(&error, "path.absolute")
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn history_store_status(
    path: &Path,
    session_id: Option<&str>,
) -> InfraResult<HistoryStoreStatus> {
    if !path.is_file() {
        return Ok(HistoryStoreStatus {
            path: path.to_path_buf(),
            exists: false,
            updated_at_ms: None,
            entry_count: None,
            session_entry_count: None,
        });
    }

    let sink = JsonFileHistorySink::new(path.to_path_buf());
    let entries = run_async_with_ctx(RequestContext::new_request(), move |_ctx| async move {
        sink.load_entries().await
    })?;
    let session_entry_count = session_id.map(|session| {
        let prefix = format!("{session}\t");
        entries.keys().filter(|key| key.starts_with(&prefix)).count()
    });

    Ok(HistoryStoreStatus {
        path: path.to_path_buf(),
        exists: true,
        updated_at_ms: Some(file_mtime_ms(path)?),
        entry_count: Some(entries.len()),
        session_entry_count,
    })
}

fn file_mtime_ms(path: &Path) -> InfraResult<u64> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified().map_err(InfraError::from)?;
    let duration = modified.duration_since(UNIX_EPOCH).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("mtime error: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    u64::try_from(duration.as_millis()).map_err(|_| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            "mtime overflow",
            ErrorClass::NonRetriable,
        )
    })
}

fn run_async_with_ctx<F, T>(
    ctx: RequestContext,
    op: impl FnOnce(RequestContext) -> F,
) -> InfraResult<T>
where
    F: Future<Output = Result<T, ErrorEnvelope>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(async { op(ctx).await })
}
