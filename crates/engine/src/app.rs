//! Application state and composition.

use std::sync::Arc;

use worldkeeper_domain::{ActorId, ConfirmationKind, WorldConfig, WorldName};

use crate::infrastructure::{
    clock::SystemClock,
    directory::DirectoryOps,
    host::HostThread,
    metadata::MetadataStore,
    ports::{ActorNotifier, ClockPort, HostError, WorldRegistry},
    settings::EngineSettings,
};
use crate::stores::{ConfirmAction, ConfirmationStore, RequestOutcome};
use crate::use_cases::{LoadAllSummary, WorldLifecycle};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Host thread error: {0}")]
    Host(#[from] HostError),

    #[error("Host refused to load the primary world {0}")]
    PrimaryWorld(WorldName),
}

/// A destructive action that needs the actor's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedAction {
    Delete(WorldName),
    Unload(WorldName),
    Rename { from: WorldName, to: WorldName },
}

impl GuardedAction {
    pub fn kind(&self) -> ConfirmationKind {
        match self {
            GuardedAction::Delete(_) => ConfirmationKind::Delete,
            GuardedAction::Unload(_) => ConfirmationKind::Unload,
            GuardedAction::Rename { .. } => ConfirmationKind::Rename,
        }
    }

    pub fn target(&self) -> String {
        match self {
            GuardedAction::Delete(name) | GuardedAction::Unload(name) => name.to_string(),
            GuardedAction::Rename { from, to } => format!("{from} -> {to}"),
        }
    }
}

/// Main application state.
pub struct App {
    pub settings: EngineSettings,
    pub lifecycle: Arc<WorldLifecycle>,
    pub confirmations: Arc<ConfirmationStore>,
}

impl App {
    /// Start the host thread, boot the primary world and load metadata.
    pub async fn new(
        settings: EngineSettings,
        registry: Box<dyn WorldRegistry>,
        notifier: Arc<dyn ActorNotifier>,
    ) -> Result<Self, AppError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let store = Arc::new(MetadataStore::load(&settings.metadata_file).await);
        let host = Arc::new(HostThread::spawn(registry)?);

        let primary = store
            .get(&settings.primary_world)
            .unwrap_or_else(|| WorldConfig::new(settings.primary_world.clone()));
        let booted = host
            .run(move |registry| registry.instantiate(&primary))
            .await?;
        if booted.is_none() {
            host.shutdown().await;
            return Err(AppError::PrimaryWorld(settings.primary_world.clone()));
        }
        tracing::info!(world = %settings.primary_world, "Primary world loaded");

        let lifecycle = Arc::new(WorldLifecycle::new(
            host,
            store,
            Arc::new(DirectoryOps::new(settings.file_op_workers)),
            &settings.world_container,
            settings.fallback_world.clone(),
        ));
        let confirmations = Arc::new(ConfirmationStore::new(
            settings.confirmation_timeout,
            notifier,
            clock,
        ));

        Ok(Self {
            settings,
            lifecycle,
            confirmations,
        })
    }

    /// Report metadata drift, then auto-load stored worlds.
    pub async fn start(&self) -> LoadAllSummary {
        match self.lifecycle.reconcile().await {
            Ok(report) => {
                for name in &report.untracked {
                    tracing::info!(world = %name, "Untracked world directory; import it to manage it");
                }
                for name in &report.missing {
                    tracing::warn!(world = %name, "World directory missing; it will be regenerated on load");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to scan world container"),
        }
        self.lifecycle.load_all().await
    }

    /// Ask `actor` to confirm `action`. Once confirmed, the action runs in the
    /// background and its result is logged.
    pub async fn request(&self, actor: ActorId, action: GuardedAction) -> RequestOutcome {
        let kind = action.kind();
        let target = action.target();
        let lifecycle = Arc::clone(&self.lifecycle);

        let on_confirm: ConfirmAction = Box::new(move |actor| {
            tokio::spawn(run_guarded(lifecycle, actor, action));
        });
        self.confirmations
            .request(actor, kind, target, on_confirm)
            .await
    }

    /// Drop pending confirmations, flush metadata and stop the host thread.
    pub async fn shutdown(&self) {
        self.confirmations.shutdown();
        self.lifecycle.shutdown().await;
    }
}

async fn run_guarded(lifecycle: Arc<WorldLifecycle>, actor: ActorId, action: GuardedAction) {
    let result = match &action {
        GuardedAction::Delete(name) => lifecycle.delete(name).await,
        GuardedAction::Unload(name) => lifecycle.unload(name).await.map(|_| ()),
        GuardedAction::Rename { from, to } => lifecycle.rename(from, to).await.map(|_| ()),
    };
    match result {
        Ok(()) => tracing::info!(%actor, kind = %action.kind(), subject = %action.target(), "Guarded action completed"),
        Err(e) => tracing::warn!(%actor, kind = %action.kind(), subject = %action.target(), error = %e, "Guarded action failed"),
    }
}
