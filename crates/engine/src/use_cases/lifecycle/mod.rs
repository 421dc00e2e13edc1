//! World lifecycle use cases.
//!
//! Create, load, unload, delete, clone, rename and import worlds. Each
//! operation composes three collaborators:
//!
//! - [`DirectoryOps`] for the world's directory tree (worker pool)
//! - [`MetadataStore`] for its persisted configuration
//! - [`HostThread`] for every step that touches a live world
//!
//! Operations on the same world name never interleave; each takes that name's
//! lock (clone and rename take both names) for its whole duration.

mod error;
mod locks;
mod types;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use worldkeeper_domain::{WorldConfig, WorldHandle, WorldName};

use crate::infrastructure::directory::{remove_file_if_exists, DirectoryOps, UID_MARKER_FILE};
use crate::infrastructure::host::HostThread;
use crate::infrastructure::metadata::MetadataStore;
use crate::infrastructure::ports::WorldRegistry;

pub use error::LifecycleError;
pub use locks::{NameGuard, NameLocks};
pub use types::{CreationResult, LoadAllSummary, ReconcileReport};

/// Orchestrates world lifecycle operations.
pub struct WorldLifecycle {
    host: Arc<HostThread>,
    store: Arc<MetadataStore>,
    dirs: Arc<DirectoryOps>,
    locks: NameLocks,
    container: PathBuf,
    /// Evacuation target; the host's default world when unset.
    fallback_world: Option<WorldName>,
}

impl WorldLifecycle {
    pub fn new(
        host: Arc<HostThread>,
        store: Arc<MetadataStore>,
        dirs: Arc<DirectoryOps>,
        container: impl Into<PathBuf>,
        fallback_world: Option<WorldName>,
    ) -> Self {
        Self {
            host,
            store,
            dirs,
            locks: NameLocks::new(),
            container: container.into(),
            fallback_world,
        }
    }

    pub fn container(&self) -> &Path {
        &self.container
    }

    pub fn world_dir(&self, name: &WorldName) -> PathBuf {
        self.container.join(name.as_str())
    }

    // =========================================================================
    // Create / Load
    // =========================================================================

    /// Instantiate a new world and store its configuration.
    ///
    /// Metadata is only stored once the host has produced a live world.
    pub async fn create(&self, config: WorldConfig) -> CreationResult {
        let started = Instant::now();
        let name = config.name.clone();

        let outcome = {
            let _guard = self.locks.lock(&name).await;
            self.create_locked(config).await
        };

        let result = CreationResult {
            outcome,
            elapsed: started.elapsed(),
        };
        match &result.outcome {
            Ok(handle) => tracing::info!(
                world = %name,
                seed = handle.seed,
                elapsed = %result.formatted_time(),
                "World created"
            ),
            Err(e) => tracing::warn!(world = %name, error = %e, "World creation failed"),
        }
        result
    }

    async fn create_locked(&self, config: WorldConfig) -> Result<WorldHandle, LifecycleError> {
        let name = config.name.clone();
        if self.store.contains(&name) || DirectoryOps::is_world_dir(&self.world_dir(&name)).await {
            return Err(LifecycleError::AlreadyExists(name.to_string()));
        }

        let requested = config.clone();
        let handle = self
            .host
            .run(move |registry| {
                if registry.lookup(&requested.name).is_some() {
                    return Err(LifecycleError::AlreadyExists(requested.name.to_string()));
                }
                registry
                    .instantiate(&requested)
                    .ok_or_else(|| LifecycleError::HostRejected(requested.name.to_string()))
            })
            .await??;

        self.store.put(config);
        self.store.persist();
        Ok(handle)
    }

    /// Return the live world, instantiating it first if needed.
    ///
    /// A world is loadable if it has stored metadata or a marked directory on
    /// disk. A directory without the marker is never loaded, even when
    /// metadata names it. Loading does not store metadata for untracked worlds;
    /// use [`WorldLifecycle::import_world`] for that.
    pub async fn load(&self, name: &WorldName) -> Result<WorldHandle, LifecycleError> {
        let _guard = self.locks.lock(name).await;
        self.load_locked(name).await
    }

    async fn load_locked(&self, name: &WorldName) -> Result<WorldHandle, LifecycleError> {
        if let Some(handle) = self.world(name).await? {
            return Ok(handle);
        }

        let dir = self.world_dir(name);
        let marked = DirectoryOps::is_world_dir(&dir).await;
        let config = match self.store.get(name) {
            Some(_) if !marked && DirectoryOps::exists(&dir).await => {
                tracing::warn!(world = %name, dir = %dir.display(), "World directory has no marker file");
                return Err(LifecycleError::NotFound(name.to_string()));
            }
            Some(config) => config,
            None if marked => WorldConfig::new(name.clone()),
            None => return Err(LifecycleError::NotFound(name.to_string())),
        };

        let handle = self.instantiate(config).await?;
        tracing::info!(world = %name, "World loaded");
        Ok(handle)
    }

    /// Load every stored world flagged for auto-load, concurrently.
    pub async fn load_all(&self) -> LoadAllSummary {
        let configs: Vec<WorldConfig> = self
            .store
            .all_configs()
            .into_iter()
            .filter(|config| config.auto_load_on_startup)
            .collect();

        let results =
            futures_util::future::join_all(configs.iter().map(|config| self.load(&config.name)))
                .await;

        let mut summary = LoadAllSummary {
            requested: configs.len(),
            ..LoadAllSummary::default()
        };
        for (config, result) in configs.into_iter().zip(results) {
            match result {
                Ok(_) => summary.loaded.push(config.name),
                Err(e) => {
                    tracing::warn!(world = %config.name, error = %e, "Auto-load failed");
                    summary.failed.push((config.name, e));
                }
            }
        }

        tracing::info!(
            requested = summary.requested,
            loaded = summary.loaded.len(),
            failed = summary.failed.len(),
            "Auto-loaded worlds"
        );
        summary
    }

    // =========================================================================
    // Unload / Delete
    // =========================================================================

    /// Evacuate and unload a live world, saving it first.
    ///
    /// Returns `Ok(false)` if the world was not live. Fails with `InUse` if
    /// players could not be evacuated or the host refused to unload.
    pub async fn unload(&self, name: &WorldName) -> Result<bool, LifecycleError> {
        let _guard = self.locks.lock(name).await;
        self.unload_locked(name).await
    }

    async fn unload_locked(&self, name: &WorldName) -> Result<bool, LifecycleError> {
        let target = name.clone();
        let fallback = self.fallback_world.clone();
        let outcome = self
            .host
            .run(move |registry| evacuate_and_unload(registry, &target, fallback.as_ref()))
            .await?;

        match outcome {
            UnloadOutcome::NotLive => Ok(false),
            UnloadOutcome::Unloaded { evacuated, to } => {
                tracing::info!(
                    world = %name,
                    evacuated,
                    fallback = to.as_ref().map(WorldName::as_str),
                    "World unloaded"
                );
                Ok(true)
            }
            UnloadOutcome::NoFallback => Err(LifecycleError::InUse(format!(
                "{name} has players and no fallback world is available"
            ))),
            UnloadOutcome::Refused => Err(LifecycleError::InUse(format!(
                "host refused to unload {name}"
            ))),
        }
    }

    /// Unload a world, then remove its metadata and directory.
    ///
    /// If the world cannot be unloaded nothing is touched.
    pub async fn delete(&self, name: &WorldName) -> Result<(), LifecycleError> {
        let _guard = self.locks.lock(name).await;

        let was_live = self.unload_locked(name).await?;
        let dir = self.world_dir(name);
        if !was_live && !self.store.contains(name) && !DirectoryOps::is_world_dir(&dir).await {
            return Err(LifecycleError::NotFound(name.to_string()));
        }

        if self.store.remove(name).is_some() {
            self.store.persist();
        }
        self.dirs.delete_tree(&dir).await?;

        tracing::info!(world = %name, was_live, "World deleted");
        Ok(())
    }

    // =========================================================================
    // Clone / Rename / Import
    // =========================================================================

    /// Copy `source` to a new world `target` and bring it live.
    ///
    /// The copy never carries the source's identity files. Source metadata is
    /// copied under the new name with a fresh uuid. If the host rejects the
    /// copy, both its metadata and its directory are removed again.
    pub async fn clone_world(
        &self,
        source: &WorldName,
        target: &WorldName,
    ) -> Result<WorldHandle, LifecycleError> {
        if source == target {
            return Err(LifecycleError::AlreadyExists(target.to_string()));
        }
        let _guards = self.locks.lock_pair(source, target).await;

        let source_dir = self.world_dir(source);
        let target_dir = self.world_dir(target);
        if !DirectoryOps::exists(&source_dir).await {
            return Err(LifecycleError::NotFound(source.to_string()));
        }
        self.ensure_free(target, &target_dir).await?;

        // A live source is flushed so the copy is not a stale snapshot.
        let flushed = source.clone();
        let saved = self
            .host
            .run(move |registry| {
                registry
                    .lookup(&flushed)
                    .map(|_| registry.save(&flushed))
            })
            .await?;
        if saved == Some(false) {
            return Err(LifecycleError::HostRejected(format!(
                "failed to save {source} before cloning"
            )));
        }

        if let Err(e) = self.dirs.copy_tree(&source_dir, &target_dir).await {
            self.discard_dir(&target_dir).await;
            return Err(e.into());
        }
        if let Err(e) = remove_file_if_exists(&target_dir.join(UID_MARKER_FILE)).await {
            self.discard_dir(&target_dir).await;
            return Err(e.into());
        }

        let cloned = self.store.get(source).map(|config| config.renamed(target.clone()));
        if let Some(config) = &cloned {
            self.store.put(config.clone());
            self.store.persist();
        }

        let config = cloned
            .clone()
            .unwrap_or_else(|| WorldConfig::new(target.clone()));
        match self.instantiate(config).await {
            Ok(handle) => {
                tracing::info!(source = %source, target = %target, "World cloned");
                Ok(handle)
            }
            Err(e) => {
                if cloned.is_some() {
                    self.store.remove(target);
                    self.store.persist();
                }
                self.discard_dir(&target_dir).await;
                Err(e)
            }
        }
    }

    /// Move world `old` to `new`, vacating it first if live.
    ///
    /// Metadata moves to the new key with a fresh uuid and the world comes back
    /// live under its new name.
    pub async fn rename(
        &self,
        old: &WorldName,
        new: &WorldName,
    ) -> Result<WorldHandle, LifecycleError> {
        if old == new {
            return Err(LifecycleError::AlreadyExists(new.to_string()));
        }
        let _guards = self.locks.lock_pair(old, new).await;

        let old_dir = self.world_dir(old);
        let new_dir = self.world_dir(new);
        if !DirectoryOps::exists(&old_dir).await {
            return Err(LifecycleError::NotFound(old.to_string()));
        }
        self.ensure_free(new, &new_dir).await?;

        self.unload_locked(old).await?;
        self.dirs.move_tree(&old_dir, &new_dir).await?;

        let config = match self.store.remove(old) {
            Some(previous) => {
                let renamed = previous.renamed(new.clone());
                self.store.put(renamed.clone());
                self.store.persist();
                renamed
            }
            None => WorldConfig::new(new.clone()),
        };

        let handle = self.instantiate(config).await?;
        tracing::info!(old = %old, new = %new, "World renamed");
        Ok(handle)
    }

    /// Bring an untracked world directory under management.
    ///
    /// The world is instantiated with default settings; the host reads the real
    /// environment, seed and level type from disk, and those are what get
    /// stored.
    pub async fn import_world(&self, name: &WorldName) -> Result<WorldConfig, LifecycleError> {
        let _guard = self.locks.lock(name).await;

        if !DirectoryOps::is_world_dir(&self.world_dir(name)).await {
            return Err(LifecycleError::NotFound(name.to_string()));
        }
        if self.store.contains(name) || self.world(name).await?.is_some() {
            return Err(LifecycleError::AlreadyExists(name.to_string()));
        }

        let handle = self.instantiate(WorldConfig::new(name.clone())).await?;
        let config = WorldConfig {
            environment: handle.environment,
            world_type: handle.world_type,
            seed: handle.seed,
            ..WorldConfig::new(name.clone())
        };
        self.store.put(config.clone());
        self.store.persist();

        tracing::info!(world = %name, seed = config.seed, environment = %config.environment, "World imported");
        Ok(config)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn world(&self, name: &WorldName) -> Result<Option<WorldHandle>, LifecycleError> {
        let name = name.clone();
        Ok(self.host.run(move |registry| registry.lookup(&name)).await?)
    }

    pub async fn live_worlds(&self) -> Result<Vec<WorldHandle>, LifecycleError> {
        Ok(self.host.run(|registry| registry.list_live()).await?)
    }

    pub fn config(&self, name: &WorldName) -> Option<WorldConfig> {
        self.store.get(name)
    }

    pub fn all_configs(&self) -> Vec<WorldConfig> {
        self.store.all_configs()
    }

    /// World directories on disk that are not live.
    pub async fn unloaded_world_names(&self) -> Result<Vec<WorldName>, LifecycleError> {
        let on_disk = DirectoryOps::list_world_dirs(&self.container).await?;
        let live: HashSet<WorldName> = self
            .live_worlds()
            .await?
            .into_iter()
            .map(|handle| handle.name)
            .collect();
        Ok(on_disk
            .into_iter()
            .filter(|name| !live.contains(name))
            .collect())
    }

    /// Compare the world container with the metadata store.
    pub async fn reconcile(&self) -> Result<ReconcileReport, LifecycleError> {
        let on_disk = DirectoryOps::list_world_dirs(&self.container).await?;
        let untracked = on_disk
            .into_iter()
            .filter(|name| !self.store.contains(name))
            .collect();

        let mut missing = Vec::new();
        for config in self.store.all_configs() {
            if !DirectoryOps::exists(&self.world_dir(&config.name)).await {
                missing.push(config.name);
            }
        }

        let report = ReconcileReport { untracked, missing };
        if !report.is_clean() {
            tracing::info!(
                untracked = report.untracked.len(),
                missing = report.missing.len(),
                "World container and metadata disagree"
            );
        }
        Ok(report)
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Flush metadata to disk and stop the host thread.
    pub async fn shutdown(&self) {
        if let Err(e) = self.store.persist_now().await {
            tracing::error!(error = %e, "Failed to flush world metadata on shutdown");
        }
        self.host.shutdown().await;
        tracing::info!("World lifecycle shut down");
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn instantiate(&self, config: WorldConfig) -> Result<WorldHandle, LifecycleError> {
        self.host
            .run(move |registry| {
                registry
                    .lookup(&config.name)
                    .or_else(|| registry.instantiate(&config))
                    .ok_or_else(|| LifecycleError::HostRejected(config.name.to_string()))
            })
            .await?
    }

    /// `name` must have no directory, no metadata and no live world.
    async fn ensure_free(&self, name: &WorldName, dir: &Path) -> Result<(), LifecycleError> {
        if DirectoryOps::exists(dir).await
            || self.store.contains(name)
            || self.world(name).await?.is_some()
        {
            return Err(LifecycleError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    async fn discard_dir(&self, dir: &Path) {
        if let Err(e) = self.dirs.delete_tree(dir).await {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove partial world copy");
        }
    }
}

// =============================================================================
// Host-thread steps
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum UnloadOutcome {
    NotLive,
    Unloaded {
        evacuated: usize,
        to: Option<WorldName>,
    },
    NoFallback,
    Refused,
}

/// Move players out of `name` and unload it. Runs on the host thread.
///
/// The configured fallback is tried first, then the host's default world; a
/// candidate must be live and must not be `name` itself.
fn evacuate_and_unload(
    registry: &mut dyn WorldRegistry,
    name: &WorldName,
    fallback: Option<&WorldName>,
) -> UnloadOutcome {
    let Some(handle) = registry.lookup(name) else {
        return UnloadOutcome::NotLive;
    };

    let mut evacuated = 0;
    let mut to = None;
    if handle.has_players() {
        let default_world = registry.default_world();
        let Some(target) = fallback
            .cloned()
            .into_iter()
            .chain(default_world)
            .find(|candidate| candidate != name && registry.lookup(candidate).is_some())
        else {
            return UnloadOutcome::NoFallback;
        };
        evacuated = registry.evacuate_players(name, &target);
        to = Some(target);
    }

    if registry.unload_and_save(name) {
        UnloadOutcome::Unloaded { evacuated, to }
    } else {
        UnloadOutcome::Refused
    }
}
