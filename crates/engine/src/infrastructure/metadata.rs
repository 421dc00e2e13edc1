//! World metadata store.
//!
//! In-memory map of world name to [`WorldConfig`], mirrored to a JSON document:
//!
//! ```json
//! { "worlds": { "arena": { "environment": "NORMAL", "type": "NORMAL", "seed": 42, ... } } }
//! ```
//!
//! The map is authoritative while the engine runs. The file is rewritten in full
//! after each mutation; writes are serialized so two persists never interleave.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;
use worldkeeper_domain::{Environment, GeneratorKind, WorldConfig, WorldName, WorldType};

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MetadataError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// =============================================================================
// On-disk document
// =============================================================================

fn yes() -> bool {
    true
}

/// One world entry as stored on disk. Missing keys take the host's defaults.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWorld {
    #[serde(default, deserialize_with = "strict_enum")]
    environment: Environment,
    #[serde(rename = "type", default, deserialize_with = "strict_enum")]
    world_type: WorldType,
    #[serde(default = "yes")]
    generate_structures: bool,
    #[serde(default)]
    seed: i64,
    #[serde(default = "yes")]
    pvp: bool,
    #[serde(default)]
    keep_spawn_loaded: bool,
    #[serde(default = "yes")]
    auto_load: bool,
    #[serde(default, deserialize_with = "lenient_generator")]
    generator_kind: GeneratorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
}

impl StoredWorld {
    fn from_config(config: &WorldConfig) -> Self {
        Self {
            environment: config.environment,
            world_type: config.world_type,
            generate_structures: config.generate_structures,
            seed: config.seed,
            pvp: config.pvp_enabled,
            keep_spawn_loaded: config.keep_spawn_loaded,
            auto_load: config.auto_load_on_startup,
            generator_kind: config.generator,
            uuid: Some(config.uuid),
        }
    }

    fn into_config(self, name: WorldName) -> WorldConfig {
        WorldConfig {
            name,
            uuid: self.uuid.unwrap_or_else(Uuid::new_v4),
            environment: self.environment,
            world_type: self.world_type,
            generator: self.generator_kind,
            generate_structures: self.generate_structures,
            seed: self.seed,
            pvp_enabled: self.pvp,
            keep_spawn_loaded: self.keep_spawn_loaded,
            auto_load_on_startup: self.auto_load,
        }
    }
}

/// Case-insensitive enum parsing; unknown values fail the entry.
fn strict_enum<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Unknown generator kinds fall back to vanilla generation.
fn lenient_generator<'de, D>(deserializer: D) -> Result<GeneratorKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|_| {
        tracing::warn!(generator = %raw, "Unknown generator kind, using NORMAL");
        GeneratorKind::Normal
    }))
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    worlds: &'a BTreeMap<String, StoredWorld>,
}

// =============================================================================
// Store
// =============================================================================

pub struct MetadataStore {
    path: PathBuf,
    worlds: DashMap<WorldName, WorldConfig>,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    /// Empty store backed by `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            worlds: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Load the store from `path`.
    ///
    /// Never fails: a missing file is created empty, an unreadable document is
    /// moved aside to `<file>.corrupt`, and individual entries that fail to
    /// parse are logged and skipped.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);

        let bytes = match tokio::fs::read(&store.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %store.path.display(), "No world metadata yet, creating");
                if let Err(e) = store.persist_now().await {
                    tracing::error!(error = %e, "Failed to create world metadata file");
                }
                return store;
            }
            Err(e) => {
                tracing::error!(path = %store.path.display(), error = %e, "Failed to read world metadata");
                return store;
            }
        };

        let document = match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(serde_json::Value::Object(document)) => document,
            Ok(_) | Err(_) => {
                store.quarantine().await;
                return store;
            }
        };

        let Some(serde_json::Value::Object(entries)) = document.get("worlds") else {
            tracing::warn!(path = %store.path.display(), "World metadata has no worlds section");
            return store;
        };

        let mut skipped = 0usize;
        for (key, value) in entries {
            let name = match WorldName::new(key) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(world = %key, error = %e, "Skipping world with invalid name");
                    skipped += 1;
                    continue;
                }
            };
            match serde_json::from_value::<StoredWorld>(value.clone()) {
                Ok(stored) => {
                    store.worlds.insert(name.clone(), stored.into_config(name));
                }
                Err(e) => {
                    tracing::warn!(world = %key, error = %e, "Skipping unparseable world entry");
                    skipped += 1;
                }
            }
        }

        tracing::info!(
            path = %store.path.display(),
            worlds = store.worlds.len(),
            skipped,
            "World metadata loaded"
        );
        store
    }

    async fn quarantine(&self) {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".corrupt");
        let backup = PathBuf::from(backup);
        match tokio::fs::rename(&self.path, &backup).await {
            Ok(()) => tracing::error!(
                path = %self.path.display(),
                backup = %backup.display(),
                "World metadata is not a valid document; moved aside and starting empty"
            ),
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "World metadata is not a valid document and could not be moved aside"
            ),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &WorldName) -> Option<WorldConfig> {
        self.worlds.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &WorldName) -> bool {
        self.worlds.contains_key(name)
    }

    /// Insert or replace the config stored under `config.name`.
    ///
    /// Callers persist afterwards.
    pub fn put(&self, config: WorldConfig) -> Option<WorldConfig> {
        self.worlds.insert(config.name.clone(), config)
    }

    /// Callers persist afterwards.
    pub fn remove(&self, name: &WorldName) -> Option<WorldConfig> {
        self.worlds.remove(name).map(|(_, config)| config)
    }

    /// Snapshot of every stored config, sorted by name.
    pub fn all_configs(&self) -> Vec<WorldConfig> {
        let mut configs: Vec<WorldConfig> =
            self.worlds.iter().map(|entry| entry.value().clone()).collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Write the store in the background. Failures are logged, never returned.
    pub fn persist(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = store.persist_now().await {
                tracing::error!(error = %e, "Failed to persist world metadata");
            }
        })
    }

    /// Write the full store to disk and wait for it.
    ///
    /// The snapshot is taken under the write lock, so the last writer always
    /// carries the newest state. The document is written to a sibling temp
    /// file and renamed over the original.
    pub async fn persist_now(&self) -> Result<(), MetadataError> {
        let _guard = self.write_lock.lock().await;

        let snapshot: BTreeMap<String, StoredWorld> = self
            .worlds
            .iter()
            .map(|entry| (entry.key().to_string(), StoredWorld::from_config(entry.value())))
            .collect();
        let bytes = serde_json::to_vec_pretty(&DocumentOut { worlds: &snapshot })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MetadataError::io(parent, e))?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| MetadataError::io(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| MetadataError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), worlds = snapshot.len(), "World metadata persisted");
        Ok(())
    }
}
