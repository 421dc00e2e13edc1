//! Engine settings read from the environment.
//!
//! | Variable                    | Default                           |
//! |-----------------------------|-----------------------------------|
//! | `WORLD_CONTAINER`           | `worlds`                          |
//! | `METADATA_FILE`             | `plugins/worldkeeper/worlds.json` |
//! | `CONFIRMATION_TIMEOUT_SECS` | `30`                              |
//! | `FILE_OP_WORKERS`           | available parallelism, at least 2 |
//! | `PRIMARY_WORLD`             | `world`                           |
//! | `FALLBACK_WORLD`            | unset (host's default world)      |

use std::path::PathBuf;
use std::time::Duration;

use worldkeeper_domain::WorldName;

use crate::infrastructure::directory::DirectoryOps;

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_PRIMARY_WORLD: &str = "world";

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Directory holding one subdirectory per world.
    pub world_container: PathBuf,
    pub metadata_file: PathBuf,
    pub confirmation_timeout: Duration,
    pub file_op_workers: usize,
    /// Booted at startup; never unloaded.
    pub primary_world: WorldName,
    /// Where players are evacuated to. `None` means the host's default world.
    pub fallback_world: Option<WorldName>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            world_container: PathBuf::from("worlds"),
            metadata_file: PathBuf::from("plugins/worldkeeper/worlds.json"),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            file_op_workers: DirectoryOps::default_worker_count(),
            primary_world: default_primary_world(),
            fallback_world: None,
        }
    }
}

impl EngineSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unparseable values are
    /// logged and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let confirmation_timeout = var("CONFIRMATION_TIMEOUT_SECS")
            .and_then(|raw| parse_or_warn::<u64>("CONFIRMATION_TIMEOUT_SECS", &raw))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.confirmation_timeout);

        let file_op_workers = var("FILE_OP_WORKERS")
            .and_then(|raw| parse_or_warn::<usize>("FILE_OP_WORKERS", &raw))
            .map(|n| n.max(DirectoryOps::MIN_WORKERS))
            .unwrap_or(defaults.file_op_workers);

        Self {
            world_container: var("WORLD_CONTAINER")
                .map(PathBuf::from)
                .unwrap_or(defaults.world_container),
            metadata_file: var("METADATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.metadata_file),
            confirmation_timeout,
            file_op_workers,
            primary_world: var("PRIMARY_WORLD")
                .and_then(|raw| world_name_or_warn("PRIMARY_WORLD", &raw))
                .unwrap_or(defaults.primary_world),
            fallback_world: var("FALLBACK_WORLD")
                .and_then(|raw| world_name_or_warn("FALLBACK_WORLD", &raw)),
        }
    }
}

fn default_primary_world() -> WorldName {
    match WorldName::new(DEFAULT_PRIMARY_WORLD) {
        Ok(name) => name,
        Err(e) => unreachable!("default primary world name is valid: {e}"),
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "Invalid setting, using default");
            None
        }
    }
}

fn world_name_or_warn(key: &str, raw: &str) -> Option<WorldName> {
    match WorldName::new(raw) {
        Ok(name) => Some(name),
        Err(e) => {
            tracing::warn!(key, value = raw, error = %e, "Invalid world name setting, using default");
            None
        }
    }
}
