//! Declarative world configuration.
//!
//! A `WorldConfig` is what the metadata store persists for each world and what
//! the host is handed when a world is instantiated. It is a plain record with
//! named fields; construct it from [`WorldConfig::new`] and struct update syntax:
//!
//! ```
//! use worldkeeper_domain::{GeneratorKind, WorldConfig, WorldName};
//!
//! let name = WorldName::new("arena").expect("valid name");
//! let config = WorldConfig {
//!     generator: GeneratorKind::Void,
//!     seed: 42,
//!     ..WorldConfig::new(name)
//! };
//! assert!(config.pvp_enabled);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{Environment, GeneratorKind, WorldName, WorldType};

/// Persisted configuration of one world.
///
/// # Invariants
///
/// - `name` is unique across the metadata store and equals the directory name
/// - `name` only changes through a rename, which also issues a new `uuid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConfig {
    pub name: WorldName,
    /// Configuration identity; regenerated on clone and rename.
    pub uuid: Uuid,
    pub environment: Environment,
    pub world_type: WorldType,
    pub generator: GeneratorKind,
    pub generate_structures: bool,
    pub seed: i64,
    pub pvp_enabled: bool,
    pub keep_spawn_loaded: bool,
    pub auto_load_on_startup: bool,
}

impl WorldConfig {
    /// Configuration with the host's defaults: overworld, vanilla generation,
    /// structures and PvP on, seed 0, auto-loaded on startup.
    pub fn new(name: WorldName) -> Self {
        Self {
            name,
            uuid: Uuid::new_v4(),
            environment: Environment::Normal,
            world_type: WorldType::Normal,
            generator: GeneratorKind::Normal,
            generate_structures: true,
            seed: 0,
            pvp_enabled: true,
            keep_spawn_loaded: false,
            auto_load_on_startup: true,
        }
    }

    /// Copy of this configuration under another name with a fresh identity.
    ///
    /// Used by both clone and rename: every other field is carried verbatim.
    pub fn renamed(&self, name: WorldName) -> Self {
        Self {
            name,
            uuid: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Compares every field except `name` and `uuid`.
    pub fn same_settings(&self, other: &WorldConfig) -> bool {
        self.environment == other.environment
            && self.world_type == other.world_type
            && self.generator == other.generator
            && self.generate_structures == other.generate_structures
            && self.seed == other.seed
            && self.pvp_enabled == other.pvp_enabled
            && self.keep_spawn_loaded == other.keep_spawn_loaded
            && self.auto_load_on_startup == other.auto_load_on_startup
    }
}
