//! Snapshot of a live world as reported by the host.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation::SpawnPoint;
use crate::value_objects::{Environment, WorldName, WorldType};

/// A live world at the moment the host answered.
///
/// This is a value copy, not a reference into the host's registry: it does not
/// follow later changes and holding it does not keep the world loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldHandle {
    pub name: WorldName,
    /// The host's on-disk identity for the world (its unique-id marker).
    pub uid: Uuid,
    pub environment: Environment,
    pub world_type: WorldType,
    pub seed: i64,
    pub spawn: SpawnPoint,
    pub player_count: usize,
}

impl WorldHandle {
    pub fn has_players(&self) -> bool {
        self.player_count > 0
    }
}
