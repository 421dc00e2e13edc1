//! The host's live-world registry.

use worldkeeper_domain::{WorldConfig, WorldHandle, WorldName};

// =============================================================================
// World Registry Port
// =============================================================================

/// The host server's registry of live worlds.
///
/// Implementations are NOT safe for concurrent use and must only ever be called
/// from the host thread. The engine never calls this trait directly; every call
/// goes through [`crate::infrastructure::host::HostThread::run`], which owns the
/// registry on its dedicated thread.
#[cfg_attr(test, mockall::automock)]
pub trait WorldRegistry: Send {
    /// Create or load a world from its configuration.
    ///
    /// Returns the existing handle if the world is already live, `None` if the
    /// host refuses (corrupt files, invalid configuration). PvP and spawn-loading
    /// flags from `config` are applied to the live world.
    fn instantiate(&mut self, config: &WorldConfig) -> Option<WorldHandle>;

    /// The live world with this name, if any.
    fn lookup(&self, name: &WorldName) -> Option<WorldHandle>;

    /// Save the world to disk and remove it from the registry.
    ///
    /// Returns `false` if the world is not live or the host refuses to unload it.
    fn unload_and_save(&mut self, name: &WorldName) -> bool;

    /// All live worlds, primary world first.
    fn list_live(&self) -> Vec<WorldHandle>;

    /// Flush a live world to disk without unloading it.
    fn save(&mut self, name: &WorldName) -> bool;

    /// Teleport every player in `from` to the spawn point of `to`.
    ///
    /// Returns how many players were moved.
    fn evacuate_players(&mut self, from: &WorldName, to: &WorldName) -> usize;

    /// The host's primary world, used as the evacuation target by default.
    fn default_world(&self) -> Option<WorldName>;
}
