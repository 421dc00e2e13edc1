//! Headless world registry.
//!
//! A registry for running the engine without a game server attached. A world is
//! a directory in the world container holding a `level.dat` marker (JSON) and a
//! `uid.dat` identity file; `session.lock` is present while the world is live.
//! Players are only counted: they can be seated in a world before it loads,
//! and evacuation moves the count to the target world.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worldkeeper_domain::{
    Environment, GeneratorKind, SpawnPoint, WorldConfig, WorldHandle, WorldName, WorldType,
};

use super::thread::assert_host_thread;
use crate::infrastructure::directory::{SESSION_LOCK_FILE, UID_MARKER_FILE, WORLD_MARKER_FILE};
use crate::infrastructure::ports::WorldRegistry;

/// On-disk level data. Once written it wins over any requested configuration,
/// just like a real server reading an existing world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelData {
    environment: Environment,
    world_type: WorldType,
    #[serde(default)]
    generator_kind: GeneratorKind,
    generate_structures: bool,
    seed: i64,
    spawn: SpawnPoint,
    #[serde(default)]
    last_played: i64,
}

impl LevelData {
    fn from_config(config: &WorldConfig) -> Self {
        let spawn = config
            .generator
            .chunk_generator()
            .map(|generator| generator.spawn_point())
            .unwrap_or_default();
        Self {
            environment: config.environment,
            world_type: config.world_type,
            generator_kind: config.generator,
            generate_structures: config.generate_structures,
            seed: config.seed,
            spawn,
            last_played: 0,
        }
    }
}

struct LiveWorld {
    handle: WorldHandle,
    level: LevelData,
    dir: PathBuf,
    pvp_enabled: bool,
    keep_spawn_loaded: bool,
}

/// File-backed registry with no game simulation behind it.
pub struct HeadlessRegistry {
    container: PathBuf,
    primary: Option<WorldName>,
    live: Vec<LiveWorld>,
    /// Players waiting for a world to load.
    seated: HashMap<WorldName, usize>,
}

impl HeadlessRegistry {
    pub fn new(container: impl Into<PathBuf>) -> Self {
        Self {
            container: container.into(),
            primary: None,
            live: Vec::new(),
            seated: HashMap::new(),
        }
    }

    /// Mark `name` as the primary world: it is the default evacuation target
    /// and can never be unloaded.
    pub fn with_primary(mut self, name: WorldName) -> Self {
        self.primary = Some(name);
        self
    }

    /// Put `count` players into `name` as soon as it is instantiated.
    pub fn with_players(mut self, name: WorldName, count: usize) -> Self {
        self.seated.insert(name, count);
        self
    }

    fn position(&self, name: &WorldName) -> Option<usize> {
        self.live.iter().position(|w| &w.handle.name == name)
    }

    fn open_or_create(&self, config: &WorldConfig) -> io::Result<LiveWorld> {
        let dir = self.container.join(config.name.as_str());
        fs::create_dir_all(&dir)?;

        let marker = dir.join(WORLD_MARKER_FILE);
        let level = if marker.exists() {
            serde_json::from_slice::<LevelData>(&fs::read(&marker)?)?
        } else {
            let level = LevelData::from_config(config);
            write_level(&dir, &level)?;
            level
        };

        let uid = read_or_create_uid(&dir)?;
        fs::write(
            dir.join(SESSION_LOCK_FILE),
            chrono::Utc::now().timestamp_millis().to_string(),
        )?;

        Ok(LiveWorld {
            handle: WorldHandle {
                name: config.name.clone(),
                uid,
                environment: level.environment,
                world_type: level.world_type,
                seed: level.seed,
                spawn: level.spawn,
                player_count: 0,
            },
            level,
            dir,
            pvp_enabled: config.pvp_enabled,
            keep_spawn_loaded: config.keep_spawn_loaded,
        })
    }
}

impl WorldRegistry for HeadlessRegistry {
    fn instantiate(&mut self, config: &WorldConfig) -> Option<WorldHandle> {
        assert_host_thread();
        if let Some(index) = self.position(&config.name) {
            return Some(self.live[index].handle.clone());
        }

        match self.open_or_create(config) {
            Ok(mut world) => {
                tracing::debug!(
                    world = %config.name,
                    seed = world.level.seed,
                    pvp = world.pvp_enabled,
                    keep_spawn_loaded = world.keep_spawn_loaded,
                    "Headless world loaded"
                );
                world.handle.player_count = self.seated.remove(&config.name).unwrap_or(0);
                let handle = world.handle.clone();
                self.live.push(world);
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(world = %config.name, error = %e, "Failed to open world");
                None
            }
        }
    }

    fn lookup(&self, name: &WorldName) -> Option<WorldHandle> {
        assert_host_thread();
        self.position(name).map(|i| self.live[i].handle.clone())
    }

    fn unload_and_save(&mut self, name: &WorldName) -> bool {
        assert_host_thread();
        if self.primary.as_ref() == Some(name) {
            tracing::warn!(world = %name, "Refusing to unload the primary world");
            return false;
        }
        let Some(index) = self.position(name) else {
            return false;
        };
        if self.live[index].handle.has_players() {
            return false;
        }

        let mut world = self.live.remove(index);
        if let Err(e) = save_level(&mut world) {
            tracing::warn!(world = %name, error = %e, "Failed to save world before unload");
        }
        if let Err(e) = remove_if_exists(&world.dir.join(SESSION_LOCK_FILE)) {
            tracing::warn!(world = %name, error = %e, "Failed to release session lock");
        }
        true
    }

    fn list_live(&self) -> Vec<WorldHandle> {
        assert_host_thread();
        self.live.iter().map(|w| w.handle.clone()).collect()
    }

    fn save(&mut self, name: &WorldName) -> bool {
        assert_host_thread();
        let Some(index) = self.position(name) else {
            return false;
        };
        match save_level(&mut self.live[index]) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(world = %name, error = %e, "Failed to save world");
                false
            }
        }
    }

    fn evacuate_players(&mut self, from: &WorldName, to: &WorldName) -> usize {
        assert_host_thread();
        let (Some(from), Some(to)) = (self.position(from), self.position(to)) else {
            return 0;
        };
        let moved = std::mem::take(&mut self.live[from].handle.player_count);
        self.live[to].handle.player_count += moved;
        moved
    }

    fn default_world(&self) -> Option<WorldName> {
        assert_host_thread();
        self.primary
            .clone()
            .filter(|primary| self.position(primary).is_some())
            .or_else(|| self.live.first().map(|w| w.handle.name.clone()))
    }
}

fn save_level(world: &mut LiveWorld) -> io::Result<()> {
    world.level.last_played = chrono::Utc::now().timestamp_millis();
    write_level(&world.dir, &world.level)
}

fn write_level(dir: &Path, level: &LevelData) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(level)?;
    fs::write(dir.join(WORLD_MARKER_FILE), bytes)
}

fn read_or_create_uid(dir: &Path) -> io::Result<Uuid> {
    let path = dir.join(UID_MARKER_FILE);
    if let Ok(existing) = fs::read_to_string(&path) {
        if let Ok(uid) = Uuid::parse_str(existing.trim()) {
            return Ok(uid);
        }
    }
    let uid = Uuid::new_v4();
    fs::write(&path, uid.to_string())?;
    Ok(uid)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
