//! End-to-end lifecycle tests against the headless registry, plus mock-driven
//! tests for live-world edge cases the headless registry never produces.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use mockall::Sequence;
use tempfile::TempDir;
use uuid::Uuid;
use worldkeeper_domain::{
    Environment, GeneratorKind, SpawnPoint, WorldConfig, WorldHandle, WorldName, WorldType,
};

use super::*;
use crate::infrastructure::directory::{SESSION_LOCK_FILE, UID_MARKER_FILE, WORLD_MARKER_FILE};
use crate::infrastructure::host::HeadlessRegistry;
use crate::infrastructure::ports::MockWorldRegistry;

fn name(s: &str) -> WorldName {
    WorldName::new(s).expect("valid name")
}

struct Harness {
    _temp: TempDir,
    container: PathBuf,
    metadata_file: PathBuf,
    store: Arc<MetadataStore>,
    lifecycle: WorldLifecycle,
}

impl Harness {
    fn dir(&self, world: &str) -> PathBuf {
        self.container.join(world)
    }
}

fn harness_in(
    temp: TempDir,
    registry: Box<dyn WorldRegistry>,
    fallback: Option<WorldName>,
) -> Harness {
    let container = temp.path().join("worlds");
    fs::create_dir_all(&container).expect("container");
    let metadata_file = temp.path().join("plugins").join("worlds.json");

    let host = Arc::new(HostThread::spawn(registry).expect("spawn host"));
    let store = Arc::new(MetadataStore::new(&metadata_file));
    let lifecycle = WorldLifecycle::new(
        host,
        store.clone(),
        Arc::new(DirectoryOps::new(2)),
        &container,
        fallback,
    );

    Harness {
        _temp: temp,
        container,
        metadata_file,
        store,
        lifecycle,
    }
}

fn harness_with(registry: MockWorldRegistry, fallback: Option<WorldName>) -> Harness {
    harness_in(
        tempfile::tempdir().expect("tempdir"),
        Box::new(registry),
        fallback,
    )
}

/// Headless registry over a temp container with the primary world `world` live.
async fn headless() -> Harness {
    headless_with_players(&[]).await
}

/// Like [`headless`], with players waiting to join the given worlds.
async fn headless_with_players(players: &[(&str, usize)]) -> Harness {
    let temp = tempfile::tempdir().expect("tempdir");
    let registry = players.iter().fold(
        HeadlessRegistry::new(temp.path().join("worlds")).with_primary(name("world")),
        |registry, (world, count)| registry.with_players(name(world), *count),
    );
    let harness = harness_in(temp, Box::new(registry), None);

    harness
        .lifecycle
        .host
        .run(|registry| registry.instantiate(&WorldConfig::new(name("world"))))
        .await
        .expect("run")
        .expect("primary world");
    harness
}

fn arena() -> WorldConfig {
    WorldConfig {
        environment: Environment::Normal,
        generator: GeneratorKind::Void,
        seed: 42,
        ..WorldConfig::new(name("arena"))
    }
}

fn live(world: &str, players: usize) -> WorldHandle {
    WorldHandle {
        name: name(world),
        uid: Uuid::nil(),
        environment: Environment::Normal,
        world_type: WorldType::Normal,
        seed: 0,
        spawn: SpawnPoint::default(),
        player_count: players,
    }
}

fn write_marker(dir: &std::path::Path) {
    fs::create_dir_all(dir).expect("mkdir");
    fs::write(dir.join(WORLD_MARKER_FILE), b"{}").expect("marker");
}

// =============================================================================
// Create / Load
// =============================================================================

#[tokio::test]
async fn create_then_load_returns_the_same_live_world() {
    let h = headless().await;

    let created = h.lifecycle.create(arena()).await;
    assert!(created.is_success(), "{:?}", created.outcome);
    let uid = created.handle().expect("handle").uid;

    let first = h.lifecycle.load(&name("arena")).await.expect("load");
    let second = h.lifecycle.load(&name("arena")).await.expect("load again");

    assert_eq!(first.uid, uid);
    assert_eq!(second.uid, uid);
    let live = h.lifecycle.live_worlds().await.expect("live");
    assert_eq!(live.iter().filter(|w| w.name == name("arena")).count(), 1);
}

#[tokio::test]
async fn create_rejects_a_known_name() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());

    let again = h.lifecycle.create(arena()).await;
    assert!(matches!(again.outcome, Err(LifecycleError::AlreadyExists(_))));

    // The primary world is live but untracked; it is still taken.
    let primary = h.lifecycle.create(WorldConfig::new(name("world"))).await;
    assert!(matches!(primary.outcome, Err(LifecycleError::AlreadyExists(_))));
}

#[tokio::test]
async fn failed_creation_stores_nothing() {
    let mut registry = MockWorldRegistry::new();
    registry.expect_lookup().returning(|_| None);
    registry.expect_instantiate().times(1).returning(|_| None);
    let h = harness_with(registry, None);

    let result = h.lifecycle.create(arena()).await;

    assert!(matches!(result.outcome, Err(LifecycleError::HostRejected(_))));
    assert!(!result.is_success());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn load_of_unknown_world_is_not_found() {
    let h = headless().await;

    let result = h.lifecycle.load(&name("nowhere")).await;

    assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    assert!(!h.dir("nowhere").exists());
}

#[tokio::test]
async fn load_refuses_a_directory_without_marker_even_with_metadata() {
    let h = headless().await;
    h.store.put(WorldConfig::new(name("husk")));
    fs::create_dir_all(h.dir("husk").join("region")).expect("mkdir");

    let result = h.lifecycle.load(&name("husk")).await;

    assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    assert!(!h.dir("husk").join(WORLD_MARKER_FILE).exists());
}

#[tokio::test]
async fn load_picks_up_an_untracked_world_directory_without_storing_it() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    h.lifecycle.unload(&name("arena")).await.expect("unload");
    h.store.remove(&name("arena"));

    let handle = h.lifecycle.load(&name("arena")).await.expect("load");

    assert_eq!(handle.seed, 42);
    assert!(h.lifecycle.config(&name("arena")).is_none());
}

#[tokio::test]
async fn load_all_loads_only_auto_load_worlds() {
    let h = headless().await;
    h.store.put(WorldConfig::new(name("alpha")));
    h.store.put(WorldConfig::new(name("beta")));
    h.store.put(WorldConfig {
        auto_load_on_startup: false,
        ..WorldConfig::new(name("gamma"))
    });

    let summary = h.lifecycle.load_all().await;

    assert_eq!(summary.requested, 2);
    assert_eq!(summary.loaded, vec![name("alpha"), name("beta")]);
    assert!(summary.failed.is_empty());
    assert!(h.lifecycle.world(&name("gamma")).await.expect("lookup").is_none());
}

#[tokio::test]
async fn load_all_failures_do_not_abort_the_batch() {
    let h = headless().await;
    h.store.put(WorldConfig::new(name("alpha")));
    h.store.put(WorldConfig::new(name("broken")));
    fs::create_dir_all(h.dir("broken")).expect("mkdir");
    fs::write(h.dir("broken").join(WORLD_MARKER_FILE), b"garbage").expect("write");

    let summary = h.lifecycle.load_all().await;

    assert_eq!(summary.loaded, vec![name("alpha")]);
    assert_eq!(summary.failed.len(), 1);
    assert!(matches!(
        summary.failed[0],
        (ref n, LifecycleError::HostRejected(_)) if *n == name("broken")
    ));
}

// =============================================================================
// Unload / Delete
// =============================================================================

#[tokio::test]
async fn unload_of_a_world_that_is_not_live_returns_false() {
    let h = headless().await;
    assert!(!h.lifecycle.unload(&name("arena")).await.expect("unload"));
}

#[tokio::test]
async fn unload_evacuates_players_before_unloading() {
    let mut registry = MockWorldRegistry::new();
    let mut seq = Sequence::new();
    registry.expect_lookup().returning(|n| match n.as_str() {
        "arena" => Some(live("arena", 3)),
        "world" => Some(live("world", 0)),
        _ => None,
    });
    registry
        .expect_default_world()
        .returning(|| Some(WorldName::new("world").expect("valid")));
    registry
        .expect_evacuate_players()
        .withf(|from, to| from.as_str() == "arena" && to.as_str() == "world")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| 3);
    registry
        .expect_unload_and_save()
        .withf(|n| n.as_str() == "arena")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| true);
    let h = harness_with(registry, None);

    assert!(h.lifecycle.unload(&name("arena")).await.expect("unload"));
}

#[tokio::test]
async fn configured_fallback_wins_over_the_host_default() {
    let mut registry = MockWorldRegistry::new();
    registry.expect_lookup().returning(|n| match n.as_str() {
        "arena" => Some(live("arena", 1)),
        "lobby" => Some(live("lobby", 0)),
        "world" => Some(live("world", 0)),
        _ => None,
    });
    registry
        .expect_default_world()
        .returning(|| Some(WorldName::new("world").expect("valid")));
    registry
        .expect_evacuate_players()
        .withf(|from, to| from.as_str() == "arena" && to.as_str() == "lobby")
        .times(1)
        .returning(|_, _| 1);
    registry.expect_unload_and_save().returning(|_| true);
    let h = harness_with(registry, Some(name("lobby")));

    assert!(h.lifecycle.unload(&name("arena")).await.expect("unload"));
}

#[tokio::test]
async fn unload_without_a_fallback_is_in_use() {
    let mut registry = MockWorldRegistry::new();
    registry.expect_lookup().returning(|n| match n.as_str() {
        "world" => Some(live("world", 5)),
        _ => None,
    });
    // The only candidate is the world being unloaded.
    registry
        .expect_default_world()
        .returning(|| Some(WorldName::new("world").expect("valid")));
    registry.expect_evacuate_players().never();
    registry.expect_unload_and_save().never();
    let h = harness_with(registry, None);

    let result = h.lifecycle.unload(&name("world")).await;

    assert!(matches!(result, Err(LifecycleError::InUse(_))));
}

#[tokio::test]
async fn delete_after_create_removes_metadata_and_directory() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    assert!(h.dir("arena").exists());

    h.lifecycle.delete(&name("arena")).await.expect("delete");

    assert!(h.lifecycle.config(&name("arena")).is_none());
    assert!(!h.dir("arena").exists());
    assert!(h.lifecycle.world(&name("arena")).await.expect("lookup").is_none());
}

#[tokio::test]
async fn delete_that_cannot_vacate_touches_nothing() {
    let mut registry = MockWorldRegistry::new();
    registry.expect_lookup().returning(|n| match n.as_str() {
        "arena" => Some(live("arena", 2)),
        _ => None,
    });
    registry.expect_default_world().returning(|| None);
    registry.expect_unload_and_save().never();
    let h = harness_with(registry, None);
    write_marker(&h.dir("arena"));
    let config = arena();
    h.store.put(config.clone());

    let result = h.lifecycle.delete(&name("arena")).await;

    assert!(matches!(result, Err(LifecycleError::InUse(_))));
    assert_eq!(h.lifecycle.config(&name("arena")), Some(config));
    assert!(h.dir("arena").join(WORLD_MARKER_FILE).exists());
}

#[tokio::test]
async fn delete_refused_by_host_touches_nothing() {
    let h = headless().await;
    h.store.put(WorldConfig::new(name("world")));

    // The headless registry never unloads its primary world.
    let result = h.lifecycle.delete(&name("world")).await;

    assert!(matches!(result, Err(LifecycleError::InUse(_))));
    assert!(h.store.contains(&name("world")));
    assert!(h.dir("world").join(WORLD_MARKER_FILE).exists());
}

#[tokio::test]
async fn delete_of_an_unloaded_world_is_allowed() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    assert!(h.lifecycle.unload(&name("arena")).await.expect("unload"));

    h.lifecycle.delete(&name("arena")).await.expect("delete");

    assert!(!h.dir("arena").exists());
    assert!(!h.store.contains(&name("arena")));
}

#[tokio::test]
async fn delete_of_an_unknown_world_is_not_found() {
    let h = headless().await;
    fs::create_dir_all(h.dir("plugins_data")).expect("mkdir");

    let result = h.lifecycle.delete(&name("plugins_data")).await;

    assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    assert!(h.dir("plugins_data").exists());
}

#[tokio::test]
async fn delete_leaves_files_outside_the_world_alone() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    let portals = h.container.join("portals.json");
    fs::write(&portals, b"{}").expect("write");

    h.lifecycle.delete(&name("arena")).await.expect("delete");

    assert!(portals.exists());
    assert!(h.dir("world").exists());
}

// =============================================================================
// Clone / Rename / Import
// =============================================================================

#[tokio::test]
async fn clone_copies_settings_and_drops_identity_files() {
    let h = headless().await;
    let source = WorldConfig {
        environment: Environment::Nether,
        world_type: WorldType::LargeBiomes,
        generator: GeneratorKind::Flat,
        generate_structures: false,
        seed: 1337,
        pvp_enabled: false,
        keep_spawn_loaded: true,
        auto_load_on_startup: false,
        ..WorldConfig::new(name("template"))
    };
    let source_handle = h
        .lifecycle
        .create(source.clone())
        .await
        .outcome
        .expect("create");
    fs::write(h.dir("template").join("data.dat"), b"payload").expect("write");

    let clone = h
        .lifecycle
        .clone_world(&name("template"), &name("copy"))
        .await
        .expect("clone");

    let copied = h.lifecycle.config(&name("copy")).expect("copied config");
    assert!(copied.same_settings(&source));
    assert_eq!(copied.name, name("copy"));
    assert_ne!(copied.uuid, source.uuid);
    assert_ne!(clone.uid, source_handle.uid);
    assert_eq!(
        fs::read(h.dir("copy").join("data.dat")).expect("read"),
        b"payload"
    );
    // The source stays live and untouched.
    assert!(h.lifecycle.world(&name("template")).await.expect("lookup").is_some());
    assert_eq!(h.lifecycle.config(&name("template")), Some(source));
}

#[tokio::test]
async fn clone_rejects_missing_source_and_taken_target() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());

    let missing = h.lifecycle.clone_world(&name("ghost"), &name("copy")).await;
    let taken = h.lifecycle.clone_world(&name("arena"), &name("world")).await;
    let same = h.lifecycle.clone_world(&name("arena"), &name("arena")).await;

    assert!(matches!(missing, Err(LifecycleError::NotFound(_))));
    assert!(matches!(taken, Err(LifecycleError::AlreadyExists(_))));
    assert!(matches!(same, Err(LifecycleError::AlreadyExists(_))));
}

#[tokio::test]
async fn clone_rejected_by_host_is_rolled_back() {
    let h = headless().await;
    h.store.put(WorldConfig::new(name("broken")));
    fs::create_dir_all(h.dir("broken")).expect("mkdir");
    fs::write(h.dir("broken").join(WORLD_MARKER_FILE), b"garbage").expect("write");

    let result = h.lifecycle.clone_world(&name("broken"), &name("copy")).await;

    assert!(matches!(result, Err(LifecycleError::HostRejected(_))));
    assert!(!h.store.contains(&name("copy")));
    assert!(!h.dir("copy").exists());
}

#[tokio::test]
async fn clone_excludes_volatile_files_even_from_an_unloaded_source() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    assert!(h.lifecycle.unload(&name("arena")).await.expect("unload"));
    // A stale lock left behind by a crashed host.
    fs::write(h.dir("arena").join(SESSION_LOCK_FILE), b"stale").expect("write");
    let source_uid = fs::read_to_string(h.dir("arena").join(UID_MARKER_FILE)).expect("uid");

    let clone = h
        .lifecycle
        .clone_world(&name("arena"), &name("arena_copy"))
        .await
        .expect("clone");

    assert_ne!(clone.uid.to_string(), source_uid.trim());
    let copy_lock = fs::read(h.dir("arena_copy").join(SESSION_LOCK_FILE)).expect("own lock");
    assert_ne!(copy_lock, b"stale");
    assert!(h.dir("arena").join(SESSION_LOCK_FILE).exists());
}

#[tokio::test]
async fn rename_moves_directory_and_metadata() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    let before = h.lifecycle.config(&name("arena")).expect("config");

    let handle = h
        .lifecycle
        .rename(&name("arena"), &name("colosseum"))
        .await
        .expect("rename");

    assert_eq!(handle.name, name("colosseum"));
    assert!(h.lifecycle.config(&name("arena")).is_none());
    let after = h.lifecycle.config(&name("colosseum")).expect("renamed config");
    assert!(after.same_settings(&before));
    assert_ne!(after.uuid, before.uuid);
    assert!(!h.dir("arena").exists());
    assert!(h.dir("colosseum").join(WORLD_MARKER_FILE).exists());
    assert!(h.lifecycle.world(&name("arena")).await.expect("lookup").is_none());
    assert!(h.lifecycle.world(&name("colosseum")).await.expect("lookup").is_some());
}

#[tokio::test]
async fn rename_of_a_world_that_cannot_be_vacated_is_aborted() {
    let h = headless().await;
    h.store.put(WorldConfig::new(name("world")));

    let result = h.lifecycle.rename(&name("world"), &name("hub")).await;

    assert!(matches!(result, Err(LifecycleError::InUse(_))));
    assert!(h.dir("world").exists());
    assert!(!h.dir("hub").exists());
    assert!(h.store.contains(&name("world")));
}

#[tokio::test]
async fn rename_rejects_a_taken_name() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    h.store.put(WorldConfig::new(name("reserved")));

    let result = h.lifecycle.rename(&name("arena"), &name("reserved")).await;

    assert!(matches!(result, Err(LifecycleError::AlreadyExists(_))));
    assert!(h.dir("arena").exists());
}

#[tokio::test]
async fn rename_evacuates_players_to_the_fallback_first() {
    let h = headless_with_players(&[("arena", 3)]).await;
    let created = h.lifecycle.create(arena()).await;
    assert_eq!(created.handle().map(|w| w.player_count), Some(3));

    let handle = h
        .lifecycle
        .rename(&name("arena"), &name("colosseum"))
        .await
        .expect("rename");

    assert_eq!(handle.player_count, 0);
    let primary = h
        .lifecycle
        .world(&name("world"))
        .await
        .expect("lookup")
        .expect("primary live");
    assert_eq!(primary.player_count, 3);
    assert!(!h.dir("arena").exists());
    assert!(h.dir("colosseum").join(WORLD_MARKER_FILE).exists());
}

#[tokio::test]
async fn delete_evacuates_players_before_removing_files() {
    let h = headless_with_players(&[("arena", 2)]).await;
    assert!(h.lifecycle.create(arena()).await.is_success());

    h.lifecycle.delete(&name("arena")).await.expect("delete");

    let primary = h
        .lifecycle
        .world(&name("world"))
        .await
        .expect("lookup")
        .expect("primary live");
    assert_eq!(primary.player_count, 2);
    assert!(!h.dir("arena").exists());
}

#[tokio::test]
async fn rename_vacates_and_unloads_before_moving_the_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let old_dir = temp.path().join("worlds").join("arena");
    let new_dir = temp.path().join("worlds").join("colosseum");

    let mut registry = MockWorldRegistry::new();
    let mut seq = Sequence::new();
    registry.expect_lookup().returning(|n| match n.as_str() {
        "arena" => Some(live("arena", 2)),
        "world" => Some(live("world", 0)),
        _ => None,
    });
    registry
        .expect_default_world()
        .returning(|| Some(WorldName::new("world").expect("valid")));
    registry
        .expect_evacuate_players()
        .withf(|from, to| from.as_str() == "arena" && to.as_str() == "world")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| 2);
    let (before_old, before_new) = (old_dir.clone(), new_dir.clone());
    registry
        .expect_unload_and_save()
        .withf(|n| n.as_str() == "arena")
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| before_old.exists() && !before_new.exists());
    let (after_old, after_new) = (old_dir.clone(), new_dir.clone());
    registry
        .expect_instantiate()
        .withf(|config| config.name.as_str() == "colosseum")
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| {
            (!after_old.exists() && after_new.exists()).then(|| live("colosseum", 0))
        });
    let h = harness_in(temp, Box::new(registry), None);
    write_marker(&old_dir);
    h.store.put(arena());

    let handle = h
        .lifecycle
        .rename(&name("arena"), &name("colosseum"))
        .await
        .expect("rename");

    assert_eq!(handle.name, name("colosseum"));
    assert!(h.store.contains(&name("colosseum")));
}

#[tokio::test]
async fn clone_saves_a_live_source_before_copying() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source_dir = temp.path().join("worlds").join("template");
    let target_dir = temp.path().join("worlds").join("copy");

    let mut registry = MockWorldRegistry::new();
    let mut seq = Sequence::new();
    registry.expect_lookup().returning(|n| match n.as_str() {
        "template" => Some(live("template", 0)),
        _ => None,
    });
    let flushed_into = source_dir.clone();
    registry
        .expect_save()
        .withf(|n| n.as_str() == "template")
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| fs::write(flushed_into.join("chunks.dat"), b"fresh").is_ok());
    let copied_to = target_dir.clone();
    registry
        .expect_instantiate()
        .withf(|config| config.name.as_str() == "copy")
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| copied_to.join("chunks.dat").exists().then(|| live("copy", 0)));
    let h = harness_in(temp, Box::new(registry), None);
    write_marker(&source_dir);
    fs::write(source_dir.join("chunks.dat"), b"stale").expect("write");

    h.lifecycle
        .clone_world(&name("template"), &name("copy"))
        .await
        .expect("clone");

    assert_eq!(fs::read(target_dir.join("chunks.dat")).expect("read"), b"fresh");
}

#[tokio::test]
async fn clone_is_rolled_back_when_the_identity_marker_cannot_be_removed() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    // A directory squatting on the identity marker's name is copied, and
    // cannot be removed as a file.
    let squatter = h.dir("arena").join(UID_MARKER_FILE);
    fs::remove_file(&squatter).expect("remove uid");
    fs::create_dir_all(squatter.join("nested")).expect("mkdir");

    let result = h.lifecycle.clone_world(&name("arena"), &name("copy")).await;

    assert!(matches!(result, Err(LifecycleError::Io(_))));
    assert!(!h.dir("copy").exists());
    assert!(!h.store.contains(&name("copy")));

    fs::remove_dir_all(h.dir("arena").join(UID_MARKER_FILE)).expect("cleanup");
    h.lifecycle
        .clone_world(&name("arena"), &name("copy"))
        .await
        .expect("retry succeeds");
}

#[tokio::test]
async fn import_records_what_the_host_reports() {
    let h = headless().await;
    let original = WorldConfig {
        environment: Environment::TheEnd,
        world_type: WorldType::Amplified,
        seed: -4_000_000_000,
        ..WorldConfig::new(name("legacy"))
    };
    assert!(h.lifecycle.create(original).await.is_success());
    assert!(h.lifecycle.unload(&name("legacy")).await.expect("unload"));
    h.store.remove(&name("legacy"));

    let imported = h.lifecycle.import_world(&name("legacy")).await.expect("import");

    let live = h
        .lifecycle
        .world(&name("legacy"))
        .await
        .expect("lookup")
        .expect("live");
    assert_eq!(imported.seed, live.seed);
    assert_eq!(imported.environment, live.environment);
    assert_eq!(imported.seed, -4_000_000_000);
    assert_eq!(imported.environment, Environment::TheEnd);
    assert_eq!(imported.world_type, WorldType::Amplified);
    assert_eq!(h.lifecycle.config(&name("legacy")), Some(imported));
}

#[tokio::test]
async fn import_requires_an_untracked_marked_directory() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    fs::create_dir_all(h.dir("empty")).expect("mkdir");

    let tracked = h.lifecycle.import_world(&name("arena")).await;
    let unmarked = h.lifecycle.import_world(&name("empty")).await;
    let live_untracked = h.lifecycle.import_world(&name("world")).await;

    assert!(matches!(tracked, Err(LifecycleError::AlreadyExists(_))));
    assert!(matches!(unmarked, Err(LifecycleError::NotFound(_))));
    assert!(matches!(live_untracked, Err(LifecycleError::AlreadyExists(_))));
}

// =============================================================================
// Queries / Recovery
// =============================================================================

#[tokio::test]
async fn unloaded_world_names_lists_marked_directories_that_are_not_live() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    assert!(h.lifecycle.create(WorldConfig::new(name("event"))).await.is_success());
    assert!(h.lifecycle.unload(&name("event")).await.expect("unload"));
    write_marker(&h.dir("downloaded"));
    fs::create_dir_all(h.dir("not_a_world")).expect("mkdir");

    let names = h.lifecycle.unloaded_world_names().await.expect("list");

    assert_eq!(names, vec![name("downloaded"), name("event")]);
}

#[tokio::test]
async fn reconcile_reports_both_kinds_of_drift() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    h.store.put(WorldConfig::new(name("vanished")));
    write_marker(&h.dir("downloaded"));

    let report = h.lifecycle.reconcile().await.expect("reconcile");

    assert_eq!(report.untracked, vec![name("downloaded"), name("world")]);
    assert_eq!(report.missing, vec![name("vanished")]);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn metadata_survives_a_restart() {
    let h = headless().await;
    assert!(h.lifecycle.create(arena()).await.is_success());
    assert!(h
        .lifecycle
        .create(WorldConfig {
            environment: Environment::Nether,
            pvp_enabled: false,
            ..WorldConfig::new(name("hell"))
        })
        .await
        .is_success());
    let before = h.lifecycle.all_configs();

    h.lifecycle.shutdown().await;
    let reloaded = MetadataStore::load(&h.metadata_file).await;

    assert_eq!(reloaded.all_configs(), before);
}

#[tokio::test]
async fn name_locks_are_released_after_operations() {
    let h = headless().await;
    for i in 0..50 {
        let ghost = name(&format!("ghost_{i}"));
        assert!(h.lifecycle.load(&ghost).await.is_err());
        assert!(h.lifecycle.delete(&ghost).await.is_err());
    }
    assert!(h.lifecycle.create(arena()).await.is_success());
    h.lifecycle
        .rename(&name("arena"), &name("colosseum"))
        .await
        .expect("rename");

    assert!(h.lifecycle.locks.is_empty());
}

#[tokio::test]
async fn operations_after_shutdown_report_host_unavailable() {
    let h = headless().await;
    h.lifecycle.shutdown().await;

    let result = h.lifecycle.load(&name("world")).await;

    assert!(matches!(result, Err(LifecycleError::HostUnavailable(_))));
}

#[tokio::test]
async fn racing_create_and_delete_leave_a_consistent_world() {
    let h = headless().await;
    let race = name("race");

    let (created, deleted) = tokio::join!(
        h.lifecycle.create(WorldConfig::new(race.clone())),
        h.lifecycle.delete(&race),
    );

    assert!(created.is_success());
    let stored = h.store.contains(&name("race"));
    let on_disk = h.dir("race").join(WORLD_MARKER_FILE).exists();
    let is_live = h.lifecycle.world(&name("race")).await.expect("lookup").is_some();
    assert_eq!(stored, on_disk);
    assert_eq!(stored, is_live);
    match deleted {
        Ok(()) => assert!(!stored),
        Err(e) => {
            assert!(matches!(e, LifecycleError::NotFound(_)));
            assert!(stored);
        }
    }
}

// =============================================================================
// Scenario
// =============================================================================

#[tokio::test]
async fn arena_lifecycle_scenario() {
    let h = headless().await;

    let created = h.lifecycle.create(arena()).await;
    assert!(created.is_success());
    assert_eq!(h.lifecycle.config(&name("arena")).expect("stored").seed, 42);
    let stored = h.lifecycle.config(&name("arena"));

    assert!(h.lifecycle.unload(&name("arena")).await.expect("unload"));

    let reloaded = h.lifecycle.load(&name("arena")).await.expect("load");
    assert_eq!(reloaded.seed, 42);
    assert_eq!(h.lifecycle.config(&name("arena")), stored);

    h.lifecycle.delete(&name("arena")).await.expect("delete");

    let gone = h.lifecycle.load(&name("arena")).await;
    assert!(matches!(gone, Err(LifecycleError::NotFound(_))));
}
