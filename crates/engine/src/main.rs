//! Worldkeeper Engine - Main entry point.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldkeeper_engine::infrastructure::{
    host::HeadlessRegistry, notifier::LoggingNotifier, settings::EngineSettings,
};
use worldkeeper_engine::App;

fn main() -> anyhow::Result<()> {
    // Load environment from repo root as well as the working directory.
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldkeeper_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Worldkeeper Engine");

    let settings = EngineSettings::from_env();
    tracing::info!(
        container = %settings.world_container.display(),
        metadata = %settings.metadata_file.display(),
        workers = settings.file_op_workers,
        confirmation_timeout_secs = settings.confirmation_timeout.as_secs(),
        "Configuration loaded"
    );

    // File operations run on the runtime's worker pool; size it the same way.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.file_op_workers)
        .thread_name("worldkeeper-worker")
        .enable_all()
        .build()?;

    runtime.block_on(run(settings))
}

async fn run(settings: EngineSettings) -> anyhow::Result<()> {
    let registry = HeadlessRegistry::new(&settings.world_container)
        .with_primary(settings.primary_world.clone());
    let app = App::new(settings, Box::new(registry), Arc::new(LoggingNotifier)).await?;

    let summary = app.start().await;
    tracing::info!(
        loaded = summary.loaded.len(),
        failed = summary.failed.len(),
        "Engine ready, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    app.shutdown().await;
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
    let _ = dotenvy::dotenv();
}
