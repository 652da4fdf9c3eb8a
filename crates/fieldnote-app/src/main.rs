//! fieldnoted - the fieldnote diary engine daemon.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fieldnote_app::{seed_demo_notes, AppConfig};
use fieldnote_core::{EventBus, NoteStore};
use fieldnote_db::{create_pool, run_migrations, PgNoteStore};
use fieldnote_geo::{
    proximity_channel, spawn_geofence_watcher, CachedLocationProvider, GeofenceRegistrar,
    LocalNotifier,
};
use fieldnote_media::{FilesystemBackend, MediaStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    info!(subsystem = "app", op = "startup", "Starting fieldnoted");

    // Storage
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let bus = Arc::new(EventBus::default());
    let store: Arc<dyn NoteStore> = Arc::new(PgNoteStore::new(pool.clone(), bus.clone()));

    // Media
    let backend = FilesystemBackend::new(&config.media_root);
    if let Err(e) = backend.validate().await {
        anyhow::bail!("media storage validation failed: {}", e);
    }
    let _media = Arc::new(MediaStore::new(backend, &config.media_base_url));

    // Demo content on first start
    if config.seed_demo_data {
        let seeded = seed_demo_notes(store.as_ref()).await?;
        if seeded > 0 {
            info!(subsystem = "app", result_count = seeded, "Demo data seeded");
        }
    }

    // Geofencing: restore one fence per located note, then watch for
    // proximity transitions.
    let registrar = Arc::new(GeofenceRegistrar::with_radius(
        config.permissions,
        config.geofence_radius_m,
    ));
    for note in store.list().await? {
        if note.has_location() {
            registrar.add_for_note(&note).await;
        }
    }

    let provider = Arc::new(CachedLocationProvider::new());
    let notifier = Arc::new(LocalNotifier::new(proximity_channel()));
    let watcher = spawn_geofence_watcher(
        registrar.clone(),
        provider.fixes(),
        notifier.clone(),
        config.permissions,
        bus.clone(),
    );

    let fence_count = registrar.len().await;
    info!(
        subsystem = "app",
        op = "ready",
        fences = fence_count,
        "fieldnoted is running; press ctrl-c to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!(subsystem = "app", op = "shutdown", "Shutting down");
    watcher.abort();

    Ok(())
}
