//! Application configuration from environment variables.

use std::path::PathBuf;

use fieldnote_core::{defaults, Error, Permissions, Result};

/// Typed application configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `DATABASE_URL` | — (required) | PostgreSQL connection string |
/// | `FIELDNOTE_MEDIA_ROOT` | `<data dir>/fieldnote/media` | Blob storage root |
/// | `FIELDNOTE_MEDIA_BASE_URL` | `http://localhost:8080/media` | Public URL prefix for blobs |
/// | `FIELDNOTE_GEOCODER_URL` | Nominatim | Reverse geocoding endpoint |
/// | `FIELDNOTE_GEOFENCE_RADIUS_M` | `1000` | Proximity trigger radius |
/// | `FIELDNOTE_GRANT_LOCATION` | `true` | Foreground location grant |
/// | `FIELDNOTE_GRANT_BACKGROUND_LOCATION` | `true` | Background location grant |
/// | `FIELDNOTE_GRANT_MICROPHONE` | `true` | Microphone grant |
/// | `FIELDNOTE_GRANT_NOTIFICATIONS` | `true` | Notification grant |
/// | `FIELDNOTE_SEED_DEMO` | `true` | Seed demo notes into an empty store |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub media_root: PathBuf,
    pub media_base_url: String,
    pub geocoder_url: String,
    pub geofence_radius_m: f64,
    pub permissions: Permissions,
    pub seed_demo_data: bool,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".into()))?;

        let media_root = std::env::var("FIELDNOTE_MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join("fieldnote")
                    .join("media")
            });

        let media_base_url = std::env::var("FIELDNOTE_MEDIA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/media".to_string());

        let geocoder_url = std::env::var("FIELDNOTE_GEOCODER_URL")
            .unwrap_or_else(|_| defaults::GEOCODER_URL.to_string());

        let geofence_radius_m = std::env::var("FIELDNOTE_GEOFENCE_RADIUS_M")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults::GEOFENCE_RADIUS_M);

        let permissions = Permissions {
            location: env_flag("FIELDNOTE_GRANT_LOCATION", true),
            background_location: env_flag("FIELDNOTE_GRANT_BACKGROUND_LOCATION", true),
            microphone: env_flag("FIELDNOTE_GRANT_MICROPHONE", true),
            notifications: env_flag("FIELDNOTE_GRANT_NOTIFICATIONS", true),
        };

        Ok(Self {
            database_url,
            media_root,
            media_base_url,
            geocoder_url,
            geofence_radius_m,
            permissions,
            seed_demo_data: env_flag("FIELDNOTE_SEED_DEMO", true),
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => v != "false" && v != "0",
        Err(_) => default,
    }
}
