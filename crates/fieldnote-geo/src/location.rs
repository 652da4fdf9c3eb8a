//! Device location access and the combined location resolver.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use fieldnote_core::defaults::FALLBACK_ADDRESS;
use fieldnote_core::Permissions;

use crate::geocode::Geocoder;

/// A location fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// When the fix was recorded (UTC).
    pub recorded_at: DateTime<Utc>,
}

impl Fix {
    /// A fix recorded now.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            recorded_at: Utc::now(),
        }
    }
}

/// Source of the most recent known device location.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// The most recent cached fix, or `None` when the platform cannot
    /// supply one. Never blocks beyond the underlying read.
    async fn last_known(&self) -> Option<Fix>;
}

/// Location provider fed by whatever positioning source the host wires in
/// (GPS bridge, network lookup, test harness).
///
/// Fixes are also published on a watch channel so the geofence watcher can
/// react to movement without polling.
pub struct CachedLocationProvider {
    fix_tx: watch::Sender<Option<Fix>>,
}

impl CachedLocationProvider {
    pub fn new() -> Self {
        let (fix_tx, _) = watch::channel(None);
        Self { fix_tx }
    }

    /// Record a new fix and publish it to watchers.
    pub fn update(&self, fix: Fix) {
        let _ = self.fix_tx.send(Some(fix));
    }

    /// Stream of fixes for the geofence watcher.
    pub fn fixes(&self) -> watch::Receiver<Option<Fix>> {
        self.fix_tx.subscribe()
    }
}

impl Default for CachedLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for CachedLocationProvider {
    async fn last_known(&self) -> Option<Fix> {
        *self.fix_tx.borrow()
    }
}

/// Combined resolver: permission checks, last known location, and
/// best-effort reverse geocoding.
pub struct LocationResolver {
    permissions: Permissions,
    provider: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(
        permissions: Permissions,
        provider: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            permissions,
            provider,
            geocoder,
        }
    }

    /// Precondition check; never fails.
    pub fn has_location_permission(&self) -> bool {
        self.permissions.has_location()
    }

    /// The most recent device location, or `None` when permission is
    /// missing or no fix is available.
    pub async fn last_known_location(&self) -> Option<Fix> {
        if !self.permissions.has_location() {
            return None;
        }
        self.provider.last_known().await
    }

    /// Reverse-geocode to a best-effort human string.
    ///
    /// Any failure (network, parse, empty result) yields the fallback
    /// placeholder — an address is never required for a note to be valid.
    pub async fn address_from_coords(&self, latitude: f64, longitude: f64) -> String {
        match self.geocoder.reverse(latitude, longitude).await {
            Ok(Some(resolved)) => resolved
                .format()
                .unwrap_or_else(|| FALLBACK_ADDRESS.to_string()),
            Ok(None) => FALLBACK_ADDRESS.to_string(),
            Err(e) => {
                warn!(
                    subsystem = "geo",
                    component = "resolver",
                    op = "reverse_geocode",
                    error = %e,
                    "Reverse geocoding failed, using placeholder"
                );
                FALLBACK_ADDRESS.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::StaticGeocoder;

    fn resolver(permissions: Permissions, provider: Arc<CachedLocationProvider>) -> LocationResolver {
        LocationResolver::new(permissions, provider, Arc::new(StaticGeocoder::empty()))
    }

    #[tokio::test]
    async fn test_last_known_none_without_permission() {
        let provider = Arc::new(CachedLocationProvider::new());
        provider.update(Fix::now(54.70, 20.50));

        let resolver = resolver(Permissions::none(), provider);
        assert!(!resolver.has_location_permission());
        assert!(resolver.last_known_location().await.is_none());
    }

    #[tokio::test]
    async fn test_last_known_returns_cached_fix() {
        let provider = Arc::new(CachedLocationProvider::new());
        provider.update(Fix::now(54.70, 20.50));

        let resolver = resolver(Permissions::all(), provider);
        let fix = resolver.last_known_location().await.unwrap();
        assert_eq!(fix.latitude, 54.70);
        assert_eq!(fix.longitude, 20.50);
    }

    #[tokio::test]
    async fn test_no_fix_yet_is_none() {
        let provider = Arc::new(CachedLocationProvider::new());
        let resolver = resolver(Permissions::all(), provider);
        assert!(resolver.last_known_location().await.is_none());
    }

    #[tokio::test]
    async fn test_address_falls_back_on_empty_geocoder() {
        let provider = Arc::new(CachedLocationProvider::new());
        let resolver = resolver(Permissions::all(), provider);
        let address = resolver.address_from_coords(54.70, 20.50).await;
        assert_eq!(address, FALLBACK_ADDRESS);
    }
}
