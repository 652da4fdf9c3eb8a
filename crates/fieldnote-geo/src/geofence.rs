//! Geofence registry and transition watcher.
//!
//! One circular region per note, keyed by the note id. A fence fires once
//! on its first outside→inside transition and never expires; re-adding a
//! note's fence re-arms the trigger.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fieldnote_core::defaults::{EARTH_RADIUS_M, GEOFENCE_RADIUS_M};
use fieldnote_core::{DiaryEvent, EventBus, Note, Permissions};

use crate::location::Fix;
use crate::notify::{Notification, Notifier, PROXIMITY_CHANNEL_ID};

/// Great-circle distance between two coordinate pairs, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// One registered circular trigger.
#[derive(Debug, Clone)]
pub struct Geofence {
    pub note_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    inside: bool,
    fired: bool,
}

impl Geofence {
    fn contains(&self, fix: &Fix) -> bool {
        haversine_m(self.latitude, self.longitude, fix.latitude, fix.longitude) <= self.radius_m
    }
}

/// Registry of proximity triggers, one per note.
pub struct GeofenceRegistrar {
    permissions: Permissions,
    radius_m: f64,
    fences: RwLock<HashMap<Uuid, Geofence>>,
}

impl GeofenceRegistrar {
    pub fn new(permissions: Permissions) -> Self {
        Self::with_radius(permissions, GEOFENCE_RADIUS_M)
    }

    pub fn with_radius(permissions: Permissions, radius_m: f64) -> Self {
        Self {
            permissions,
            radius_m,
            fences: RwLock::new(HashMap::new()),
        }
    }

    /// Register a trigger for the note's location.
    ///
    /// No-op when the note lacks coordinates or background location
    /// permission is missing. Re-registering an existing id replaces the
    /// fence and re-arms its trigger.
    pub async fn add_for_note(&self, note: &Note) {
        if !self.permissions.has_background_location() {
            debug!(
                subsystem = "geo",
                component = "geofence",
                op = "add",
                note_id = %note.id,
                "Background location not granted, skipping geofence"
            );
            return;
        }
        let Some((latitude, longitude)) = note.coordinates() else {
            return;
        };

        let fence = Geofence {
            note_id: note.id,
            latitude,
            longitude,
            radius_m: self.radius_m,
            inside: false,
            fired: false,
        };
        self.fences.write().await.insert(note.id, fence);
        info!(
            subsystem = "geo",
            component = "geofence",
            op = "add",
            note_id = %note.id,
            radius_m = self.radius_m,
            "Geofence registered"
        );
    }

    /// Unregister the note's trigger. No-op without permission or when no
    /// fence exists.
    pub async fn remove(&self, note_id: Uuid) {
        if !self.permissions.has_background_location() {
            return;
        }
        if self.fences.write().await.remove(&note_id).is_some() {
            info!(
                subsystem = "geo",
                component = "geofence",
                op = "remove",
                note_id = %note_id,
                "Geofence removed"
            );
        }
    }

    /// Whether a fence is registered for the note.
    pub async fn contains(&self, note_id: Uuid) -> bool {
        self.fences.read().await.contains_key(&note_id)
    }

    /// Number of registered fences.
    pub async fn len(&self) -> usize {
        self.fences.read().await.len()
    }

    /// True when no fences are registered.
    pub async fn is_empty(&self) -> bool {
        self.fences.read().await.is_empty()
    }

    /// Feed a location fix through every fence, returning the ids whose
    /// trigger fired (first outside→inside transition only).
    pub async fn on_fix(&self, fix: &Fix) -> Vec<Uuid> {
        let mut entered = Vec::new();
        let mut fences = self.fences.write().await;
        for fence in fences.values_mut() {
            let inside = fence.contains(fix);
            if inside && !fence.inside && !fence.fired {
                fence.fired = true;
                entered.push(fence.note_id);
            }
            fence.inside = inside;
        }
        entered
    }
}

/// Spawn the transition watcher: consumes location fixes, raises
/// [`DiaryEvent::GeofenceEntered`] on the bus, and posts a local
/// notification per entered fence.
///
/// Notifications are suppressed entirely when notification permission is
/// absent; the bus event still fires for observability.
pub fn spawn_geofence_watcher(
    registrar: Arc<GeofenceRegistrar>,
    mut fixes: watch::Receiver<Option<Fix>>,
    notifier: Arc<dyn Notifier>,
    permissions: Permissions,
    bus: Arc<EventBus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while fixes.changed().await.is_ok() {
            let fix = *fixes.borrow_and_update();
            let Some(fix) = fix else { continue };

            for note_id in registrar.on_fix(&fix).await {
                bus.emit(DiaryEvent::GeofenceEntered { note_id });

                if !permissions.notifications {
                    debug!(
                        subsystem = "geo",
                        component = "geofence",
                        note_id = %note_id,
                        "Notification permission absent, alert suppressed"
                    );
                    continue;
                }
                let notification = Notification {
                    channel_id: PROXIMITY_CHANNEL_ID.to_string(),
                    title: "Nearby note!".to_string(),
                    // The id, not the title: resolving the note here would
                    // need a store read the receiver path never had.
                    body: format!("You are near note {}", note_id),
                };
                if let Err(e) = notifier.post(notification).await {
                    warn!(
                        subsystem = "geo",
                        component = "geofence",
                        note_id = %note_id,
                        error = %e,
                        "Failed to post proximity notification"
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{proximity_channel, LocalNotifier};
    use fieldnote_core::NewNote;

    fn note_at(lat: f64, lon: f64) -> Note {
        NewNote::new("here", "")
            .with_coordinates(lat, lon)
            .into_note(Uuid::now_v7())
    }

    #[test]
    fn test_haversine_known_distance() {
        // Kaliningrad center to Svetlogorsk is roughly 32 km.
        let d = haversine_m(54.7104, 20.4522, 54.9439, 20.1517);
        assert!((25_000.0..40_000.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert!(haversine_m(54.70, 20.50, 54.70, 20.50) < 1e-6);
    }

    #[tokio::test]
    async fn test_add_requires_coordinates() {
        let registrar = GeofenceRegistrar::new(Permissions::all());
        let note = NewNote::new("no location", "").into_note(Uuid::now_v7());
        registrar.add_for_note(&note).await;
        assert!(registrar.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_requires_background_permission() {
        let registrar = GeofenceRegistrar::new(Permissions {
            background_location: false,
            ..Permissions::all()
        });
        registrar.add_for_note(&note_at(54.70, 20.50)).await;
        assert!(registrar.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_and_remove_keyed_by_note_id() {
        let registrar = GeofenceRegistrar::new(Permissions::all());
        let note = note_at(54.70, 20.50);

        registrar.add_for_note(&note).await;
        assert!(registrar.contains(note.id).await);
        assert_eq!(registrar.len().await, 1);

        registrar.remove(note.id).await;
        assert!(!registrar.contains(note.id).await);
    }

    #[tokio::test]
    async fn test_enter_fires_once() {
        let registrar = GeofenceRegistrar::new(Permissions::all());
        let note = note_at(54.70, 20.50);
        registrar.add_for_note(&note).await;

        let inside = Fix::now(54.701, 20.501);
        let outside = Fix::now(55.50, 21.50);

        assert_eq!(registrar.on_fix(&inside).await, vec![note.id]);
        // Still inside: no second trigger.
        assert!(registrar.on_fix(&inside).await.is_empty());
        // Leave and re-enter: fired-once means still nothing.
        assert!(registrar.on_fix(&outside).await.is_empty());
        assert!(registrar.on_fix(&inside).await.is_empty());
    }

    #[tokio::test]
    async fn test_reregistration_rearms_trigger() {
        let registrar = GeofenceRegistrar::new(Permissions::all());
        let note = note_at(54.70, 20.50);
        registrar.add_for_note(&note).await;

        let inside = Fix::now(54.70, 20.50);
        assert_eq!(registrar.on_fix(&inside).await.len(), 1);

        registrar.add_for_note(&note).await;
        assert_eq!(registrar.on_fix(&inside).await, vec![note.id]);
    }

    #[tokio::test]
    async fn test_watcher_posts_notification_with_note_id() {
        let registrar = Arc::new(GeofenceRegistrar::new(Permissions::all()));
        let note = note_at(54.70, 20.50);
        registrar.add_for_note(&note).await;

        let notifier = Arc::new(LocalNotifier::new(proximity_channel()));
        let mut posted = notifier.subscribe();
        let (fix_tx, fix_rx) = watch::channel(None);
        let bus = Arc::new(EventBus::new(32));
        let mut events = bus.subscribe();

        let watcher = spawn_geofence_watcher(
            registrar.clone(),
            fix_rx,
            notifier.clone(),
            Permissions::all(),
            bus.clone(),
        );

        fix_tx.send(Some(Fix::now(54.70, 20.50))).unwrap();

        let notification = posted.recv().await.unwrap();
        assert_eq!(notification.channel_id, PROXIMITY_CHANNEL_ID);
        assert_eq!(notification.body, format!("You are near note {}", note.id));

        let event = events.recv().await.unwrap();
        assert!(matches!(event, DiaryEvent::GeofenceEntered { note_id } if note_id == note.id));

        watcher.abort();
    }

    #[tokio::test]
    async fn test_watcher_suppresses_without_notification_permission() {
        let registrar = Arc::new(GeofenceRegistrar::new(Permissions::all()));
        let note = note_at(54.70, 20.50);
        registrar.add_for_note(&note).await;

        let notifier = Arc::new(LocalNotifier::new(proximity_channel()));
        let mut posted = notifier.subscribe();
        let (fix_tx, fix_rx) = watch::channel(None);
        let bus = Arc::new(EventBus::new(32));
        let mut events = bus.subscribe();

        let watcher = spawn_geofence_watcher(
            registrar.clone(),
            fix_rx,
            notifier.clone(),
            Permissions {
                notifications: false,
                ..Permissions::all()
            },
            bus.clone(),
        );

        fix_tx.send(Some(Fix::now(54.70, 20.50))).unwrap();

        // The bus event still fires; the notification does not.
        events.recv().await.unwrap();
        assert!(matches!(
            posted.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));

        watcher.abort();
    }
}
