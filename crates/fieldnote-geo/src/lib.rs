//! # fieldnote-geo
//!
//! Location access, reverse geocoding, and geofencing for fieldnote.
//!
//! - [`LocationResolver`] answers "where are we and what is that place
//!   called", degrading gracefully when permission or the geocoder is
//!   unavailable.
//! - [`GeofenceRegistrar`] keeps one circular proximity trigger per note
//!   and turns outside→inside transitions into local notifications.

pub mod geocode;
pub mod geofence;
pub mod location;
pub mod notify;

pub use geocode::{Geocoder, HttpGeocoder, ResolvedAddress, StaticGeocoder};
pub use geofence::{haversine_m, spawn_geofence_watcher, Geofence, GeofenceRegistrar};
pub use location::{CachedLocationProvider, Fix, LocationProvider, LocationResolver};
pub use notify::{
    proximity_channel, Importance, LocalNotifier, Notification, NotificationChannel, Notifier,
    PROXIMITY_CHANNEL_ID,
};
