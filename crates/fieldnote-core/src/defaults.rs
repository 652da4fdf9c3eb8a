//! Centralized default constants for the fieldnote system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining their
//! own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// GEOFENCING
// =============================================================================

/// Circular geofence radius around a note's location, in meters.
pub const GEOFENCE_RADIUS_M: f64 = 1000.0;

/// Mean Earth radius used for haversine distance, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// =============================================================================
// AUDIO
// =============================================================================

/// Number of amplitude samples retained for live waveform display.
pub const AMPLITUDE_WINDOW: usize = 30;

/// Amplitude sampling cadence during recording, in milliseconds.
pub const AMPLITUDE_INTERVAL_MS: u64 = 50;

/// Playback progress publication cadence, in milliseconds.
pub const PROGRESS_INTERVAL_MS: u64 = 100;

/// Elapsed-recording-time publication cadence, in milliseconds.
pub const RECORDING_TICK_MS: u64 = 1000;

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast buffer capacity for the shared event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// GEOCODING
// =============================================================================

/// Placeholder address returned when reverse geocoding fails or resolves to
/// nothing. Best-effort by design: an address is never required for a note
/// to be valid.
pub const FALLBACK_ADDRESS: &str = "Unknown location";

/// Default Nominatim-style reverse geocoding endpoint.
pub const GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

// =============================================================================
// PIN
// =============================================================================

/// Minimum accepted PIN length in digits.
pub const PIN_MIN_LEN: usize = 4;
