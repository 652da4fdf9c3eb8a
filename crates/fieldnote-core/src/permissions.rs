//! Runtime permission grants for device-adjacent capabilities.
//!
//! Fieldnote runs headless, so grants arrive through configuration rather
//! than an interactive prompt. Components treat these as preconditions:
//! a missing grant degrades the operation (no-op or user-visible message),
//! it never panics.

use serde::{Deserialize, Serialize};

/// The set of capability grants the process was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Foreground (fine/coarse) location access.
    pub location: bool,
    /// Background location access, required for geofencing.
    pub background_location: bool,
    /// Microphone capture.
    pub microphone: bool,
    /// Posting local notifications.
    pub notifications: bool,
}

impl Permissions {
    /// Everything granted. The default for local development.
    pub fn all() -> Self {
        Self {
            location: true,
            background_location: true,
            microphone: true,
            notifications: true,
        }
    }

    /// Nothing granted.
    pub fn none() -> Self {
        Self {
            location: false,
            background_location: false,
            microphone: false,
            notifications: false,
        }
    }

    /// True iff foreground location is granted.
    pub fn has_location(&self) -> bool {
        self.location
    }

    /// True iff both foreground and background location are granted.
    /// Geofence registration requires both.
    pub fn has_background_location(&self) -> bool {
        self.location && self.background_location
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_location_requires_foreground() {
        let perms = Permissions {
            location: false,
            background_location: true,
            ..Permissions::none()
        };
        assert!(!perms.has_background_location());
    }

    #[test]
    fn test_all_and_none() {
        assert!(Permissions::all().has_background_location());
        assert!(!Permissions::none().has_location());
    }
}
