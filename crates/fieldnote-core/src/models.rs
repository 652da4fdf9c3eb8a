//! Data models for fieldnote entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A diary note with optional media attachments and location.
///
/// Address and coordinates are deliberately independent: the address may be
/// a user-facing placeholder while coordinates are absent, and vice versa.
/// [`Note::has_location`] keys off the coordinate pair only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Note identifier (UUIDv7, assigned by the store on first persist).
    pub id: Uuid,
    /// Note title.
    pub title: String,
    /// Free-text body.
    pub content: String,
    /// Durable download URL of the attached photo, if any.
    pub image_url: Option<String>,
    /// Durable download URL of the attached recording, if any.
    pub audio_url: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
    /// Best-effort human-readable address.
    pub address: Option<String>,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// True iff both latitude and longitude are set.
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Coordinate pair, when the note has a location.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Request for creating a new note. The store assigns the id and timestamp.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

impl NewNote {
    /// Create a request with just title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the coordinate pair.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Set the resolved address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Materialize into a [`Note`] with the given id, stamped now.
    pub fn into_note(self, id: Uuid) -> Note {
        Note {
            id,
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            audio_url: self.audio_url,
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
            created_at: Utc::now(),
        }
    }
}
