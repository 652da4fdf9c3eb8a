//! Reverse geocoding against a Nominatim-style HTTP endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use fieldnote_core::{Error, Result};

/// Address parts a reverse lookup can resolve. All parts are optional;
/// [`ResolvedAddress::format`] joins whatever is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAddress {
    /// Street name.
    pub road: Option<String>,
    /// House number.
    pub house_number: Option<String>,
    /// City, town, or village.
    pub locality: Option<String>,
}

impl ResolvedAddress {
    /// Join the present parts with ", ", skipping missing ones.
    /// Returns `None` when every part is missing.
    pub fn format(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.road.as_deref(),
            self.house_number.as_deref(),
            self.locality.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Reverse geocoder seam.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve coordinates to address parts. `Ok(None)` when the service
    /// has no result for the location; `Err` for transport/parse failures.
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<ResolvedAddress>>;
}

// Nominatim `reverse` response, reduced to the fields we compose.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

impl ReverseAddress {
    fn into_resolved(self) -> ResolvedAddress {
        ResolvedAddress {
            road: self.road,
            house_number: self.house_number,
            locality: self.city.or(self.town).or(self.village),
        }
    }
}

/// Reverse geocoder backed by a Nominatim-style JSON API.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGeocoder {
    /// Create a geocoder for the given endpoint base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<ResolvedAddress>> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}",
            self.base_url, latitude, longitude
        );
        debug!(
            subsystem = "geo",
            component = "geocoder",
            op = "reverse_geocode",
            url = %url,
            "Reverse geocoding"
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "fieldnote")
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Geocode(e.to_string()))?;

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| Error::Geocode(e.to_string()))?;
        Ok(body.address.map(ReverseAddress::into_resolved))
    }
}

/// Geocoder returning a fixed answer. Useful offline and in tests.
pub struct StaticGeocoder {
    answer: Option<ResolvedAddress>,
}

impl StaticGeocoder {
    /// Always resolves to the given address.
    pub fn new(answer: ResolvedAddress) -> Self {
        Self {
            answer: Some(answer),
        }
    }

    /// Never resolves anything.
    pub fn empty() -> Self {
        Self { answer: None }
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn reverse(&self, _latitude: f64, _longitude: f64) -> Result<Option<ResolvedAddress>> {
        Ok(self.answer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_all_parts() {
        let addr = ResolvedAddress {
            road: Some("Lenina prospekt".into()),
            house_number: Some("12".into()),
            locality: Some("Kaliningrad".into()),
        };
        assert_eq!(
            addr.format().unwrap(),
            "Lenina prospekt, 12, Kaliningrad"
        );
    }

    #[test]
    fn test_format_skips_missing_parts() {
        let addr = ResolvedAddress {
            road: Some("Lenina prospekt".into()),
            house_number: None,
            locality: Some("Kaliningrad".into()),
        };
        assert_eq!(addr.format().unwrap(), "Lenina prospekt, Kaliningrad");

        let only_city = ResolvedAddress {
            locality: Some("Kaliningrad".into()),
            ..Default::default()
        };
        assert_eq!(only_city.format().unwrap(), "Kaliningrad");
    }

    #[test]
    fn test_format_empty_is_none() {
        assert_eq!(ResolvedAddress::default().format(), None);
        let blank = ResolvedAddress {
            road: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.format(), None);
    }

    #[test]
    fn test_reverse_response_parsing() {
        let json = r#"{
            "address": {
                "road": "Kant street",
                "house_number": "4",
                "town": "Svetlogorsk",
                "postcode": "238560"
            }
        }"#;
        let parsed: ReverseResponse = serde_json::from_str(json).unwrap();
        let resolved = parsed.address.unwrap().into_resolved();
        assert_eq!(resolved.format().unwrap(), "Kant street, 4, Svetlogorsk");
    }

    #[test]
    fn test_reverse_response_city_preferred_over_village() {
        let json = r#"{"address": {"city": "Kaliningrad", "village": "X"}}"#;
        let parsed: ReverseResponse = serde_json::from_str(json).unwrap();
        let resolved = parsed.address.unwrap().into_resolved();
        assert_eq!(resolved.locality.as_deref(), Some("Kaliningrad"));
    }

    #[test]
    fn test_reverse_response_without_address() {
        let parsed: ReverseResponse = serde_json::from_str(r#"{"error": "no result"}"#).unwrap();
        assert!(parsed.address.is_none());
    }

    #[tokio::test]
    async fn test_static_geocoder() {
        let geocoder = StaticGeocoder::new(ResolvedAddress {
            locality: Some("Zelenogradsk".into()),
            ..Default::default()
        });
        let resolved = geocoder.reverse(54.96, 20.48).await.unwrap().unwrap();
        assert_eq!(resolved.format().unwrap(), "Zelenogradsk");

        assert!(StaticGeocoder::empty()
            .reverse(0.0, 0.0)
            .await
            .unwrap()
            .is_none());
    }
}
