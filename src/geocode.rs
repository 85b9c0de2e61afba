//! Reverse geocoding of visit coordinates
//!
//! `ReverseGeocoder` is the seam between aggregation and the network.
//! Lookups are neither cached nor retried; wrapping the trait is the place
//! to add either.

use std::time::Duration;

use serde::Deserialize;

use crate::config::GeocoderConfig;
use crate::error::GeocodeError;
use crate::models::Region;

/// Address key fragment identifying an ISO 3166 subdivision code
const SUBDIVISION_KEY: &str = "ISO3166";

/// Resolves a coordinate to its administrative region
pub trait ReverseGeocoder {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Region, GeocodeError>;
}

impl<G: ReverseGeocoder + ?Sized> ReverseGeocoder for &G {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Region, GeocodeError> {
        (**self).reverse(lat, lng)
    }
}

/// Response body of the Nominatim reverse endpoint
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a Nominatim-compatible reverse geocoding service
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    timeout: Option<Duration>,
    client: reqwest::blocking::Client,
}

impl NominatimGeocoder {
    /// Create a client for `base_url` (e.g. "https://nominatim.openstreetmap.org")
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: user_agent.into(),
            timeout: None,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn from_config(config: &GeocoderConfig) -> Self {
        Self::new(config.url.clone(), config.user_agent.clone())
    }

    /// Set a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Region, GeocodeError> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
            ]);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().map_err(|e| GeocodeError::Request {
            lat,
            lng,
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status {
                lat,
                lng,
                status: response.status().as_u16(),
            });
        }

        let body: ReverseResponse =
            response
                .json()
                .map_err(|e| GeocodeError::UnparseableAddress {
                    lat,
                    lng,
                    reason: e.to_string(),
                })?;
        if let Some(error) = body.error {
            return Err(GeocodeError::UnparseableAddress {
                lat,
                lng,
                reason: error,
            });
        }
        let address = body.address.ok_or_else(|| GeocodeError::UnparseableAddress {
            lat,
            lng,
            reason: "response has no address".to_string(),
        })?;

        let region = region_from_address(&address)
            .map_err(|reason| GeocodeError::UnparseableAddress { lat, lng, reason })?;
        tracing::debug!(
            "Reverse geocoded ({}, {}) to {}-{}",
            lat,
            lng,
            region.country,
            region.state
        );
        Ok(region)
    }
}

/// Extract state and country codes from an address object
///
/// The state comes from the first address key, in response order, that
/// contains `ISO3166`. Nominatim lists the most specific level first, so
/// `lvl6` wins over `lvl4` when both are present. Only the segment after the
/// country prefix is kept (`BE-VLG-X` gives `VLG`).
pub fn region_from_address(
    address: &serde_json::Map<String, serde_json::Value>,
) -> Result<Region, String> {
    let (key, value) = address
        .iter()
        .find(|(k, _)| k.contains(SUBDIVISION_KEY))
        .ok_or_else(|| format!("no {SUBDIVISION_KEY} field in address"))?;

    let code = value
        .as_str()
        .ok_or_else(|| format!("{key} is not a string"))?;
    let state = code
        .split('-')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("{key} value '{code}' has no subdivision part"))?;

    let country = address
        .get("country_code")
        .and_then(|v| v.as_str())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| "no country_code field in address".to_string())?;

    Ok(Region {
        state: state.to_string(),
        country: country.to_uppercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(json: &str) -> serde_json::Map<String, serde_json::Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_region_from_brussels_address() {
        let addr = address(
            r#"{"road": "Rue Royale", "city": "Brussels", "ISO3166-2-lvl4": "BE-BRU",
                "country": "Belgium", "country_code": "be"}"#,
        );
        let region = region_from_address(&addr).unwrap();
        assert_eq!(region.state, "BRU");
        assert_eq!(region.country, "BE");
    }

    #[test]
    fn test_region_takes_first_code_in_response_order() {
        let addr = address(
            r#"{"ISO3166-2-lvl6": "BE-VLG-X", "ISO3166-2-lvl4": "BE-VLG", "country_code": "be"}"#,
        );
        assert_eq!(region_from_address(&addr).unwrap().state, "VLG");

        let addr = address(
            r#"{"ISO3166-2-lvl4": "FR-IDF", "ISO3166-2-lvl15": "FR-X", "country_code": "fr"}"#,
        );
        assert_eq!(region_from_address(&addr).unwrap().state, "IDF");
    }

    #[test]
    fn test_region_keeps_only_second_segment() {
        let addr = address(r#"{"ISO3166-2-lvl6": "BE-VLG-X", "country_code": "be"}"#);
        let region = region_from_address(&addr).unwrap();
        assert_eq!(region.state, "VLG");
        assert_eq!(region.country, "BE");

        let addr = address(r#"{"ISO3166-2-lvl4": "US-CA", "country_code": "us"}"#);
        assert_eq!(region_from_address(&addr).unwrap().state, "CA");
    }

    #[test]
    fn test_region_missing_fields() {
        let no_code = address(r#"{"country_code": "be"}"#);
        assert!(region_from_address(&no_code).is_err());

        let no_country = address(r#"{"ISO3166-2-lvl4": "BE-BRU"}"#);
        assert!(region_from_address(&no_country).is_err());

        let no_subdivision = address(r#"{"ISO3166-2-lvl4": "BE", "country_code": "be"}"#);
        assert!(region_from_address(&no_subdivision).is_err());
    }

    #[test]
    fn test_unreachable_service_is_request_error() {
        let geocoder = NominatimGeocoder::new("http://127.0.0.1:9", "obs2ebird-test")
            .with_timeout(Duration::from_secs(2));
        let result = geocoder.reverse(50.8466, 4.3528);
        assert!(matches!(result, Err(GeocodeError::Request { .. })));
    }
}
