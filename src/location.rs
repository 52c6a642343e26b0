use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{DetectorError, Result};
use crate::traits::Geocoder;

/// Stand-in for a real device position: every lookup geocodes this address.
pub const PLACEHOLDER_ADDRESS: &str = "New York, NY, USA";
pub const LOCATION_UNAVAILABLE: &str = "Location unavailable";
pub const UNKNOWN_LOCATION: &str = "Unknown location";

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "accident_detector";

/// Resolves the placeholder address. Never fails; errors turn into
/// `LOCATION_UNAVAILABLE`.
pub fn locate<G: Geocoder + ?Sized>(geocoder: &G) -> String {
    match geocoder.geocode(PLACEHOLDER_ADDRESS) {
        Ok(Some(address)) => address,
        Ok(None) => UNKNOWN_LOCATION.to_string(),
        Err(e) => {
            warn!(error = %e, "location lookup failed");
            LOCATION_UNAVAILABLE.to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
}

/// Forward geocoding through the public Nominatim search API.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(NOMINATIM_SEARCH_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<String>> {
        debug!(address, endpoint = %self.endpoint, "geocoding");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectorError::Geocoding {
                reason: format!("HTTP {} from {}", status, self.endpoint),
            });
        }

        let places: Vec<Place> = response.json()?;
        Ok(places.into_iter().next().map(|place| place.display_name))
    }
}
