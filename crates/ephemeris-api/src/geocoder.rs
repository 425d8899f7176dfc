//! Thin client for the external geocoding backend.
//!
//! `GET /v1/geocode/search` is the only endpoint that touches a collaborator
//! outside this service; resolving a place name to coordinates is
//! explicitly out of scope for the Time Resolver itself (it consumes
//! coordinates, never produces them from free text).

use serde::Deserialize;

use crate::types::GeocodeResultDto;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum GeocoderError {
    Unconfigured,
    Request(String),
    UpstreamStatus(u16),
}

impl std::fmt::Display for GeocoderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "no geocoder_url configured"),
            Self::Request(msg) => write!(f, "geocoder request failed: {msg}"),
            Self::UpstreamStatus(code) => write!(f, "geocoder returned status {code}"),
        }
    }
}

impl std::error::Error for GeocoderError {}

#[derive(Debug, Deserialize)]
struct UpstreamResult {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: Option<String>,
}

pub struct Geocoder {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl Geocoder {
    pub fn new(base_url: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<GeocodeResultDto>, GeocoderError> {
        let base_url = self.base_url.as_ref().ok_or(GeocoderError::Unconfigured)?;
        let response = self
            .client
            .get(base_url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| GeocoderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocoderError::UpstreamStatus(response.status().as_u16()));
        }

        let results: Vec<UpstreamResult> =
            response.json().await.map_err(|e| GeocoderError::Request(e.to_string()))?;

        Ok(results
            .into_iter()
            .map(|r| GeocodeResultDto { name: r.name, lat: r.lat, lon: r.lon, country: r.country })
            .collect())
    }
}
