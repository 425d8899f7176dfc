//! Wire-format request/response DTOs for the HTTP surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDto {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub elev: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WhenDto {
    Utc { utc: String },
    Local { local_datetime: String, place: PlaceDto, #[serde(default)] parity_profile: Option<String> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AyanamshaDto {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameDto {
    #[serde(rename = "type")]
    pub frame_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionsRequest {
    pub when: WhenDto,
    pub system: String,
    #[serde(default)]
    pub ayanamsha: Option<AyanamshaDto>,
    #[serde(default)]
    pub frame: Option<FrameDto>,
    #[serde(default)]
    pub epoch: Option<String>,
    pub bodies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPositionDto {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lon_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lat_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ra_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dec_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub distance_au: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceDto {
    pub system: String,
    pub frame: String,
    pub epoch: String,
    pub ephemeris: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ayanamsha: Option<String>,
    pub bundle_checksums: Vec<String>,
    pub observer_frame_used: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time_resolution: Option<TimeResolutionDto>,
}

/// Cached in the two-level position cache, so it must round-trip through
/// JSON: `Serialize` for the HTTP response, `Deserialize` for the L2 read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsResponse {
    pub utc: String,
    pub bodies: Vec<BodyPositionDto>,
    pub provenance: ProvenanceDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeResolveRequest {
    pub when: WhenDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeResolutionProvenanceDto {
    pub profile: String,
    pub sources: Vec<String>,
    pub patches_applied: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeResolutionDto {
    pub utc: String,
    pub zone_id: String,
    pub offset_seconds: i32,
    pub dst_active: bool,
    pub confidence: String,
    pub reason: String,
    pub provenance: TimeResolutionProvenanceDto,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeocodeResultDto {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeocodeSearchResponse {
    pub results: Vec<GeocodeResultDto>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub uptime_secs: u64,
    pub worker_pool: serde_json::Value,
    pub cache: serde_json::Value,
    pub rate_limiter: serde_json::Value,
    pub kernel_bundle_checksums: Vec<String>,
}
