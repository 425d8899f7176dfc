//! Shared application state handed to every axum handler.

use std::sync::Arc;
use std::time::Instant;

use ephemeris_cache::Cache;
use ephemeris_config::EphemerisConfig;
use ephemeris_ratelimit::RateLimiter;
use ephemeris_time::{HistoricalPatch, LeapSecondKernel};
use ephemeris_worker::WorkerPool;

use crate::types::PositionsResponse;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EphemerisConfig>,
    pub pool: Arc<WorkerPool>,
    pub cache: Arc<Cache<PositionsResponse>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub kernel_bundle_checksums: Arc<Vec<String>>,
    pub started_at: Instant,
    pub geocoder: Arc<crate::geocoder::Geocoder>,
    pub lsk: Arc<LeapSecondKernel>,
    /// Pre-standardization corrections for the `strict_history` profile.
    pub patches: Arc<Vec<HistoricalPatch>>,
}
