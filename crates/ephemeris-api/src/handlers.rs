//! The four HTTP handlers making up the API surface.

use axum::extract::{Query as QueryExtract, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use ephemeris_cache::Fingerprint;
use ephemeris_worker::WorkerError;

use crate::epoch::resolve_when;
use crate::error::{ApiError, ApiErrorCode, WireError};
use crate::state::AppState;
use crate::types::{
    BodyPositionDto, GeocodeSearchResponse, HealthResponse, PlaceDto, PositionsRequest, PositionsResponse,
    ProvenanceDto, TimeResolutionDto, TimeResolutionProvenanceDto, TimeResolveRequest, WhenDto,
};
use crate::worker_job::{parse_body, JobObserver, JobRequest, JobResponse, JobSystem};

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("unknown")
        .to_string()
}

async fn enforce_rate_limit(state: &AppState, path: &str, headers: &HeaderMap) -> Result<(), ApiError> {
    if !state.config.rate_limit.enabled {
        return Ok(());
    }
    let ip = client_ip(headers);
    let decision = state.rate_limiter.check(path, &ip, None).await;
    if decision.allowed {
        Ok(())
    } else {
        Err(ApiError::new(ApiErrorCode::RateLimited, "rate limit exceeded").with_retry_after(decision.retry_after.as_secs().max(1)))
    }
}

fn worker_error_to_api(err: WorkerError) -> ApiError {
    match err {
        WorkerError::Overloaded | WorkerError::ShuttingDown => {
            ApiError::new(ApiErrorCode::ServiceOverloaded, "worker pool is at capacity").with_retry_after(1)
        }
        WorkerError::Timeout => ApiError::new(ApiErrorCode::ComputeEphemerisError, "compute job timed out"),
        WorkerError::SpawnFailed(msg) => ApiError::new(ApiErrorCode::KernelsNotAvailable, msg),
        WorkerError::JobFailed(msg) => match serde_json::from_str::<WireError>(&msg) {
            Ok(wire) => ApiError::from_wire(&wire),
            Err(_) => ApiError::new(ApiErrorCode::ComputeEphemerisError, msg),
        },
        other => ApiError::new(ApiErrorCode::ComputeEphemerisError, other.to_string()),
    }
}

fn validate_positions_request(req: &PositionsRequest) -> Result<(), ApiError> {
    if req.bodies.is_empty() {
        return Err(ApiError::new(ApiErrorCode::InputMissingRequired, "bodies must not be empty"));
    }
    for name in &req.bodies {
        if parse_body(name).is_none() {
            return Err(ApiError::new(ApiErrorCode::BodiesUnsupported, format!("unsupported body '{name}'")));
        }
    }
    match req.system.as_str() {
        "tropical" | "sidereal" => {}
        other => return Err(ApiError::new(ApiErrorCode::InputInvalidFormat, format!("unknown system '{other}'"))),
    }
    if req.system == "sidereal" && req.ayanamsha.is_none() {
        return Err(ApiError::new(ApiErrorCode::AyanamshaRequired, "sidereal system requires an ayanamsha id"));
    }
    if req.system == "tropical" && req.ayanamsha.is_some() {
        return Err(ApiError::new(ApiErrorCode::SystemIncompatible, "tropical system does not take an ayanamsha"));
    }
    if let Some(frame) = &req.frame
        && !matches!(frame.frame_type.as_str(), "ecliptic_of_date" | "equatorial")
    {
        return Err(ApiError::new(ApiErrorCode::InputInvalidFormat, format!("unknown frame type '{}'", frame.frame_type)));
    }
    if req.system == "sidereal" && req.frame.as_ref().is_some_and(|f| f.frame_type == "equatorial") {
        return Err(ApiError::new(ApiErrorCode::SystemIncompatible, "sidereal system is not supported with the equatorial frame"));
    }
    // Only (ecliptic_of_date, of_date) and (equatorial, J2000) are legal pairs.
    if let Some(epoch_of) = req.epoch.as_deref() {
        let frame_type = req.frame.as_ref().map_or("ecliptic_of_date", |f| f.frame_type.as_str());
        let legal = match frame_type {
            "equatorial" => epoch_of == "J2000",
            _ => epoch_of == "of_date",
        };
        if !matches!(epoch_of, "of_date" | "J2000") {
            return Err(ApiError::new(ApiErrorCode::InputInvalidFormat, format!("unknown epoch '{epoch_of}'")));
        }
        if !legal {
            return Err(ApiError::new(
                ApiErrorCode::InputInvalid,
                format!("frame '{frame_type}' cannot be combined with epoch '{epoch_of}'"),
            ));
        }
    }
    Ok(())
}

fn validate_place(place: &PlaceDto) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&place.lat) {
        return Err(ApiError::new(ApiErrorCode::InputInvalid, format!("latitude {} outside [-90, 90]", place.lat)));
    }
    if place.lon <= -180.0 || place.lon > 180.0 {
        return Err(ApiError::new(ApiErrorCode::InputInvalid, format!("longitude {} outside (-180, 180]", place.lon)));
    }
    Ok(())
}

/// `POST /v1/positions`
pub async fn positions(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    match positions_inner(state, headers, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn positions_inner(state: AppState, headers: HeaderMap, body: Value) -> Result<Response, ApiError> {
    enforce_rate_limit(&state, "/v1/positions", &headers).await?;

    let req: PositionsRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::new(ApiErrorCode::InputInvalidFormat, format!("malformed request body: {e}")))?;
    validate_positions_request(&req)?;

    let place = match &req.when {
        WhenDto::Local { place, .. } => {
            validate_place(place)?;
            Some(place.clone())
        }
        WhenDto::Utc { .. } => None,
    };

    let (utc, epoch_tdb_jd, time_resolution) =
        resolve_when(&req.when, &state.config.time_resolver.default_parity_profile, &state.lsk, &state.patches)?;

    let frame_type = req.frame.as_ref().map(|f| f.frame_type.clone()).unwrap_or_else(|| "ecliptic_of_date".to_string());
    let epoch_of = req.epoch.clone().unwrap_or_else(|| if frame_type == "equatorial" { "J2000".to_string() } else { "of_date".to_string() });
    let ayanamsha_id = req.ayanamsha.as_ref().map(|a| a.id.clone());

    let fingerprint = match &place {
        Some(p) => Fingerprint {
            epoch_unix_s: utc.timestamp(),
            bodies: req.bodies.clone(),
            system: req.system.clone(),
            ayanamsha_id: ayanamsha_id.clone(),
            frame_type: frame_type.clone(),
            epoch_of: epoch_of.clone(),
            observer_kind: "topocentric".to_string(),
            observer_lat_e6: Fingerprint::round_micro(p.lat),
            observer_lon_e6: Fingerprint::round_micro(p.lon),
            observer_elev_e6: Fingerprint::round_micro(p.elev.unwrap_or(0.0)),
            bundle_id: state.config.kernel.bundle_id.clone(),
            ephemeris_policy: "auto".to_string(),
        },
        None => Fingerprint {
            epoch_unix_s: utc.timestamp(),
            bodies: req.bodies.clone(),
            system: req.system.clone(),
            ayanamsha_id: ayanamsha_id.clone(),
            frame_type: frame_type.clone(),
            epoch_of: epoch_of.clone(),
            observer_kind: "geocentric".to_string(),
            observer_lat_e6: 0,
            observer_lon_e6: 0,
            observer_elev_e6: 0,
            bundle_id: state.config.kernel.bundle_id.clone(),
            ephemeris_policy: "auto".to_string(),
        },
    };
    let etag = fingerprint.etag();

    if let Some(if_none_match) = headers.get(axum::http::header::IF_NONE_MATCH).and_then(|v| v.to_str().ok())
        && ephemeris_cache::Cache::<PositionsResponse>::if_none_match(&fingerprint, if_none_match)
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let job = JobRequest {
        bodies: req.bodies.clone(),
        observer: match &place {
            Some(p) => JobObserver {
                kind: "topocentric".to_string(),
                body: None,
                lat_deg: Some(p.lat),
                lon_deg: Some(p.lon),
                elevation_m: p.elev,
            },
            None => JobObserver {
                kind: "body".to_string(),
                body: Some("Earth".to_string()),
                lat_deg: None,
                lon_deg: None,
                elevation_m: None,
            },
        },
        frame: match frame_type.as_str() {
            "equatorial" => "equatorial_j2000".to_string(),
            _ => "ecliptic_of_date".to_string(),
        },
        system: JobSystem {
            kind: req.system.clone(),
            ayanamsha_id: ayanamsha_id.clone(),
        },
        epoch_tdb_jd,
    };

    let state_for_compute = state.clone();
    let time_resolution_for_compute = time_resolution.clone();
    let utc_rfc3339 = utc.to_rfc3339();
    let system = req.system.clone();
    let frame_label = frame_type.clone();
    let epoch_label = epoch_of.clone();

    let outcome = state
        .cache
        .get_or_compute(&fingerprint, move || async move {
            let payload = serde_json::to_value(&job).map_err(|e| e.to_string())?;
            let result = state_for_compute
                .pool
                .submit(payload)
                .await
                .map_err(|e| serde_json::to_string(&worker_error_to_api(e).to_wire()).unwrap_or_else(|_| "worker error".to_string()))?;
            let job_response: JobResponse = serde_json::from_value(result).map_err(|e| e.to_string())?;

            let bodies: Vec<BodyPositionDto> = job_response
                .results
                .iter()
                .map(|r| BodyPositionDto {
                    name: r.name.clone(),
                    lon_deg: r.lon_deg,
                    lat_deg: r.lat_deg,
                    ra_hours: r.ra_hours,
                    dec_deg: r.dec_deg,
                    distance_au: r.distance_au,
                })
                .collect();
            let observer_frame_used = job_response
                .results
                .first()
                .map(|r| r.observer_frame_used.clone())
                .unwrap_or_else(|| "not_applicable".to_string());

            Ok(PositionsResponse {
                utc: utc_rfc3339.clone(),
                bodies,
                provenance: ProvenanceDto {
                    system: system.clone(),
                    frame: frame_label.clone(),
                    epoch: epoch_label.clone(),
                    ephemeris: job_response.bundle_id.clone(),
                    ayanamsha: ayanamsha_id.clone(),
                    bundle_checksums: state_for_compute.kernel_bundle_checksums.as_ref().clone(),
                    observer_frame_used,
                    time_resolution: time_resolution_for_compute.clone(),
                },
            })
        })
        .await
        .map_err(|e| match e {
            ephemeris_cache::CacheError::ComputeFailed(msg) => match serde_json::from_str::<WireError>(&msg) {
                Ok(wire) => ApiError::from_wire(&wire),
                Err(_) => ApiError::new(ApiErrorCode::ComputeEphemerisError, msg),
            },
            other => ApiError::new(ApiErrorCode::ComputeEphemerisError, other.to_string()),
        })?;

    let mut response = Json(&outcome.value).into_response();
    if let Ok(value) = axum::http::HeaderValue::from_str(&format!("\"{etag}\"")) {
        response.headers_mut().insert(axum::http::header::ETAG, value);
    }
    Ok(response)
}

/// `POST /v1/time/resolve`
pub async fn time_resolve(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    match time_resolve_inner(state, headers, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn time_resolve_inner(state: AppState, headers: HeaderMap, body: Value) -> Result<Response, ApiError> {
    enforce_rate_limit(&state, "/v1/time/resolve", &headers).await?;
    let req: TimeResolveRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::new(ApiErrorCode::InputInvalidFormat, format!("malformed request body: {e}")))?;
    if let WhenDto::Local { place, .. } = &req.when {
        validate_place(place)?;
    }
    let (utc, _, dto) = resolve_when(&req.when, &state.config.time_resolver.default_parity_profile, &state.lsk, &state.patches)?;
    // An absolute UTC instant passes through: nothing to resolve, full confidence.
    let dto = dto.unwrap_or_else(|| TimeResolutionDto {
        utc: utc.to_rfc3339(),
        zone_id: "UTC".to_string(),
        offset_seconds: 0,
        dst_active: false,
        confidence: "high".to_string(),
        reason: "absolute utc input passed through without civil resolution".to_string(),
        provenance: TimeResolutionProvenanceDto {
            profile: "as_entered".to_string(),
            sources: vec!["user-provided".to_string()],
            patches_applied: Vec::new(),
        },
        warnings: Vec::new(),
    });
    Ok(Json(dto).into_response())
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `GET /v1/geocode/search`
pub async fn geocode_search(State(state): State<AppState>, headers: HeaderMap, QueryExtract(query): QueryExtract<GeocodeQuery>) -> Response {
    match geocode_search_inner(state, headers, query).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn geocode_search_inner(state: AppState, headers: HeaderMap, query: GeocodeQuery) -> Result<Response, ApiError> {
    enforce_rate_limit(&state, "/v1/geocode/search", &headers).await?;
    let mut results = state
        .geocoder
        .search(&query.q)
        .await
        .map_err(|e| ApiError::new(ApiErrorCode::ComputeEphemerisError, e.to_string()))?;
    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    Ok(Json(GeocodeSearchResponse { results }).into_response())
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> Response {
    let pool_health = state.pool.health().await;
    let cache_health = state.cache.health().await;
    let rate_health = state.rate_limiter.health().await;

    let pool_unhealthy = pool_health.idle == 0 && pool_health.busy == 0;
    let status = if pool_unhealthy {
        crate::types::ComponentStatus::Unhealthy
    } else if pool_health.dead > 0 || !cache_health.l2_reachable || rate_health.degraded {
        crate::types::ComponentStatus::Degraded
    } else {
        crate::types::ComponentStatus::Healthy
    };

    let body = HealthResponse {
        status,
        uptime_secs: state.started_at.elapsed().as_secs(),
        worker_pool: serde_json::json!({
            "idle": pool_health.idle,
            "busy": pool_health.busy,
            "dead": pool_health.dead,
            "initializing": pool_health.initializing,
            "draining": pool_health.draining,
            "queue_depth": pool_health.queue_depth,
            "jobs_completed": pool_health.jobs_completed,
            "avg_job_time_ms": pool_health.avg_job_time_ms,
            "replacements_last_minute": pool_health.replacements_last_minute,
        }),
        cache: serde_json::json!({
            "l1_len": cache_health.l1_len,
            "l2_reachable": cache_health.l2_reachable,
        }),
        rate_limiter: serde_json::json!({
            "reachable": rate_health.reachable,
            "failures_last_minute": rate_health.failures_last_minute,
            "degraded": rate_health.degraded,
        }),
        kernel_bundle_checksums: state.kernel_bundle_checksums.as_ref().clone(),
    };

    let http_status = match body.status {
        crate::types::ComponentStatus::Healthy => StatusCode::OK,
        crate::types::ComponentStatus::Degraded => StatusCode::OK,
        crate::types::ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (http_status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AyanamshaDto, FrameDto};

    fn base_request() -> PositionsRequest {
        PositionsRequest {
            when: WhenDto::Utc { utc: "1962-07-03T04:33:00Z".to_string() },
            system: "tropical".to_string(),
            ayanamsha: None,
            frame: None,
            epoch: None,
            bodies: vec!["Sun".to_string()],
        }
    }

    #[test]
    fn sidereal_without_ayanamsha_is_required_error() {
        let mut req = base_request();
        req.system = "sidereal".to_string();
        let err = validate_positions_request(&req).unwrap_err();
        assert_eq!(err.code, "AYANAMSHA.REQUIRED");
    }

    #[test]
    fn tropical_with_ayanamsha_is_incompatible() {
        let mut req = base_request();
        req.ayanamsha = Some(AyanamshaDto { id: "lahiri".to_string() });
        let err = validate_positions_request(&req).unwrap_err();
        assert_eq!(err.code, "SYSTEM.INCOMPATIBLE");
    }

    #[test]
    fn sidereal_with_equatorial_frame_is_incompatible() {
        let mut req = base_request();
        req.system = "sidereal".to_string();
        req.ayanamsha = Some(AyanamshaDto { id: "lahiri".to_string() });
        req.frame = Some(FrameDto { frame_type: "equatorial".to_string() });
        let err = validate_positions_request(&req).unwrap_err();
        assert_eq!(err.code, "SYSTEM.INCOMPATIBLE");
    }

    #[test]
    fn illegal_frame_epoch_pair_is_rejected() {
        let mut req = base_request();
        req.frame = Some(FrameDto { frame_type: "equatorial".to_string() });
        req.epoch = Some("of_date".to_string());
        let err = validate_positions_request(&req).unwrap_err();
        assert_eq!(err.code, "INPUT.INVALID");

        let mut req = base_request();
        req.epoch = Some("J2000".to_string());
        let err = validate_positions_request(&req).unwrap_err();
        assert_eq!(err.code, "INPUT.INVALID");
    }

    #[test]
    fn legal_frame_epoch_pairs_pass() {
        let mut req = base_request();
        req.epoch = Some("of_date".to_string());
        assert!(validate_positions_request(&req).is_ok());

        let mut req = base_request();
        req.frame = Some(FrameDto { frame_type: "equatorial".to_string() });
        req.epoch = Some("J2000".to_string());
        assert!(validate_positions_request(&req).is_ok());
    }

    #[test]
    fn unknown_body_is_unsupported_before_any_compute() {
        let mut req = base_request();
        req.bodies = vec!["Vulcan".to_string()];
        let err = validate_positions_request(&req).unwrap_err();
        assert_eq!(err.code, "BODIES.UNSUPPORTED");
    }

    #[test]
    fn place_bounds_are_enforced() {
        assert!(validate_place(&PlaceDto { lat: 37.8, lon: -85.9, elev: None }).is_ok());
        assert!(validate_place(&PlaceDto { lat: 91.0, lon: 0.0, elev: None }).is_err());
        assert!(validate_place(&PlaceDto { lat: 0.0, lon: -180.0, elev: None }).is_err());
        assert!(validate_place(&PlaceDto { lat: 0.0, lon: 180.0, elev: None }).is_ok());
    }
}
