//! Route table and middleware stack: trace, compression, request id, CORS.

use std::time::Duration;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if allowed_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}

pub fn build(state: AppState) -> Router {
    let cors = cors_layer(&state.config.api.allowed_origins);
    let request_id_header = axum::http::HeaderName::from_static("x-request-id");

    // ServiceBuilder applies top-down: the id is assigned before the trace
    // span opens, so every log line under the span carries it, and it is
    // propagated onto the response on the way back out.
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!("request", method = %request.method(), uri = %request.uri(), request_id)
                })
                .on_failure(|error, latency: Duration, _span: &tracing::Span| {
                    tracing::warn!(?error, latency_ms = latency.as_millis() as u64, "request failed");
                }),
        )
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(CompressionLayer::new())
        .layer(cors);

    Router::new()
        .route("/v1/positions", post(handlers::positions))
        .route("/v1/time/resolve", post(handlers::time_resolve))
        .route("/v1/geocode/search", get(handlers::geocode_search))
        .route("/healthz", get(handlers::healthz))
        .layer(middleware)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephemeris_config::EphemerisConfig;

    #[test]
    fn cors_with_no_allowed_origins_permits_any() {
        let cfg = EphemerisConfig::default();
        let layer = cors_layer(&cfg.api.allowed_origins);
        let _ = layer;
    }
}
