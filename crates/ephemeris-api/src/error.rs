//! A single mapping table from internal cause to the public
//! `{code, title, detail, tip}` taxonomy. Internal errors never leak.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Public taxonomy code carried on every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    RangeEphemerisOutside,
    KernelsNotAvailable,
    KernelsCorruption,
    InputInvalid,
    InputMissingRequired,
    InputInvalidFormat,
    BodiesUnsupported,
    SystemIncompatible,
    AyanamshaUnsupported,
    AyanamshaRequired,
    TimeResolutionFailed,
    RateLimited,
    ServiceOverloaded,
    ComputeEphemerisError,
}

impl ApiErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RangeEphemerisOutside => "RANGE.EPHEMERIS_OUTSIDE",
            Self::KernelsNotAvailable => "KERNELS.NOT_AVAILABLE",
            Self::KernelsCorruption => "KERNELS.CORRUPTION",
            Self::InputInvalid => "INPUT.INVALID",
            Self::InputMissingRequired => "INPUT.MISSING_REQUIRED",
            Self::InputInvalidFormat => "INPUT.INVALID_FORMAT",
            Self::BodiesUnsupported => "BODIES.UNSUPPORTED",
            Self::SystemIncompatible => "SYSTEM.INCOMPATIBLE",
            Self::AyanamshaUnsupported => "AYANAMSHA.UNSUPPORTED",
            Self::AyanamshaRequired => "AYANAMSHA.REQUIRED",
            Self::TimeResolutionFailed => "TIME.RESOLUTION_FAILED",
            Self::RateLimited => "RATE.LIMITED",
            Self::ServiceOverloaded => "SERVICE.OVERLOADED",
            Self::ComputeEphemerisError => "COMPUTE.EPHEMERIS_ERROR",
        }
    }

    /// Parse the taxonomy string back into a code, the inverse of [`Self::as_str`].
    /// Used to carry a structured error across the worker subprocess boundary.
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "RANGE.EPHEMERIS_OUTSIDE" => Self::RangeEphemerisOutside,
            "KERNELS.NOT_AVAILABLE" => Self::KernelsNotAvailable,
            "KERNELS.CORRUPTION" => Self::KernelsCorruption,
            "INPUT.INVALID" => Self::InputInvalid,
            "INPUT.MISSING_REQUIRED" => Self::InputMissingRequired,
            "INPUT.INVALID_FORMAT" => Self::InputInvalidFormat,
            "BODIES.UNSUPPORTED" => Self::BodiesUnsupported,
            "SYSTEM.INCOMPATIBLE" => Self::SystemIncompatible,
            "AYANAMSHA.UNSUPPORTED" => Self::AyanamshaUnsupported,
            "AYANAMSHA.REQUIRED" => Self::AyanamshaRequired,
            "TIME.RESOLUTION_FAILED" => Self::TimeResolutionFailed,
            "RATE.LIMITED" => Self::RateLimited,
            "SERVICE.OVERLOADED" => Self::ServiceOverloaded,
            "COMPUTE.EPHEMERIS_ERROR" => Self::ComputeEphemerisError,
            _ => return None,
        })
    }

    const fn status(self) -> StatusCode {
        match self {
            Self::RangeEphemerisOutside
            | Self::InputInvalid
            | Self::InputMissingRequired
            | Self::InputInvalidFormat
            | Self::BodiesUnsupported
            | Self::SystemIncompatible
            | Self::AyanamshaUnsupported
            | Self::AyanamshaRequired
            | Self::TimeResolutionFailed => StatusCode::BAD_REQUEST,
            Self::KernelsNotAvailable | Self::KernelsCorruption | Self::ComputeEphemerisError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceOverloaded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::RangeEphemerisOutside => "Epoch outside ephemeris coverage",
            Self::KernelsNotAvailable => "Kernel bundle unavailable",
            Self::KernelsCorruption => "Kernel bundle checksum mismatch",
            Self::InputInvalid => "Invalid request",
            Self::InputMissingRequired => "Missing required field",
            Self::InputInvalidFormat => "Invalid field format",
            Self::BodiesUnsupported => "Unsupported body",
            Self::SystemIncompatible => "Incompatible system/ayanamsha combination",
            Self::AyanamshaUnsupported => "Unsupported ayanamsha",
            Self::AyanamshaRequired => "Ayanamsha required for sidereal system",
            Self::TimeResolutionFailed => "Could not resolve civil time to UTC",
            Self::RateLimited => "Rate limit exceeded",
            Self::ServiceOverloaded => "Service overloaded",
            Self::ComputeEphemerisError => "Ephemeris computation failed",
        }
    }

    const fn tip(self) -> &'static str {
        match self {
            Self::RangeEphemerisOutside => "Use a supported date range or enable the extended bundle",
            Self::KernelsNotAvailable | Self::KernelsCorruption => "Retry; report if persistent",
            Self::InputInvalid | Self::InputMissingRequired | Self::InputInvalidFormat => "Consult the request schema",
            Self::BodiesUnsupported => "Use a body from the supported list",
            Self::SystemIncompatible => "Remove or add an ayanamsha to match the requested system",
            Self::AyanamshaUnsupported => "Use a registered ayanamsha id",
            Self::AyanamshaRequired => "Provide an ayanamsha id for sidereal requests",
            Self::TimeResolutionFailed => "Provide an explicit zone/offset or use the as_entered profile",
            Self::RateLimited => "Retry after the provided number of seconds",
            Self::ServiceOverloaded => "Retry with backoff",
            Self::ComputeEphemerisError => "Retry; report if persistent",
        }
    }
}

/// The wire shape of every error response: `{code, title, detail, tip}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub title: &'static str,
    pub detail: String,
    pub tip: &'static str,
    #[serde(skip)]
    status: StatusCode,
    #[serde(skip)]
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, detail: impl Into<String>) -> Self {
        Self { code: code.as_str(), title: code.title(), detail: detail.into(), tip: code.tip(), status: code.status(), retry_after_secs: None }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    /// Flatten to the minimal `{code, detail}` shape carried across the
    /// worker subprocess boundary in [`crate::worker_job`]'s job errors.
    pub fn to_wire(&self) -> WireError {
        WireError { code: self.code.to_string(), detail: self.detail.clone() }
    }

    /// Reconstruct from the wire shape, falling back to the generic compute
    /// error code if `code` is not a recognized taxonomy string. The wire
    /// shape carries no retry hint, so backoff codes get the minimum one.
    pub fn from_wire(wire: &WireError) -> Self {
        let code = ApiErrorCode::from_str(&wire.code).unwrap_or(ApiErrorCode::ComputeEphemerisError);
        let err = ApiError::new(code, wire.detail.clone());
        match code {
            ApiErrorCode::RateLimited | ApiErrorCode::ServiceOverloaded => err.with_retry_after(1),
            _ => err,
        }
    }
}

/// The `{code, detail}` shape an `ApiError` is reduced to when serialized
/// into a [`ephemeris_worker::WireResponse`]'s `error` field.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct WireError {
    pub code: String,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let retry_after = self.retry_after_secs;
        let mut response = (status, Json(&self)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = axum::http::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Translate an [`ephemeris_core::ComputeError`] into the public taxonomy.
pub fn map_compute_error(err: &ephemeris_core::ComputeError) -> ApiError {
    use ephemeris_core::{ComputeError, EngineError};
    match err {
        ComputeError::Engine(EngineError::EpochOutOfRange { epoch_tdb_jd }) => {
            ApiError::new(ApiErrorCode::RangeEphemerisOutside, format!("epoch {epoch_tdb_jd} is outside the loaded bundle's coverage"))
        }
        ComputeError::Engine(EngineError::KernelLoad(msg)) => ApiError::new(ApiErrorCode::KernelsNotAvailable, msg.clone()),
        ComputeError::SiderealEquatorialUnsupported => {
            ApiError::new(ApiErrorCode::SystemIncompatible, "sidereal system is not supported with the equatorial frame")
        }
        ComputeError::AyanamshaRequired => ApiError::new(ApiErrorCode::AyanamshaRequired, "sidereal request requires an ayanamsha id"),
        ComputeError::Ayanamsha(e) => ApiError::new(ApiErrorCode::AyanamshaUnsupported, e.to_string()),
        other => ApiError::new(ApiErrorCode::ComputeEphemerisError, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_match_taxonomy_strings() {
        assert_eq!(ApiErrorCode::RangeEphemerisOutside.as_str(), "RANGE.EPHEMERIS_OUTSIDE");
        assert_eq!(ApiErrorCode::RateLimited.as_str(), "RATE.LIMITED");
        assert_eq!(ApiErrorCode::ServiceOverloaded.as_str(), "SERVICE.OVERLOADED");
    }

    #[test]
    fn status_codes_match_table() {
        assert_eq!(ApiErrorCode::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiErrorCode::ServiceOverloaded.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiErrorCode::BodiesUnsupported.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiErrorCode::KernelsCorruption.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
