//! Resolves a wire `when` value (pass-through UTC or civil local time) to
//! a UTC instant and a TDB Julian Date, bridging the HTTP edge to
//! [`ephemeris_time::civil::resolve_civil`].

use chrono::{DateTime, Datelike, Timelike, Utc};
use ephemeris_time::civil::{resolve_civil, HistoricalPatch, ParityProfile, Place};
use ephemeris_time::{Epoch, LeapSecondKernel};

use crate::error::{ApiError, ApiErrorCode};
use crate::types::{TimeResolutionDto, TimeResolutionProvenanceDto, WhenDto};

pub fn parse_parity_profile(s: &str) -> Option<ParityProfile> {
    Some(match s {
        "strict_history" => ParityProfile::StrictHistory,
        "astro_com" => ParityProfile::AstroCom,
        "clairvision" => ParityProfile::Clairvision,
        "as_entered" => ParityProfile::AsEntered,
        _ => return None,
    })
}

/// Inverse of [`parse_parity_profile`], for response provenance.
pub fn parity_profile_name(profile: ParityProfile) -> &'static str {
    match profile {
        ParityProfile::StrictHistory => "strict_history",
        ParityProfile::AstroCom => "astro_com",
        ParityProfile::Clairvision => "clairvision",
        ParityProfile::AsEntered => "as_entered",
    }
}

fn utc_to_jd_tdb(utc: DateTime<Utc>, lsk: &LeapSecondKernel) -> f64 {
    let sec = utc.second() as f64 + utc.nanosecond() as f64 / 1e9;
    Epoch::from_utc(utc.year(), utc.month(), utc.day(), utc.hour(), utc.minute(), sec, lsk).as_jd_tdb()
}

/// Resolve `when` into a UTC instant, its TDB Julian Date, and (for civil
/// input) the [`TimeResolutionDto`] to surface in the response provenance.
pub fn resolve_when(
    when: &WhenDto,
    default_parity_profile: &str,
    lsk: &LeapSecondKernel,
    patches: &[HistoricalPatch],
) -> Result<(DateTime<Utc>, f64, Option<TimeResolutionDto>), ApiError> {
    match when {
        WhenDto::Utc { utc } => {
            let parsed = DateTime::parse_from_rfc3339(utc)
                .map_err(|e| ApiError::new(ApiErrorCode::InputInvalidFormat, format!("invalid utc datetime '{utc}': {e}")))?
                .with_timezone(&Utc);
            Ok((parsed, utc_to_jd_tdb(parsed, lsk), None))
        }
        WhenDto::Local { local_datetime, place, parity_profile } => {
            let profile_str = parity_profile.as_deref().unwrap_or(default_parity_profile);
            let profile = parse_parity_profile(profile_str).ok_or_else(|| {
                ApiError::new(ApiErrorCode::InputInvalidFormat, format!("unknown parity_profile '{profile_str}'"))
            })?;
            let place = Place { lat: place.lat, lon: place.lon, elev_m: place.elev.unwrap_or(0.0) };
            let resolution = resolve_civil(local_datetime, place, profile, None, patches)
                .map_err(|e| ApiError::new(ApiErrorCode::TimeResolutionFailed, e.to_string()))?;

            let dto = TimeResolutionDto {
                utc: resolution.utc.to_rfc3339(),
                zone_id: resolution.zone_id.clone(),
                offset_seconds: resolution.offset_seconds,
                dst_active: resolution.dst_active,
                confidence: format!("{:?}", resolution.confidence).to_lowercase(),
                reason: resolution.reason.clone(),
                provenance: TimeResolutionProvenanceDto {
                    profile: parity_profile_name(resolution.provenance.profile).to_string(),
                    sources: resolution.provenance.sources.clone(),
                    patches_applied: resolution.provenance.patches_applied.clone(),
                },
                warnings: resolution.warnings.clone(),
            };
            Ok((resolution.utc, utc_to_jd_tdb(resolution.utc, lsk), Some(dto)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_names_round_trip() {
        for name in ["strict_history", "astro_com", "clairvision", "as_entered"] {
            let profile = parse_parity_profile(name).unwrap();
            assert_eq!(parity_profile_name(profile), name);
        }
        assert!(parse_parity_profile("swiss_eph").is_none());
    }
}
