//! The JSON payload shape carried inside [`ephemeris_worker::ipc::WireRequest`]
//! / [`WireResponse`]`.result`, shared by the dispatching API process and the
//! worker subprocess so both sides agree on the wire shape without either
//! depending on the other's internals.

use ephemeris_core::{CelestialBody, ComputeRequest, FrameSpec, ObserverSpec, ZodiacSystem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobObserver {
    pub kind: String, // "ssb" | "body" | "topocentric"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSystem {
    pub kind: String, // "tropical" | "sidereal"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ayanamsha_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub bodies: Vec<String>,
    pub observer: JobObserver,
    pub frame: String, // "ecliptic_of_date" | "equatorial_j2000"
    pub system: JobSystem,
    pub epoch_tdb_jd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBodyResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ra_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dec_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_au: Option<f64>,
    pub observer_frame_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ayanamsha_id: Option<String>,
    pub aberration_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub bundle_id: String,
    pub results: Vec<JobBodyResult>,
}

/// Parse a body name from the wire request into the domain type.
///
/// `Earth` is deliberately absent: the observer is on (or at the center
/// of) Earth, so it is never a valid target on the wire.
pub fn parse_body(name: &str) -> Option<CelestialBody> {
    use ephemeris_core::Body;
    Some(match name {
        "Sun" => CelestialBody::Physical(Body::Sun),
        "Mercury" => CelestialBody::Physical(Body::Mercury),
        "Venus" => CelestialBody::Physical(Body::Venus),
        "Moon" => CelestialBody::Physical(Body::Moon),
        "Mars" => CelestialBody::Physical(Body::Mars),
        "Jupiter" => CelestialBody::Physical(Body::Jupiter),
        "Saturn" => CelestialBody::Physical(Body::Saturn),
        "Uranus" => CelestialBody::Physical(Body::Uranus),
        "Neptune" => CelestialBody::Physical(Body::Neptune),
        "Pluto" => CelestialBody::Physical(Body::Pluto),
        "TrueNode" => CelestialBody::TrueNode,
        "MeanNode" => CelestialBody::MeanNode,
        _ => return None,
    })
}

pub fn body_name(body: CelestialBody) -> &'static str {
    use ephemeris_core::Body;
    match body {
        CelestialBody::Physical(Body::Sun) => "Sun",
        CelestialBody::Physical(Body::Mercury) => "Mercury",
        CelestialBody::Physical(Body::Venus) => "Venus",
        CelestialBody::Physical(Body::Earth) => "Earth",
        CelestialBody::Physical(Body::Moon) => "Moon",
        CelestialBody::Physical(Body::Mars) => "Mars",
        CelestialBody::Physical(Body::Jupiter) => "Jupiter",
        CelestialBody::Physical(Body::Saturn) => "Saturn",
        CelestialBody::Physical(Body::Uranus) => "Uranus",
        CelestialBody::Physical(Body::Neptune) => "Neptune",
        CelestialBody::Physical(Body::Pluto) => "Pluto",
        CelestialBody::TrueNode => "TrueNode",
        CelestialBody::MeanNode => "MeanNode",
    }
}

pub fn parse_observer(observer: &JobObserver) -> Option<ObserverSpec> {
    use ephemeris_core::Body;
    match observer.kind.as_str() {
        "ssb" => Some(ObserverSpec::SolarSystemBarycenter),
        "body" => {
            let body = match observer.body.as_deref()? {
                "Sun" => Body::Sun,
                "Mercury" => Body::Mercury,
                "Venus" => Body::Venus,
                "Earth" => Body::Earth,
                "Moon" => Body::Moon,
                "Mars" => Body::Mars,
                "Jupiter" => Body::Jupiter,
                "Saturn" => Body::Saturn,
                "Uranus" => Body::Uranus,
                "Neptune" => Body::Neptune,
                "Pluto" => Body::Pluto,
                _ => return None,
            };
            Some(ObserverSpec::Body(body))
        }
        "topocentric" => Some(ObserverSpec::Topocentric {
            lat_deg: observer.lat_deg?,
            lon_deg: observer.lon_deg?,
            elevation_m: observer.elevation_m.unwrap_or(0.0),
        }),
        _ => None,
    }
}

pub fn parse_frame(frame: &str) -> Option<FrameSpec> {
    match frame {
        "ecliptic_of_date" => Some(FrameSpec::EclipticOfDate),
        "equatorial_j2000" => Some(FrameSpec::EquatorialJ2000),
        _ => None,
    }
}

pub fn parse_system(system: &JobSystem) -> Option<ZodiacSystem> {
    match system.kind.as_str() {
        "tropical" => Some(ZodiacSystem::Tropical),
        "sidereal" => Some(ZodiacSystem::Sidereal { ayanamsha_id: system.ayanamsha_id.clone()? }),
        _ => None,
    }
}

/// Build the per-body [`ComputeRequest`]s implied by a [`JobRequest`].
/// Returns `None` if any field fails to parse (the dispatching side is
/// expected to validate before ever constructing a `JobRequest`).
pub fn to_compute_requests(job: &JobRequest) -> Option<Vec<(String, ComputeRequest)>> {
    let observer = parse_observer(&job.observer)?;
    let frame = parse_frame(&job.frame)?;
    let system = parse_system(&job.system)?;
    job.bodies
        .iter()
        .map(|name| {
            let target = parse_body(name)?;
            Some((name.clone(), ComputeRequest { target, observer, frame, system: system.clone(), epoch_tdb_jd: job.epoch_tdb_jd }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_physical_body_names() {
        for name in ["Sun", "Moon", "Mercury", "Pluto", "TrueNode", "MeanNode"] {
            let body = parse_body(name).unwrap();
            assert_eq!(body_name(body), name);
        }
    }

    #[test]
    fn unknown_body_name_is_none() {
        assert!(parse_body("Xenu").is_none());
    }

    #[test]
    fn earth_is_not_a_wire_target() {
        assert!(parse_body("Earth").is_none());
        // But it remains a valid observer center.
        let observer = JobObserver {
            kind: "body".to_string(),
            body: Some("Earth".to_string()),
            lat_deg: None,
            lon_deg: None,
            elevation_m: None,
        };
        assert!(parse_observer(&observer).is_some());
    }

    #[test]
    fn builds_compute_requests_for_a_tropical_job() {
        let job = JobRequest {
            bodies: vec!["Sun".to_string(), "Moon".to_string()],
            observer: JobObserver { kind: "ssb".to_string(), body: None, lat_deg: None, lon_deg: None, elevation_m: None },
            frame: "ecliptic_of_date".to_string(),
            system: JobSystem { kind: "tropical".to_string(), ayanamsha_id: None },
            epoch_tdb_jd: 2_451_545.0,
        };
        let requests = to_compute_requests(&job).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "Sun");
    }

    #[test]
    fn sidereal_without_ayanamsha_id_fails_to_parse() {
        let job = JobRequest {
            bodies: vec!["Sun".to_string()],
            observer: JobObserver { kind: "ssb".to_string(), body: None, lat_deg: None, lon_deg: None, elevation_m: None },
            frame: "ecliptic_of_date".to_string(),
            system: JobSystem { kind: "sidereal".to_string(), ayanamsha_id: None },
            epoch_tdb_jd: 2_451_545.0,
        };
        assert!(to_compute_requests(&job).is_none());
    }
}
