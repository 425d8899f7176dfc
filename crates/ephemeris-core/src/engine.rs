//! The per-worker ephemeris evaluator.
//!
//! [`Engine`] owns a set of loaded SPK kernels and answers one
//! question: the ICRF/J2000 state of a body relative to an observer at
//! a TDB epoch. Everything domain-shaped — frames of date, aberration,
//! sidereal offsets, topocentric observers — lives in
//! [`crate::compute`] on top of this.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use ephemeris_kernel::{KernelError, SpkKernel};

/// Paths the engine loads at startup. Checksum verification of the
/// same files happens at the bundle layer before an engine is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub spk_paths: Vec<PathBuf>,
}

/// Bodies the wire contract can ask for, plus Earth as an observer
/// center. Derived points (lunar nodes) live in the compute layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

/// NAIF ids for every supported body, in [`Body`] declaration order.
const NAIF_IDS: [(Body, i32); 11] = [
    (Body::Sun, 10),
    (Body::Mercury, 199),
    (Body::Venus, 299),
    (Body::Earth, 399),
    (Body::Moon, 301),
    (Body::Mars, 499),
    (Body::Jupiter, 599),
    (Body::Saturn, 699),
    (Body::Uranus, 799),
    (Body::Neptune, 899),
    (Body::Pluto, 999),
];

impl Body {
    /// The NAIF integer id used to address SPK segments.
    pub fn naif_id(self) -> i32 {
        NAIF_IDS
            .iter()
            .find(|(body, _)| *body == self)
            .map(|(_, id)| *id)
            .expect("every body has a NAIF id")
    }
}

/// Where the returned state vector is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observer {
    SolarSystemBarycenter,
    Body(Body),
}

/// One evaluation request. Output is always the ICRF/J2000 frame; the
/// compute layer applies whatever rotation the response needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Query {
    pub target: Body,
    pub observer: Observer,
    pub epoch_tdb_jd: f64,
}

/// Cartesian position and velocity, km and km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl StateVector {
    const ZERO: StateVector = StateVector { position_km: [0.0; 3], velocity_km_s: [0.0; 3] };

    fn minus(&self, other: &StateVector) -> StateVector {
        let mut out = StateVector::ZERO;
        for i in 0..3 {
            out.position_km[i] = self.position_km[i] - other.position_km[i];
            out.velocity_km_s[i] = self.velocity_km_s[i] - other.velocity_km_s[i];
        }
        out
    }
}

/// Engine-level failures.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EngineError {
    InvalidConfig(&'static str),
    InvalidQuery(&'static str),
    KernelLoad(String),
    EpochOutOfRange { epoch_tdb_jd: f64 },
    Internal(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::InvalidQuery(msg) => write!(f, "invalid query: {msg}"),
            Self::KernelLoad(msg) => write!(f, "kernel load error: {msg}"),
            Self::EpochOutOfRange { epoch_tdb_jd } => {
                write!(f, "epoch out of range: {epoch_tdb_jd}")
            }
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl Error for EngineError {}

/// A loaded, immutable set of SPK kernels.
///
/// `Engine` is `Send + Sync` and holds no interior mutability: each
/// `query` call memoizes chain resolutions in a stack-local map, so
/// concurrent callers share nothing.
pub struct Engine {
    spks: Vec<SpkKernel>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let segments: usize = self.spks.iter().map(|k| k.segments().len()).sum();
        f.debug_struct("Engine")
            .field("kernels", &self.spks.len())
            .field("segments", &segments)
            .finish()
    }
}

impl Engine {
    /// Load every SPK named by the config.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        if config.spk_paths.is_empty() {
            return Err(EngineError::InvalidConfig("spk_paths must not be empty"));
        }
        let mut spks = Vec::with_capacity(config.spk_paths.len());
        for path in &config.spk_paths {
            if path.as_os_str().is_empty() {
                return Err(EngineError::InvalidConfig("spk_paths must not contain empty paths"));
            }
            spks.push(SpkKernel::load(path).map_err(|e| EngineError::KernelLoad(e.to_string()))?);
        }
        Ok(Self { spks })
    }

    /// Evaluate one query to an ICRF state vector.
    pub fn query(&self, query: Query) -> Result<StateVector, EngineError> {
        if !query.epoch_tdb_jd.is_finite() {
            return Err(EngineError::InvalidQuery("epoch_tdb_jd must be finite"));
        }
        if Observer::Body(query.target) == query.observer {
            return Err(EngineError::InvalidQuery("target and observer cannot be identical"));
        }

        let epoch_tdb_s = ephemeris_time::jd_to_tdb_seconds(query.epoch_tdb_jd);
        let mut memo = HashMap::new();

        let target = self.barycentric(query.target.naif_id(), epoch_tdb_s, &mut memo);
        let target = target.map_err(|e| self.lift(e, query.epoch_tdb_jd))?;

        let observer = match query.observer {
            Observer::SolarSystemBarycenter => StateVector::ZERO,
            Observer::Body(body) => self
                .barycentric(body.naif_id(), epoch_tdb_s, &mut memo)
                .map_err(|e| self.lift(e, query.epoch_tdb_jd))?,
        };

        Ok(target.minus(&observer))
    }

    fn lift(&self, e: KernelError, epoch_tdb_jd: f64) -> EngineError {
        match e {
            KernelError::EpochOutOfRange { .. } => EngineError::EpochOutOfRange { epoch_tdb_jd },
            other => EngineError::Internal(other.to_string()),
        }
    }

    /// State of `naif_id` relative to the solar-system barycenter,
    /// summed along the segment chain. Bodies without a direct segment
    /// fall back to their planet-system barycenter. Resolved states are
    /// memoized per body id so Earth's chain, for example, is walked
    /// once per request however many bodies share it.
    fn barycentric(
        &self,
        naif_id: i32,
        epoch_tdb_s: f64,
        memo: &mut HashMap<i32, StateVector>,
    ) -> Result<StateVector, KernelError> {
        if naif_id == 0 {
            return Ok(StateVector::ZERO);
        }
        if let Some(cached) = memo.get(&naif_id) {
            return Ok(*cached);
        }

        let Some((center, eval)) = self.evaluate_any(naif_id, epoch_tdb_s)? else {
            // No segment anywhere for this id: retry as the owning
            // planet-system barycenter.
            let barycenter = ephemeris_kernel::planet_body_to_barycenter(naif_id);
            if barycenter == naif_id {
                return Err(KernelError::SegmentNotFound { target: naif_id, center: -1 });
            }
            let state = self.barycentric(barycenter, epoch_tdb_s, memo)?;
            memo.insert(naif_id, state);
            return Ok(state);
        };

        let parent = self.barycentric(center, epoch_tdb_s, memo)?;
        let mut state = parent;
        for i in 0..3 {
            state.position_km[i] += eval.position_km[i];
            state.velocity_km_s[i] += eval.velocity_km_s[i];
        }
        memo.insert(naif_id, state);
        Ok(state)
    }

    /// Evaluate `naif_id` against whichever loaded kernel carries a
    /// covering segment for it, returning the segment's center too.
    /// `Ok(None)` means no kernel knows the body at all; an epoch gap
    /// in a kernel that does know it is an error.
    fn evaluate_any(
        &self,
        naif_id: i32,
        epoch_tdb_s: f64,
    ) -> Result<Option<(i32, ephemeris_kernel::SpkEvaluation)>, KernelError> {
        let mut known = false;
        for spk in &self.spks {
            let Some(center) = spk.center_for(naif_id) else { continue };
            known = true;
            match spk.evaluate(naif_id, center, epoch_tdb_s) {
                Ok(eval) => return Ok(Some((center, eval))),
                Err(KernelError::EpochOutOfRange { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        if known {
            Err(KernelError::EpochOutOfRange { target: naif_id, center: -1, epoch_tdb_s })
        } else {
            Ok(None)
        }
    }
}

// Engine must stay shareable across worker tasks.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naif_ids_cover_every_body() {
        assert_eq!(Body::Sun.naif_id(), 10);
        assert_eq!(Body::Moon.naif_id(), 301);
        assert_eq!(Body::Earth.naif_id(), 399);
        assert_eq!(Body::Pluto.naif_id(), 999);
        // Declaration order and table order agree.
        for (body, id) in NAIF_IDS {
            assert_eq!(body.naif_id(), id);
        }
    }

    #[test]
    fn empty_config_is_rejected() {
        let err = Engine::new(EngineConfig { spk_paths: vec![] }).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = Engine::new(EngineConfig { spk_paths: vec![PathBuf::new()] }).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn missing_kernel_file_is_a_load_error() {
        let err = Engine::new(EngineConfig {
            spk_paths: vec![PathBuf::from("/no/such/kernel.bsp")],
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::KernelLoad(_)));
    }
}
