//! Ephemeris evaluation for the position service.
//!
//! Two layers: [`engine`] turns loaded SPK kernels into barycentric
//! ICRF state vectors, and [`compute`] turns those into the ecliptic
//! or equatorial coordinates the HTTP surface returns — aberration,
//! frame rotation, sidereal offsets, topocentric observers.

mod engine;

pub mod compute;

pub use compute::{
    CelestialBody, ComputeCore, ComputeError, ComputeRequest, ComputeResult, FrameSpec,
    ObserverFrameUsed, ObserverSpec, Provenance, ZodiacSystem,
};
pub use engine::{Body, Engine, EngineConfig, EngineError, Observer, Query, StateVector};
