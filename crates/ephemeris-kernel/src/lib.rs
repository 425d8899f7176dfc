//! NAIF DAF/SPK kernel loading and Chebyshev ephemeris interpolation.
//!
//! This crate provides:
//! - A generic DAF binary reader (`daf`)
//! - An SPK segment catalog and Type 2 (Chebyshev) evaluator (`spk`, `interp`)
//! - Bundle-level checksum verification and DE440/DE441 auto-handoff (`bundle`)

pub mod bundle;
pub mod daf;
pub mod error;
pub mod interp;
pub mod spk;

pub use bundle::{BundleManifest, KernelBundle, ManifestFile};
pub use error::KernelError;
pub use spk::{planet_body_to_barycenter, Segment, SpkEvaluation, SpkKernel};
