//! Ayanāṃśa registry and lunar node longitudes.
//!
//! `ephemeris-ayanamsha` resolves sidereal-zodiac reference systems
//! (ayanāṃśa) and the Moon's orbital nodes (Rahu/Ketu) to ecliptic
//! longitudes at a given epoch. The registry itself is declarative: the
//! 20 built-in systems are loaded from a bundled TOML file, and callers
//! may supply their own to add `fixed`-kind entries with no code change.

pub mod ayanamsha;
pub mod error;
pub mod lunar_nodes;
pub mod registry;

pub use ayanamsha::{centuries_from_jd_tdb, centuries_from_tdb_seconds, offset_deg, AyanamshaSystem};
pub use error::AyanamshaError;
pub use lunar_nodes::{lunar_node_deg, LunarNode, NodeMode};
pub use registry::{AyanamshaEntry, AyanamshaKind, AyanamshaRegistry};
