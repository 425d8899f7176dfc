//! Declarative ayanāṃśa registry.
//!
//! Resolves a case-insensitive id plus an epoch to an ayanāṃśa offset in
//! degrees. Entries come in two kinds:
//!
//! - `fixed`: a reference offset plus a linear precession rate, evaluated
//!   entirely from its own data; no code change needed to add one.
//! - `formula`: a named closed form, wired to one of the [`AyanamshaSystem`]
//!   variants in [`crate::ayanamsha`] (the nonlinear IAU 2006
//!   general-precession model, optionally nutation-corrected).
//!
//! The default registry is seeded from a TOML file shipped with the crate
//! ([`SEED_TOML`]) so the 20 built-in systems are themselves declarative
//! data, not special-cased code.

use ephemeris_frames::nutation_iau2000b;
use ephemeris_time::J2000_JD;
use serde::Deserialize;

use crate::ayanamsha::{centuries_from_tdb_seconds, offset_deg, AyanamshaSystem};
use crate::error::AyanamshaError;

const SEED_TOML: &str = include_str!("../config/ayanamsha_seed.toml");

/// How an [`AyanamshaEntry`] computes its offset.
#[derive(Debug, Clone, PartialEq)]
pub enum AyanamshaKind {
    /// `offset(epoch) = offset_at_epoch + rate * years(epoch - reference_epoch)`.
    Fixed {
        reference_epoch_jd_tdb: f64,
        offset_at_epoch_deg: f64,
        precession_rate_arcsec_per_year: f64,
    },
    /// Delegates to one of the 20 named closed-form systems.
    Formula(AyanamshaSystem),
}

/// A resolvable ayanāṃśa definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AyanamshaEntry {
    pub id: String,
    pub kind: AyanamshaKind,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(rename = "entry")]
    entries: Vec<SeedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SeedEntry {
    Fixed {
        id: String,
        reference_epoch_jd_tdb: f64,
        offset_at_epoch_deg: f64,
        precession_rate_arcsec_per_year: f64,
    },
    Formula {
        id: String,
        system: String,
    },
}

/// The registry: an ordered, id-indexed set of [`AyanamshaEntry`] values.
#[derive(Debug, Clone, PartialEq)]
pub struct AyanamshaRegistry {
    entries: Vec<AyanamshaEntry>,
}

impl AyanamshaRegistry {
    /// Build the default registry from the bundled seed TOML.
    pub fn seed() -> Self {
        Self::from_toml(SEED_TOML).expect("bundled ayanamsha seed TOML must parse")
    }

    /// Build a registry from declarative TOML content, in the same shape as
    /// the bundled seed file. Lets deployments add custom `fixed` entries
    /// without a code change.
    pub fn from_toml(toml_text: &str) -> Result<Self, AyanamshaError> {
        let seed: SeedFile = toml::from_str(toml_text).map_err(|e| AyanamshaError::ConfigParse(e.to_string()))?;
        let mut entries = Vec::with_capacity(seed.entries.len());
        for raw in seed.entries {
            let entry = match raw {
                SeedEntry::Fixed { id, reference_epoch_jd_tdb, offset_at_epoch_deg, precession_rate_arcsec_per_year } => {
                    AyanamshaEntry {
                        id,
                        kind: AyanamshaKind::Fixed {
                            reference_epoch_jd_tdb,
                            offset_at_epoch_deg,
                            precession_rate_arcsec_per_year,
                        },
                    }
                }
                SeedEntry::Formula { id, system } => {
                    let sys = AyanamshaSystem::from_slug(&system)
                        .ok_or_else(|| AyanamshaError::ConfigParse(format!("unknown formula system: {system}")))?;
                    AyanamshaEntry { id, kind: AyanamshaKind::Formula(sys) }
                }
            };
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// All entries, in declaration order.
    pub fn list(&self) -> &[AyanamshaEntry] {
        &self.entries
    }

    fn find(&self, id: &str) -> Option<&AyanamshaEntry> {
        let needle = id.trim().to_ascii_lowercase();
        self.entries.iter().find(|e| e.id.to_ascii_lowercase() == needle)
    }

    /// `ok` if `id` resolves to a known entry, else `AYANAMSHA.UNSUPPORTED`.
    pub fn validate(&self, id: &str) -> Result<(), AyanamshaError> {
        self.find(id)
            .map(|_| ())
            .ok_or_else(|| AyanamshaError::Unsupported { id: id.to_string() })
    }

    /// Resolve `id` at `epoch_tdb_s` (TDB seconds past J2000.0) to degrees.
    pub fn resolve(&self, id: &str, epoch_tdb_s: f64) -> Result<f64, AyanamshaError> {
        let entry = self.find(id).ok_or_else(|| AyanamshaError::Unsupported { id: id.to_string() })?;
        Ok(match &entry.kind {
            AyanamshaKind::Fixed { reference_epoch_jd_tdb, offset_at_epoch_deg, precession_rate_arcsec_per_year } => {
                let reference_tdb_s = (*reference_epoch_jd_tdb - J2000_JD) * 86_400.0;
                let years_since_reference = (epoch_tdb_s - reference_tdb_s) / (365.25 * 86_400.0);
                offset_at_epoch_deg + precession_rate_arcsec_per_year * years_since_reference / 3600.0
            }
            AyanamshaKind::Formula(system) => {
                let t = centuries_from_tdb_seconds(epoch_tdb_s);
                let delta_psi_arcsec = if system.tracks_true_equinox() {
                    nutation_iau2000b(t).dpsi_arcsec
                } else {
                    0.0
                };
                offset_deg(*system, t, delta_psi_arcsec)
            }
        })
    }
}

impl Default for AyanamshaRegistry {
    fn default() -> Self {
        Self::seed()
    }
}
