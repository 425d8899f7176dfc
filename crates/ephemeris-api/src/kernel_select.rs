//! Loads the DE440/DE441 bundle manifests, verifies checksums, and builds
//! the [`ComputeCore`] pair the worker subprocess dispatches against by
//! request epoch.
//!
//! [`ephemeris_core::Engine`] loads SPK kernels directly from a path list
//! and has no notion of a checksummed, coverage-delimited bundle; that
//! notion lives entirely in [`ephemeris_kernel::KernelBundle`]. Rather than
//! thread bundle awareness into `Engine` itself, this module verifies each
//! bundle's manifest once at worker startup (for its checksum and coverage
//! side effects) and then builds a plain `Engine` from the same file list
//! for actual evaluation.

use ephemeris_ayanamsha::AyanamshaRegistry;
use ephemeris_core::compute::ComputeCore;
use ephemeris_core::{Engine, EngineConfig};
use ephemeris_kernel::{BundleManifest, KernelBundle};
use ephemeris_time::EopKernel;

use ephemeris_config::KernelConfig;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum KernelSelectError {
    ManifestUnreadable { path: String, detail: String },
    ManifestInvalid { path: String, detail: String },
    BundleOpenFailed(String),
    EngineLoadFailed(String),
}

impl std::fmt::Display for KernelSelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManifestUnreadable { path, detail } => write!(f, "cannot read manifest {path}: {detail}"),
            Self::ManifestInvalid { path, detail } => write!(f, "invalid manifest {path}: {detail}"),
            Self::BundleOpenFailed(msg) => write!(f, "bundle checksum verification failed: {msg}"),
            Self::EngineLoadFailed(msg) => write!(f, "engine load failed: {msg}"),
        }
    }
}

impl std::error::Error for KernelSelectError {}

fn load_manifest(path: &str) -> Result<BundleManifest, KernelSelectError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| KernelSelectError::ManifestUnreadable { path: path.to_string(), detail: e.to_string() })?;
    toml::from_str(&text).map_err(|e| KernelSelectError::ManifestInvalid { path: path.to_string(), detail: e.to_string() })
}

/// One verified bundle, ready to evaluate queries against.
pub struct LoadedBundle {
    pub id: String,
    pub coverage_tdb_s: (f64, f64),
    pub checksums: Vec<String>,
    pub core: ComputeCore,
}

impl LoadedBundle {
    pub fn covers(&self, epoch_tdb_s: f64) -> bool {
        epoch_tdb_s >= self.coverage_tdb_s.0 && epoch_tdb_s <= self.coverage_tdb_s.1
    }
}

fn build_bundle(
    manifest: &BundleManifest,
    ayanamsha: AyanamshaRegistry,
    eop: Option<EopKernel>,
) -> Result<LoadedBundle, KernelSelectError> {
    // `KernelBundle::open` is used purely for its checksum-verification
    // side effect; the resulting `SpkKernel`s are discarded in favor of
    // a plain `Engine` built from the same file list.
    KernelBundle::open(manifest).map_err(|e| KernelSelectError::BundleOpenFailed(e.to_string()))?;

    let spk_paths = manifest.files.iter().map(|f| f.path.clone()).collect();
    let engine = Engine::new(EngineConfig { spk_paths })
        .map_err(|e| KernelSelectError::EngineLoadFailed(e.to_string()))?;

    let checksums = manifest.files.iter().map(|f| f.sha256_hex.clone()).collect();
    Ok(LoadedBundle {
        id: manifest.id.clone(),
        coverage_tdb_s: (manifest.coverage_start_tdb_s, manifest.coverage_end_tdb_s),
        checksums,
        core: ComputeCore::new(engine, ayanamsha, eop),
    })
}

/// The primary bundle (DE440) plus an optional wide-coverage bundle
/// (DE441), selected between by request epoch.
pub struct KernelSelector {
    primary: LoadedBundle,
    wide: Option<LoadedBundle>,
}

impl KernelSelector {
    pub fn load(config: &KernelConfig) -> Result<Self, KernelSelectError> {
        let ayanamsha = match &config.ayanamsha_registry_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| KernelSelectError::ManifestUnreadable { path: path.clone(), detail: e.to_string() })?;
                AyanamshaRegistry::from_toml(&text)
                    .map_err(|e| KernelSelectError::ManifestInvalid { path: path.clone(), detail: e.to_string() })?
            }
            None => AyanamshaRegistry::seed(),
        };
        let eop = match &config.eop_path {
            Some(path) => Some(
                EopKernel::load(std::path::Path::new(path))
                    .map_err(|e| KernelSelectError::ManifestUnreadable { path: path.clone(), detail: e.to_string() })?,
            ),
            None => None,
        };

        let primary_manifest = load_manifest(&config.manifest_path)?;
        let primary = build_bundle(&primary_manifest, ayanamsha.clone(), eop.clone())?;

        let wide = match &config.wide_manifest_path {
            Some(path) => {
                let manifest = load_manifest(path)?;
                Some(build_bundle(&manifest, ayanamsha, eop)?)
            }
            None => None,
        };

        Ok(Self { primary, wide })
    }

    /// Select the bundle covering `epoch_tdb_s`: prefer the primary
    /// bundle, fall back to the wide bundle, else `None`
    /// (`RANGE.EPHEMERIS_OUTSIDE` at the caller).
    pub fn select(&self, epoch_tdb_s: f64) -> Option<&LoadedBundle> {
        if self.primary.covers(epoch_tdb_s) {
            Some(&self.primary)
        } else if let Some(wide) = &self.wide {
            if wide.covers(epoch_tdb_s) {
                Some(wide)
            } else {
                None
            }
        } else {
            None
        }
    }

    pub fn primary(&self) -> &LoadedBundle {
        &self.primary
    }

    pub fn wide(&self) -> Option<&LoadedBundle> {
        self.wide.as_ref()
    }

    /// All checksums across loaded bundles, for `/healthz`.
    pub fn all_checksums(&self) -> Vec<String> {
        let mut out = self.primary.checksums.clone();
        if let Some(wide) = &self.wide {
            out.extend(wide.checksums.clone());
        }
        out
    }
}
