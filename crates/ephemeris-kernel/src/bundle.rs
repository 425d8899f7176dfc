//! Kernel bundle manifests: file lists with expected checksums and a
//! declared coverage window, verified before any pool opens.

use std::path::PathBuf;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::KernelError;
use crate::spk::SpkKernel;

/// One file declared by a bundle manifest: path plus expected checksum.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestFile {
    pub path: PathBuf,
    pub sha256_hex: String,
}

/// Declarative description of a kernel bundle (e.g. DE440): its files and
/// the date interval it covers, expressed as TDB seconds past J2000.
///
/// Deserializable directly from the manifest TOML file named by
/// `KernelConfig::manifest_path` / `wide_manifest_path`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BundleManifest {
    pub id: String,
    pub files: Vec<ManifestFile>,
    pub coverage_start_tdb_s: f64,
    pub coverage_end_tdb_s: f64,
}

/// A verified, loaded kernel bundle. Immutable once constructed.
#[derive(Debug)]
pub struct KernelBundle {
    pub id: String,
    pub coverage: (f64, f64),
    spk_kernels: Vec<SpkKernel>,
}

impl KernelBundle {
    /// Verify every manifest file's checksum, then load its SPK kernels.
    ///
    /// Fails `KERNELS.NOT_AVAILABLE`-equivalent on a missing file,
    /// `KERNELS.CORRUPTION`-equivalent on a checksum mismatch (see
    /// `ephemeris-api`'s error mapper for how these are surfaced at the
    /// HTTP boundary).
    pub fn open(manifest: &BundleManifest) -> Result<Self, KernelError> {
        let mut spk_kernels = Vec::with_capacity(manifest.files.len());
        for file in &manifest.files {
            let bytes = std::fs::read(&file.path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    KernelError::NotFound { path: file.path.display().to_string() }
                } else {
                    KernelError::Io(e.to_string())
                }
            })?;
            verify_checksum(&file.path, &bytes, &file.sha256_hex)?;
            spk_kernels.push(SpkKernel::parse(bytes)?);
        }
        Ok(Self {
            id: manifest.id.clone(),
            coverage: (manifest.coverage_start_tdb_s, manifest.coverage_end_tdb_s),
            spk_kernels,
        })
    }

    /// Whether this bundle's declared coverage includes `epoch_tdb_s`.
    pub fn covers(&self, epoch_tdb_s: f64) -> bool {
        epoch_tdb_s >= self.coverage.0 && epoch_tdb_s <= self.coverage.1
    }

    /// The verified kernels, in manifest order.
    pub fn spk_kernels(&self) -> &[SpkKernel] {
        &self.spk_kernels
    }
}

fn verify_checksum(path: &std::path::Path, bytes: &[u8], expected_hex: &str) -> Result<(), KernelError> {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let actual = hex::encode(hasher.finalize());
    if !actual.eq_ignore_ascii_case(expected_hex) {
        return Err(KernelError::ChecksumMismatch {
            path: path.display().to_string(),
            expected: expected_hex.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_is_rejected() {
        let err = verify_checksum(std::path::Path::new("x.bsp"), b"hello", "deadbeef").unwrap_err();
        assert!(matches!(err, KernelError::ChecksumMismatch { .. }));
    }

    #[test]
    fn checksum_match_is_case_insensitive() {
        let mut hasher = Sha256::new();
        hasher.update(b"hello");
        let hex_lower = hex::encode(hasher.finalize());
        let hex_upper = hex_lower.to_uppercase();
        assert!(verify_checksum(std::path::Path::new("x.bsp"), b"hello", &hex_upper).is_ok());
    }
}
