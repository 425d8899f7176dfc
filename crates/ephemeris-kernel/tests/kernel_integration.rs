//! Bundle verification and segment evaluation against a real DE kernel,
//! skipped when `kernels/data/de442s.bsp` is not checked out.

use std::path::{Path, PathBuf};

use ephemeris_kernel::{BundleManifest, KernelBundle, KernelError, ManifestFile, SpkKernel};
use sha2::{Digest, Sha256};

const AU_KM: f64 = 149_597_870.7;

fn kernel_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../kernels/data/de442s.bsp")
}

fn kernel() -> Option<SpkKernel> {
    let path = kernel_path();
    if !path.exists() {
        eprintln!("Skipping: {} not found", path.display());
        return None;
    }
    Some(SpkKernel::load(&path).expect("kernel loads"))
}

fn manifest_with_checksum(sha256_hex: String) -> BundleManifest {
    BundleManifest {
        id: "DE442S".to_string(),
        files: vec![ManifestFile { path: kernel_path(), sha256_hex }],
        coverage_start_tdb_s: -1.4e10,
        coverage_end_tdb_s: 2.0e10,
    }
}

#[test]
fn bundle_opens_when_the_checksum_matches() {
    if !kernel_path().exists() {
        eprintln!("Skipping: kernel not found");
        return;
    }
    let bytes = std::fs::read(kernel_path()).unwrap();
    let digest = hex::encode(Sha256::digest(&bytes));

    let bundle = KernelBundle::open(&manifest_with_checksum(digest)).expect("bundle opens");
    assert_eq!(bundle.id, "DE442S");
    assert!(bundle.covers(0.0));
    assert!(!bundle.covers(3.0e10));
    assert!(!bundle.spk_kernels().is_empty());
}

#[test]
fn bundle_rejects_a_wrong_checksum() {
    if !kernel_path().exists() {
        eprintln!("Skipping: kernel not found");
        return;
    }
    let err = KernelBundle::open(&manifest_with_checksum("ab".repeat(32))).unwrap_err();
    assert!(matches!(err, KernelError::ChecksumMismatch { .. }), "{err:?}");
}

#[test]
fn bundle_rejects_a_missing_file() {
    let manifest = BundleManifest {
        id: "GHOST".to_string(),
        files: vec![ManifestFile {
            path: PathBuf::from("/nonexistent/ghost.bsp"),
            sha256_hex: "00".repeat(32),
        }],
        coverage_start_tdb_s: 0.0,
        coverage_end_tdb_s: 1.0,
    };
    let err = KernelBundle::open(&manifest).unwrap_err();
    assert!(matches!(err, KernelError::NotFound { .. }), "{err:?}");
}

#[test]
fn every_wire_body_chains_to_the_barycenter() {
    let Some(kernel) = kernel() else { return };
    // All NAIF ids the service exposes (Mars..Pluto resolve through
    // their system barycenters when no body-center segment exists).
    for naif_id in [10, 199, 299, 399, 301, 499, 599, 699, 799, 899, 999] {
        let state = kernel
            .resolve_to_ssb(naif_id, 0.0)
            .unwrap_or_else(|e| panic!("body {naif_id}: {e}"));
        let r = (state[0].powi(2) + state[1].powi(2) + state[2].powi(2)).sqrt();
        assert!(r / AU_KM < 60.0, "body {naif_id} at {} au from SSB", r / AU_KM);
    }
}

#[test]
fn evaluation_is_continuous_in_time() {
    let Some(kernel) = kernel() else { return };
    // Stepping one minute must move Earth by roughly its EMB-relative
    // speed, never by a record-boundary jump.
    let a = kernel.evaluate(399, 3, 0.0).unwrap();
    let b = kernel.evaluate(399, 3, 60.0).unwrap();
    let moved = (0..3)
        .map(|i| (b.position_km[i] - a.position_km[i]).powi(2))
        .sum::<f64>()
        .sqrt();
    let speed = (0..3).map(|i| a.velocity_km_s[i].powi(2)).sum::<f64>().sqrt();
    assert!((moved - speed * 60.0).abs() < 1.0, "moved {moved} km at {speed} km/s");
}

#[test]
fn epochs_outside_segment_coverage_are_flagged() {
    let Some(kernel) = kernel() else { return };
    // ~300,000 years after J2000 is outside any DE product.
    let err = kernel.evaluate(399, 3, 1.0e13).unwrap_err();
    assert!(matches!(err, KernelError::EpochOutOfRange { .. }), "{err:?}");
}
