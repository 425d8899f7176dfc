//! Request canonicalization and ETag hashing.
//!
//! A [`Fingerprint`] is the canonical tuple from the data model: epoch
//! rounded to the second, bodies sorted, system, ayanāṃśa id-or-null,
//! frame spec, observer rounded to 6 decimals, bundle id, ephemeris
//! policy. Its hex-encoded SHA-256 digest is used as both the cache key
//! and the response `ETag` — a pure function of the tuple, never of wall
//! time, so it is stable across restarts and instances.

use sha2::{Digest, Sha256};

/// Canonical cache/ETag key, per the data model's Request Fingerprint entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub epoch_unix_s: i64,
    pub bodies: Vec<String>,
    pub system: String,
    pub ayanamsha_id: Option<String>,
    pub frame_type: String,
    pub epoch_of: String,
    /// `"geocentric"` or `"topocentric"` — a geocentric request and a
    /// topocentric one at (0, 0, 0) are physically different observers.
    pub observer_kind: String,
    pub observer_lat_e6: i64,
    pub observer_lon_e6: i64,
    pub observer_elev_e6: i64,
    pub bundle_id: String,
    pub ephemeris_policy: String,
}

impl Fingerprint {
    /// Round a degree/meter value to 6 decimal places as used by `observer`.
    pub fn round_micro(value: f64) -> i64 {
        (value * 1_000_000.0).round() as i64
    }

    /// Stable, order-independent canonical string. Bodies are sorted so
    /// that `["Moon","Sun"]` and `["Sun","Moon"]` fingerprint identically.
    pub fn canonical_string(&self) -> String {
        let mut bodies = self.bodies.clone();
        bodies.sort();
        format!(
            "epoch={}|bodies={}|system={}|ayanamsha={}|frame={}|epoch_of={}|obs={}:{},{},{}|bundle={}|policy={}",
            self.epoch_unix_s,
            bodies.join(","),
            self.system,
            self.ayanamsha_id.as_deref().unwrap_or(""),
            self.frame_type,
            self.epoch_of,
            self.observer_kind,
            self.observer_lat_e6,
            self.observer_lon_e6,
            self.observer_elev_e6,
            self.bundle_id,
            self.ephemeris_policy,
        )
    }

    /// Hex-encoded SHA-256 of the canonical string. Used as both the
    /// single-flight/cache key and the `ETag` value.
    pub fn etag(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}
