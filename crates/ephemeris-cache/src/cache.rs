//! Top-level two-level cache: fingerprint → L1 → L2 → single-flight →
//! compute, per the lookup flow in the data model.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::CacheError;
use crate::fingerprint::Fingerprint;
use crate::l1::L1Cache;
use crate::l2::{L2Cache, NullL2Cache};
use crate::singleflight::SingleFlight;

/// Where a served value came from, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHit {
    L1,
    L2,
    Computed,
}

#[derive(Debug, Clone)]
pub struct CacheOutcome<T> {
    pub value: T,
    pub etag: String,
    pub hit: CacheHit,
}

/// Aggregate snapshot for `/healthz`.
#[derive(Debug, Clone, Copy)]
pub struct CacheHealth {
    pub l1_len: usize,
    pub l2_reachable: bool,
}

/// Composes the L1 LRU, an optional L2 distributed backing, and
/// single-flight coalescing into one lookup path. Values must round-trip
/// through JSON so they can cross the L2 byte boundary.
pub struct Cache<T: Clone + Send + 'static> {
    l1: Mutex<L1Cache<T>>,
    l2: Arc<dyn L2Cache>,
    single_flight: SingleFlight<T>,
    l2_ttl: Duration,
}

impl<T> Cache<T>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub fn new(l1_capacity: usize, l1_ttl: Duration, l2_ttl: Duration) -> Self {
        Self::with_l2(l1_capacity, l1_ttl, l2_ttl, Arc::new(NullL2Cache))
    }

    pub fn with_l2(l1_capacity: usize, l1_ttl: Duration, l2_ttl: Duration, l2: Arc<dyn L2Cache>) -> Self {
        Self { l1: Mutex::new(L1Cache::new(l1_capacity, l1_ttl)), l2, single_flight: SingleFlight::new(), l2_ttl }
    }

    /// Short-circuit a conditional request against the fingerprint's own
    /// ETag, without touching any cache tier.
    pub fn if_none_match(fingerprint: &Fingerprint, client_etag: &str) -> bool {
        fingerprint.etag() == client_etag.trim_matches('"')
    }

    /// Full lookup flow: L1, then L2 (promoting into L1 on hit), then
    /// single-flight-coalesced computation. On error, nothing is cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        compute: F,
    ) -> Result<CacheOutcome<T>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let key = fingerprint.etag();

        if let Some(value) = self.l1.lock().await.get(&key) {
            return Ok(CacheOutcome { value, etag: key, hit: CacheHit::L1 });
        }

        if let Some(bytes) = self.l2.get(&key).await {
            if let Ok(value) = serde_json::from_slice::<T>(&bytes) {
                self.l1.lock().await.put(key.clone(), value.clone());
                return Ok(CacheOutcome { value, etag: key, hit: CacheHit::L2 });
            }
        }

        let result = self.single_flight.run(&key, compute).await;
        match result {
            Ok(value) => {
                self.l1.lock().await.put(key.clone(), value.clone());
                if let Ok(bytes) = serde_json::to_vec(&value) {
                    self.l2.set(&key, bytes, self.l2_ttl).await;
                }
                Ok(CacheOutcome { value, etag: key, hit: CacheHit::Computed })
            }
            Err(msg) => Err(CacheError::ComputeFailed(msg)),
        }
    }

    pub async fn health(&self) -> CacheHealth {
        CacheHealth { l1_len: self.l1.lock().await.len(), l2_reachable: self.l2.is_reachable().await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fp(n: i64) -> Fingerprint {
        Fingerprint {
            epoch_unix_s: n,
            bodies: vec!["Sun".to_string()],
            system: "tropical".to_string(),
            ayanamsha_id: None,
            frame_type: "ecliptic_of_date".to_string(),
            epoch_of: "of_date".to_string(),
            observer_kind: "geocentric".to_string(),
            observer_lat_e6: 0,
            observer_lon_e6: 0,
            observer_elev_e6: 0,
            bundle_id: "DE440".to_string(),
            ephemeris_policy: "auto".to_string(),
        }
    }

    #[tokio::test]
    async fn miss_then_hit_from_l1() {
        let cache: Cache<i32> = Cache::new(8, Duration::from_secs(60), Duration::from_secs(60));
        let f = fp(1);

        let first = cache.get_or_compute(&f, || async { Ok::<i32, String>(7) }).await.unwrap();
        assert_eq!(first.hit, CacheHit::Computed);
        assert_eq!(first.value, 7);

        let second = cache.get_or_compute(&f, || async { panic!("should not recompute") }).await.unwrap();
        assert_eq!(second.hit, CacheHit::L1);
        assert_eq!(second.value, 7);
    }

    #[tokio::test]
    async fn compute_error_is_not_cached() {
        let cache: Cache<i32> = Cache::new(8, Duration::from_secs(60), Duration::from_secs(60));
        let f = fp(2);
        let calls = Arc::new(AtomicU32::new(0));

        let c1 = Arc::clone(&calls);
        let err = cache
            .get_or_compute(&f, || async move {
                c1.fetch_add(1, Ordering::SeqCst);
                Err::<i32, String>("boom".to_string())
            })
            .await;
        assert!(err.is_err());

        let c2 = Arc::clone(&calls);
        let ok = cache
            .get_or_compute(&f, || async move {
                c2.fetch_add(1, Ordering::SeqCst);
                Ok::<i32, String>(9)
            })
            .await
            .unwrap();
        assert_eq!(ok.value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2, "a failed compute must not poison the cache");
    }

    #[test]
    fn if_none_match_compares_against_fingerprint_etag() {
        let f = fp(3);
        let etag = f.etag();
        assert!(Cache::<i32>::if_none_match(&f, &etag));
        assert!(Cache::<i32>::if_none_match(&f, &format!("\"{etag}\"")));
        assert!(!Cache::<i32>::if_none_match(&f, "deadbeef"));
    }
}
