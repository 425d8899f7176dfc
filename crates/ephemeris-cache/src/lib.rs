//! Two-level response cache: request fingerprinting/ETag hashing, an
//! in-process LRU (L1), an optional distributed backing (L2), and
//! single-flight coalescing of concurrent identical requests.

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod l1;
pub mod l2;
pub mod singleflight;

pub use cache::{Cache, CacheHealth, CacheHit, CacheOutcome};
pub use error::CacheError;
pub use fingerprint::Fingerprint;
pub use l1::L1Cache;
pub use l2::{L2Cache, NullL2Cache, RedisL2Cache};
pub use singleflight::{SharedSingleFlight, SingleFlight};
