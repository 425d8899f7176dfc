//! Optional distributed second-level cache, consumed only through the
//! [`L2Cache`] interface. The one concrete backing shipped here is Redis;
//! anything else can slot in by implementing the trait.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::error::CacheError;

/// A distributed key-value store bound by TTL only (no count limit, unlike L1).
#[async_trait]
pub trait L2Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);
    /// Whether the backing store is currently reachable, for `/healthz`.
    async fn is_reachable(&self) -> bool;
}

/// Redis-backed L2, shared by every instance pointing at the same server.
/// All failures degrade to a miss; the cache layer never propagates a
/// backing error into a request.
pub struct RedisL2Cache {
    manager: redis::aio::ConnectionManager,
}

impl RedisL2Cache {
    /// Open a connection manager against `url` (e.g. `redis://host:6379`).
    /// The manager reconnects on its own after transient failures.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Backing(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Backing(e.to_string()))?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl L2Cache for RedisL2Cache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<Vec<u8>>>(key).await.ok().flatten()
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let mut conn = self.manager.clone();
        let _ = conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await;
    }

    async fn is_reachable(&self) -> bool {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<Vec<u8>>>("l2:reachability-probe").await.is_ok()
    }
}

/// An in-memory stand-in used when no distributed backing is configured;
/// every lookup misses and writes are discarded (L1 still serves).
#[derive(Default)]
pub struct NullL2Cache;

#[async_trait]
impl L2Cache for NullL2Cache {
    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) {}

    async fn is_reachable(&self) -> bool {
        true
    }
}
