//! Distributed counter interface for shared bucket state across
//! instances, mirroring the cache crate's L2 backing pattern.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;

use crate::bucket::BucketState;
use crate::error::RateLimitError;

/// A `{key -> {tokens, last_refill_ns}}` store shared by every instance
/// enforcing the same rule. The concrete backing (e.g. Redis) lives
/// outside this crate; only this interface is named here.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<BucketState>, RateLimitError>;
    async fn set(&self, key: &str, state: BucketState) -> Result<(), RateLimitError>;
    /// Whether the backing is currently reachable, for `/healthz`.
    async fn is_reachable(&self) -> bool;
}

/// Redis-backed bucket store. State is serialized as `tokens:last_refill_ns`
/// under the bucket key with a one hour expiry (an idle bucket re-provisions
/// as full anyway). The read-modify-write is not atomic across instances;
/// under contention the limit can admit a few extra requests, which the
/// fail-open posture already tolerates.
pub struct RedisStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(|e| RateLimitError::BackingUnavailable(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| RateLimitError::BackingUnavailable(e.to_string()))?;
        Ok(Self { manager })
    }

    fn encode(state: BucketState) -> String {
        format!("{}:{}", state.tokens, state.last_refill_ns)
    }

    fn decode(raw: &str) -> Option<BucketState> {
        let (tokens, last_refill) = raw.split_once(':')?;
        Some(BucketState { tokens: tokens.parse().ok()?, last_refill_ns: last_refill.parse().ok()? })
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<BucketState>, RateLimitError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| RateLimitError::BackingUnavailable(e.to_string()))?;
        Ok(raw.as_deref().and_then(Self::decode))
    }

    async fn set(&self, key: &str, state: BucketState) -> Result<(), RateLimitError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, Self::encode(state), 3600)
            .await
            .map_err(|e| RateLimitError::BackingUnavailable(e.to_string()))
    }

    async fn is_reachable(&self) -> bool {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<String>>("ratelimit:reachability-probe").await.is_ok()
    }
}

/// In-process fallback used when no distributed backing is configured;
/// documented in the data model as "local-only mode", limits apply
/// per-instance rather than cluster-wide.
#[derive(Default)]
pub struct LocalStore {
    buckets: DashMap<String, BucketState>,
}

#[async_trait]
impl RateLimitStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<BucketState>, RateLimitError> {
        Ok(self.buckets.get(key).map(|entry| *entry.value()))
    }

    async fn set(&self, key: &str, state: BucketState) -> Result<(), RateLimitError> {
        self.buckets.insert(key.to_string(), state);
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_state_encoding_round_trips() {
        let state = BucketState { tokens: 7.25, last_refill_ns: 123_456_789 };
        let decoded = RedisStore::decode(&RedisStore::encode(state)).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn malformed_redis_state_is_none() {
        assert!(RedisStore::decode("garbage").is_none());
        assert!(RedisStore::decode("1.0:not-a-number").is_none());
    }

    #[tokio::test]
    async fn local_store_round_trips_a_bucket() {
        let store = LocalStore::default();
        assert!(store.get("k").await.unwrap().is_none());
        let state = BucketState::full(10.0, 0);
        store.set("k", state).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(state));
        assert!(store.is_reachable().await);
    }
}
