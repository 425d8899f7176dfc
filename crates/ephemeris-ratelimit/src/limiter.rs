//! Token-bucket rate limiter: rule-driven key selection, a pluggable
//! distributed backing, and fail-open semantics on backing failure or a
//! timed-out decision.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::bucket::{take_token, BucketState};
use crate::rule::{resolve_key, RuleSet};
use crate::store::{LocalStore, RateLimitStore};

/// Decisions slower than this are treated as fail-open, per the
/// non-blocking budget on the rate-limit decision path.
const DECISION_BUDGET: Duration = Duration::from_millis(5);

/// A 60 second window used to detect sustained backing failure for
/// health reporting.
const FAILURE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterDecision {
    pub allowed: bool,
    pub retry_after: Duration,
    /// True when this decision bypassed the bucket (backing unreachable
    /// or the decision timed out) and therefore let the request through
    /// regardless of bucket state.
    pub failed_open: bool,
}

impl LimiterDecision {
    fn allow_open() -> Self {
        Self { allowed: true, retry_after: Duration::ZERO, failed_open: true }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimiterHealth {
    pub reachable: bool,
    pub failures_last_minute: usize,
    pub degraded: bool,
}

pub struct RateLimiter {
    rules: RuleSet,
    store: Arc<dyn RateLimitStore>,
    failures: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(rules: RuleSet) -> Self {
        Self::with_store(rules, Arc::new(LocalStore::default()))
    }

    pub fn with_store(rules: RuleSet, store: Arc<dyn RateLimitStore>) -> Self {
        Self { rules, store, failures: Mutex::new(VecDeque::new()) }
    }

    /// Decide whether the request identified by `path`/`client_ip`
    /// (and an optional header value for header-keyed rules) is allowed.
    /// Requests matching no rule are always allowed.
    pub async fn check(&self, path: &str, client_ip: &str, header_value: Option<&str>) -> LimiterDecision {
        let Some(rule) = self.rules.select(path) else {
            return LimiterDecision { allowed: true, retry_after: Duration::ZERO, failed_open: false };
        };
        let key = resolve_key(rule, client_ip, header_value);

        let outcome = tokio::time::timeout(DECISION_BUDGET, self.decide(&key, rule.limit, rule.period)).await;

        match outcome {
            Ok(Some(decision)) => decision,
            Ok(None) => {
                self.record_failure().await;
                LimiterDecision::allow_open()
            }
            Err(_) => {
                self.record_failure().await;
                LimiterDecision::allow_open()
            }
        }
    }

    async fn decide(&self, key: &str, capacity: f64, period: Duration) -> Option<LimiterDecision> {
        let now_ns = now_ns();
        let current = match self.store.get(key).await {
            Ok(state) => state.unwrap_or_else(|| BucketState::full(capacity, now_ns)),
            Err(_) => return None,
        };

        let result = take_token(current, capacity, period, now_ns);
        if self.store.set(key, result.state).await.is_err() {
            return None;
        }

        Some(LimiterDecision { allowed: result.allowed, retry_after: result.retry_after, failed_open: false })
    }

    async fn record_failure(&self) {
        let mut failures = self.failures.lock().await;
        let now = Instant::now();
        failures.push_back(now);
        while let Some(front) = failures.front() {
            if now.duration_since(*front) > FAILURE_WINDOW {
                failures.pop_front();
            } else {
                break;
            }
        }
    }

    pub async fn health(&self) -> RateLimiterHealth {
        let reachable = self.store.is_reachable().await;
        let failures_last_minute = self.failures.lock().await.len();
        RateLimiterHealth { reachable, failures_last_minute, degraded: !reachable || failures_last_minute > 0 }
    }
}

fn now_ns() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{KeySource, Rule};

    fn limiter(limit: f64, period: Duration) -> RateLimiter {
        let rules = RuleSet::new(vec![Rule { path_prefix: None, key_source: KeySource::ClientIp, limit, period }]);
        RateLimiter::new(rules)
    }

    #[tokio::test]
    async fn allows_up_to_limit_then_denies() {
        let limiter = limiter(10.0, Duration::from_secs(60));
        let mut allowed = 0;
        let mut denied = 0;
        for _ in 0..15 {
            let d = limiter.check("/v1/positions", "1.2.3.4", None).await;
            if d.allowed {
                allowed += 1;
            } else {
                denied += 1;
                assert!(d.retry_after >= Duration::ZERO);
            }
        }
        assert_eq!(allowed, 10);
        assert_eq!(denied, 5);
    }

    #[tokio::test]
    async fn distinct_keys_have_independent_buckets() {
        let limiter = limiter(1.0, Duration::from_secs(60));
        assert!(limiter.check("/v1/positions", "1.1.1.1", None).await.allowed);
        assert!(limiter.check("/v1/positions", "2.2.2.2", None).await.allowed);
        assert!(!limiter.check("/v1/positions", "1.1.1.1", None).await.allowed);
    }

    #[tokio::test]
    async fn unmatched_path_is_always_allowed() {
        let rules = RuleSet::new(Vec::new());
        let limiter = RateLimiter::new(rules);
        for _ in 0..100 {
            assert!(limiter.check("/unrated", "1.1.1.1", None).await.allowed);
        }
    }

    struct AlwaysFailingStore;

    #[async_trait::async_trait]
    impl RateLimitStore for AlwaysFailingStore {
        async fn get(&self, _key: &str) -> Result<Option<BucketState>, crate::error::RateLimitError> {
            Err(crate::error::RateLimitError::BackingUnavailable("down".to_string()))
        }
        async fn set(&self, _key: &str, _state: BucketState) -> Result<(), crate::error::RateLimitError> {
            Err(crate::error::RateLimitError::BackingUnavailable("down".to_string()))
        }
        async fn is_reachable(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn fails_open_when_backing_is_unreachable() {
        let rules = RuleSet::new(vec![Rule {
            path_prefix: None,
            key_source: KeySource::ClientIp,
            limit: 1.0,
            period: Duration::from_secs(60),
        }]);
        let limiter = RateLimiter::with_store(rules, Arc::new(AlwaysFailingStore));
        let d = limiter.check("/v1/positions", "1.1.1.1", None).await;
        assert!(d.allowed);
        assert!(d.failed_open);

        let health = limiter.health().await;
        assert!(!health.reachable);
        assert!(health.degraded);
    }
}
