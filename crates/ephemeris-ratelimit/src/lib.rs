//! Distributed token-bucket rate limiter: rule-driven key selection, a
//! pluggable counter backing, fail-open on backing failure or a timed-out
//! decision.

pub mod bucket;
pub mod error;
pub mod limiter;
pub mod rule;
pub mod store;

pub use bucket::{take_token, BucketState, Decision};
pub use error::RateLimitError;
pub use limiter::{LimiterDecision, RateLimiter, RateLimiterHealth};
pub use rule::{resolve_key, KeySource, Rule, RuleSet};
pub use store::{LocalStore, RateLimitStore, RedisStore};
