//! Token bucket math: pure functions over an explicit state, so the
//! refill logic is identical whether state lives in-process or in a
//! distributed store.

use std::time::Duration;

/// Persisted bucket state for one rate-limit key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketState {
    pub tokens: f64,
    pub last_refill_ns: u64,
}

impl BucketState {
    /// A freshly-provisioned bucket, full at `capacity`.
    pub fn full(capacity: f64, now_ns: u64) -> Self {
        Self { tokens: capacity, last_refill_ns: now_ns }
    }
}

/// Outcome of a single token-bucket decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    pub retry_after: Duration,
    pub state: BucketState,
}

/// Refill `state` linearly at `capacity / period` up to `now_ns`, then
/// attempt to take one token. `capacity` and `period` together define the
/// rule (e.g. 10 requests / 60s).
pub fn take_token(state: BucketState, capacity: f64, period: Duration, now_ns: u64) -> Decision {
    let elapsed_ns = now_ns.saturating_sub(state.last_refill_ns) as f64;
    let rate_per_ns = capacity / period.as_nanos().max(1) as f64;
    let refilled = (state.tokens + elapsed_ns * rate_per_ns).min(capacity);

    if refilled >= 1.0 {
        let remaining = refilled - 1.0;
        Decision {
            allowed: true,
            retry_after: Duration::ZERO,
            state: BucketState { tokens: remaining, last_refill_ns: now_ns },
        }
    } else {
        let deficit = 1.0 - refilled;
        let wait_ns = (deficit / rate_per_ns).max(0.0);
        Decision {
            allowed: false,
            retry_after: Duration::from_nanos(wait_ns as u64),
            state: BucketState { tokens: refilled, last_refill_ns: now_ns },
        }
    }
}
