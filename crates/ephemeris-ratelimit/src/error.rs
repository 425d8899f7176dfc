//! Rate-limiter error type. The limiter itself never surfaces these to
//! callers (it fails open); they exist for health reporting and logging.

use std::fmt;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RateLimitError {
    BackingUnavailable(String),
    DecisionTimedOut,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::BackingUnavailable(msg) => write!(f, "rate-limit backing unavailable: {msg}"),
            RateLimitError::DecisionTimedOut => write!(f, "rate-limit decision exceeded its time budget"),
        }
    }
}

impl std::error::Error for RateLimitError {}
