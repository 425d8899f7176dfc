//! Cache-layer error type.

use std::fmt;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CacheError {
    /// The computation registered with the cache failed; carries the
    /// computation's own error message. Never cached.
    ComputeFailed(String),
    /// The distributed L2 backing could not be opened. Lookups degrade to
    /// L1-only; this is surfaced only at startup and in health.
    Backing(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::ComputeFailed(msg) => write!(f, "compute failed: {msg}"),
            CacheError::Backing(msg) => write!(f, "cache backing unavailable: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}
