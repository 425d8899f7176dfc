//! Error types for ayanāṃśa resolution.

use std::fmt;

/// Errors raised while resolving or validating an ayanāṃśa id.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AyanamshaError {
    /// No registry entry matches the given id.
    Unsupported { id: String },
    /// The seed/config data could not be parsed.
    ConfigParse(String),
}

impl fmt::Display for AyanamshaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { id } => write!(f, "unsupported ayanamsha id: {id}"),
            Self::ConfigParse(msg) => write!(f, "ayanamsha config parse error: {msg}"),
        }
    }
}

impl std::error::Error for AyanamshaError {}
