//! Failures across the time crate: kernel/table parsing, coverage, and
//! civil-time resolution. The HTTP edge maps these onto its public
//! taxonomy; nothing here is user-facing as-is.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TimeError {
    /// Leapseconds kernel text did not parse.
    LskParse(String),
    /// IERS finals file did not parse.
    EopParse(String),
    /// Epoch falls outside the loaded EOP table; callers fall back to
    /// the mean-rotation model.
    EopOutOfRange,
    /// UTC readings before the modern leap-second era.
    Pre1972Utc,
    /// No accepted civil-datetime format matched the input.
    CivilDatetimeUnparseable(String),
    /// Coordinate→zone lookup or historical DST resolution failed.
    ZoneResolutionFailed(String),
    /// Historical patch-table TOML did not parse.
    PatchParse(String),
    /// Underlying file I/O failed.
    Io(String),
}

impl Display for TimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LskParse(detail) => write!(f, "leapseconds kernel: {detail}"),
            Self::EopParse(detail) => write!(f, "EOP table: {detail}"),
            Self::EopOutOfRange => write!(f, "epoch outside the EOP table window"),
            Self::Pre1972Utc => write!(f, "UTC before 1972-01-01 is not supported"),
            Self::CivilDatetimeUnparseable(input) => {
                write!(f, "no accepted format matched civil datetime '{input}'")
            }
            Self::ZoneResolutionFailed(detail) => write!(f, "zone resolution: {detail}"),
            Self::PatchParse(detail) => write!(f, "historical patch table: {detail}"),
            Self::Io(detail) => write!(f, "io: {detail}"),
        }
    }
}

impl Error for TimeError {}

impl From<std::io::Error> for TimeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
