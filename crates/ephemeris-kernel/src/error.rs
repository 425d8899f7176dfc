//! Errors raised while loading or evaluating a kernel file.

use std::fmt::{Display, Formatter};

/// Errors from DAF/SPK parsing, checksum verification, and evaluation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum KernelError {
    Io(String),
    NotFound { path: String },
    ChecksumMismatch { path: String, expected: String, actual: String },
    BadFormat(String),
    UnsupportedDataType { data_type: i32 },
    SegmentNotFound { target: i32, center: i32 },
    EpochOutOfRange { target: i32, center: i32, epoch_tdb_s: f64 },
}

impl Display for KernelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "kernel I/O error: {msg}"),
            Self::NotFound { path } => write!(f, "kernel file not found: {path}"),
            Self::ChecksumMismatch { path, expected, actual } => write!(
                f,
                "checksum mismatch for {path}: expected {expected}, got {actual}"
            ),
            Self::BadFormat(msg) => write!(f, "malformed kernel file: {msg}"),
            Self::UnsupportedDataType { data_type } => {
                write!(f, "unsupported SPK segment data type: {data_type}")
            }
            Self::SegmentNotFound { target, center } => {
                write!(f, "no segment for target={target} center={center}")
            }
            Self::EpochOutOfRange { target, center, epoch_tdb_s } => write!(
                f,
                "epoch {epoch_tdb_s} out of coverage for target={target} center={center}"
            ),
        }
    }
}

impl std::error::Error for KernelError {}

impl From<std::io::Error> for KernelError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
