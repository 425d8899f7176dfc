//! Errors surfaced by the worker pool.

use std::fmt;

/// Errors raised while dispatching to, or running, an isolated worker.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum WorkerError {
    /// All slots busy and the pending queue is full.
    Overloaded,
    /// The job exceeded its per-job timeout.
    Timeout,
    /// The worker reported a structured job error. The worker process
    /// itself is healthy and its slot stays eligible for dispatch.
    JobFailed(String),
    /// The worker process died or returned malformed output while running the job.
    ComputeFailed(String),
    /// A slot could not be (re)spawned.
    SpawnFailed(String),
    /// The pool is draining or shut down; no new jobs are accepted.
    ShuttingDown,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overloaded => write!(f, "worker pool overloaded: queue full"),
            Self::Timeout => write!(f, "job exceeded its timeout"),
            Self::JobFailed(msg) => write!(f, "job failed: {msg}"),
            Self::ComputeFailed(msg) => write!(f, "compute failed: {msg}"),
            Self::SpawnFailed(msg) => write!(f, "failed to spawn worker: {msg}"),
            Self::ShuttingDown => write!(f, "worker pool is shutting down"),
        }
    }
}

impl std::error::Error for WorkerError {}
