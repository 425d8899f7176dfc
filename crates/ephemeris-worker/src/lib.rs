//! Process-isolated worker pool.
//!
//! Compute runs in isolated subprocesses with a bounded dispatch queue
//! and a per-slot state machine, rather than on a thread pool sharing one
//! in-process context. Ephemeris stacks that link a non-reentrant native
//! library need exactly this shape, and keeping the kernel context per
//! process also bounds the blast radius of a misbehaving job.

pub mod error;
pub mod ipc;
pub mod pool;
pub mod slot;
pub mod state;

pub use error::WorkerError;
pub use ipc::{read_request, read_response, write_ready, write_request, write_response, WireRequest, WireResponse};
pub use pool::{PoolConfig, PoolHealth, WorkerPool};
pub use slot::WorkerSlot;
pub use state::WorkerState;
