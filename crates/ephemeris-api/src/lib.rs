//! The HTTP edge: request validation, caching, rate limiting, and
//! dispatch to the worker subprocess pool, plus the worker-side compute
//! loop that runs behind that pool.

pub mod epoch;
pub mod error;
pub mod geocoder;
pub mod handlers;
pub mod kernel_select;
pub mod routes;
pub mod state;
pub mod types;
pub mod worker_job;

pub use error::{ApiError, ApiErrorCode, WireError};
pub use state::AppState;
