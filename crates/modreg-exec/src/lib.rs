//! Concurrency primitives shared by the resolution phases
//!
//! - [`FanOut`]: bounded worker pool over a fixed job list, used for CPU-bound
//!   work (per-root selection) and I/O-bound work (URL probes, commit lookups)
//! - [`RateLimiter`]: token bucket limiting the call rate to an upstream API,
//!   independent of how many workers are active
//! - [`RetryPolicy`]: linear backoff retry of a fallible async operation

pub mod error;
pub mod pool;
pub mod rate;
pub mod retry;

pub use error::{Error, Result};
pub use pool::{DEFAULT_MAX_WORKERS, FanOut};
pub use rate::RateLimiter;
pub use retry::{LinearBackoff, RetryPolicy, retry};
