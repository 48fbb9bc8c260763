//! Checking engine: concurrent per-account cycles, per-domain lookups with
//! retry, stale-domain eviction and a merged snapshot for scrapes.

mod engine;
pub mod retry;

pub use engine::{Checker, ExhaustedPolicy, CHECK_INTERVAL};
pub use retry::RetryPolicy;
