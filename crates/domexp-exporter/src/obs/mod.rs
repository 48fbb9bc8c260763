//! Lightweight in-process metrics (no metrics crate).
//!
//! Per-domain results are translated from a checker snapshot on every scrape;
//! operational counters are stored as atomics and rendered by the `/metrics`
//! handler.

pub mod metrics;
