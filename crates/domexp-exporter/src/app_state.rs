//! Shared application state for the exporter's HTTP handlers.

use std::sync::Arc;

use domexp_core::Snapshot;

use crate::checker::Checker;
use crate::obs::metrics::CheckerMetrics;

#[derive(Clone)]
pub struct AppState {
    checker: Arc<Checker>,
}

impl AppState {
    pub fn new(checker: Arc<Checker>) -> Self {
        Self { checker }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.checker.snapshot()
    }

    pub fn metrics(&self) -> Arc<CheckerMetrics> {
        self.checker.metrics()
    }

    pub fn is_ready(&self) -> bool {
        self.checker.is_ready()
    }
}
