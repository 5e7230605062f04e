//! Wall-clock budget for a whole scan.

use std::time::{Duration, Instant};

/// Once exhausted, no further probes start and the scan returns what it has.
#[derive(Debug, Clone, Copy)]
pub struct ScanBudget {
    started: Instant,
    limit: Option<Duration>,
}

impl ScanBudget {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed() >= limit)
    }
}

impl Default for ScanBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
