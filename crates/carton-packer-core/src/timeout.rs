use std::time::{Duration, Instant};

use crate::error::{PackerError, Result};

/// Wall-clock budget for a single pack, consulted at iteration boundaries.
/// There is no mid-layer cancellation; the smallest interruptible unit is
/// one volume-packer run.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutChecker {
    budget: Duration,
    started: Instant,
}

impl TimeoutChecker {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            started: Instant::now(),
        }
    }

    /// Reset the clock, e.g. at the start of a fresh pack.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    pub fn check(&self) -> Result<()> {
        let spent = self.started.elapsed();
        if spent >= self.budget {
            return Err(PackerError::Timeout {
                spent,
                budget: self.budget,
            });
        }
        Ok(())
    }
}
