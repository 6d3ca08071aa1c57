//! Wall-clock profiling of the KDAC phases

use serde::Serialize;
use std::time::{Duration, Instant};

/// Cumulative timer for one phase or section of code
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Timer {
    total: Duration,
    calls: u64,
}

impl Timer {
    /// Add one measured interval
    pub fn record(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.calls += 1;
    }

    /// Add the interval elapsed since `start`
    pub fn stop(&mut self, start: Instant) {
        self.record(start.elapsed());
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Mean duration per call, zero if never called
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total.div_f64(self.calls as f64)
        }
    }
}

/// One timer per KDAC phase
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct KdacProfiler {
    /// State initialization
    pub init: Timer,
    /// Whole fit calls
    pub fit: Timer,
    /// EMBED phases
    pub u: Timer,
    /// PROJECT phases
    pub w: Timer,
    /// Construction of the γ weight matrix
    pub gen_gamma: Timer,
    /// Gradient operator evaluations
    pub gen_grad: Timer,
    /// Objective evaluations during line search
    pub objective: Timer,
    /// Partition clustering
    pub kmeans: Timer,
}

impl KdacProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every timer
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
