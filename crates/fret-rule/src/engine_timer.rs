use serde::{Deserialize, Serialize};

/// One-shot expiring timer.
///
/// Active from `start` until `start + threshold`; expired from then until disabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineTimer {
    /// Default duration used by [`EngineTimer::start`]
    threshold: f64,
    start_time: f64,
    end_time: f64,
    enabled: bool,
}

impl EngineTimer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start_time: f64::NEG_INFINITY,
            end_time: f64::NEG_INFINITY,
            enabled: false,
        }
    }

    pub fn start(&mut self, time: f64) {
        self.start_with_threshold(time, self.threshold);
    }

    /// Start with a one-off duration, keeping the default threshold.
    pub fn start_with_threshold(&mut self, time: f64, threshold: f64) {
        self.start_time = time;
        self.end_time = time + threshold;
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_active(&self, time: f64) -> bool {
        self.enabled && time < self.end_time
    }

    pub fn is_expired(&self, time: f64) -> bool {
        self.enabled && time >= self.end_time
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }
}
