use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Hit window policy: note density to front-end/back-end timing tolerance.
///
/// All values are in seconds. The full window is split around the note time by
/// `front_to_back_ratio`: 1.0 is symmetric, smaller values shrink the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitWindowSettings {
    pub max_window: f64,
    pub min_window: f64,
    pub is_dynamic: bool,
    pub front_to_back_ratio: f64,
    /// Note distance (relative to `max_window`) at which the dynamic window reaches its maximum
    pub dynamic_scale: f64,
    /// Curve exponent of the dynamic window
    pub dynamic_gamma: f64,
}

impl Default for HitWindowSettings {
    fn default() -> Self {
        Self {
            max_window: 0.14,
            min_window: 0.14,
            is_dynamic: false,
            front_to_back_ratio: 1.0,
            dynamic_scale: 1.0,
            dynamic_gamma: 1.0,
        }
    }
}

impl HitWindowSettings {
    pub fn fixed(window: f64, front_to_back_ratio: f64) -> Self {
        Self {
            max_window: window,
            min_window: window,
            front_to_back_ratio,
            ..Self::default()
        }
    }

    pub fn dynamic(min_window: f64, max_window: f64, scale: f64, gamma: f64) -> Self {
        Self {
            max_window,
            min_window,
            is_dynamic: true,
            front_to_back_ratio: 1.0,
            dynamic_scale: scale,
            dynamic_gamma: gamma,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_window > 0.0 && self.min_window > 0.0) {
            bail!(
                "hit windows must be positive (min {}, max {})",
                self.min_window,
                self.max_window
            );
        }
        if self.min_window > self.max_window {
            bail!(
                "minimum hit window {} exceeds maximum {}",
                self.min_window,
                self.max_window
            );
        }
        if !(0.0..=2.0).contains(&self.front_to_back_ratio) {
            bail!(
                "front-to-back ratio {} outside [0, 2]",
                self.front_to_back_ratio
            );
        }
        if self.is_dynamic && !(self.dynamic_scale > 0.0 && self.dynamic_gamma > 0.0) {
            bail!("dynamic window scale and gamma must be positive");
        }
        Ok(())
    }

    /// Full window size for a note whose average neighbor distance is `average_distance`.
    pub fn calculate_hit_window(&self, average_distance: f64) -> f64 {
        if !self.is_dynamic {
            return self.max_window;
        }

        let t = (average_distance / (self.max_window * self.dynamic_scale)).clamp(0.0, 1.0);
        let size = self.min_window + (self.max_window - self.min_window) * t.powf(self.dynamic_gamma);
        size.clamp(self.min_window, self.max_window)
    }

    /// Early tolerance relative to the note time (zero or negative).
    pub fn front_end(&self, full_window: f64) -> f64 {
        -((full_window / 2.0).abs() * self.front_to_back_ratio)
    }

    /// Late tolerance relative to the note time (zero or positive).
    pub fn back_end(&self, full_window: f64) -> f64 {
        (full_window / 2.0).abs() * (2.0 - self.front_to_back_ratio)
    }
}
