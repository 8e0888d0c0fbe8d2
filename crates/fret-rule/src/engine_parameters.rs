use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::hit_window::HitWindowSettings;

/// Star rank thresholds as multiples of the chart's base score.
pub const DEFAULT_STAR_MULTIPLIER_THRESHOLDS: [f64; 6] = [0.21, 0.46, 0.77, 1.85, 3.08, 4.29];

pub const DEFAULT_MAX_MULTIPLIER: u32 = 4;

/// Instrument-independent engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseEngineParameters {
    pub hit_window: HitWindowSettings,
    /// Ascending; one entry per star rank
    pub star_multiplier_thresholds: Vec<f64>,
    /// Highest combo multiplier before star power doubling
    pub max_multiplier: u32,
}

impl Default for BaseEngineParameters {
    fn default() -> Self {
        Self {
            hit_window: HitWindowSettings::default(),
            star_multiplier_thresholds: DEFAULT_STAR_MULTIPLIER_THRESHOLDS.to_vec(),
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
        }
    }
}

impl BaseEngineParameters {
    pub fn validate(&self) -> Result<()> {
        self.hit_window.validate()?;
        if self.max_multiplier == 0 {
            bail!("max multiplier must be at least 1");
        }
        if self
            .star_multiplier_thresholds
            .windows(2)
            .any(|pair| pair[0] > pair[1])
        {
            bail!(
                "star multiplier thresholds are not ascending: {:?}",
                self.star_multiplier_thresholds
            );
        }
        if self.star_multiplier_thresholds.iter().any(|t| *t < 0.0) {
            bail!("star multiplier thresholds must not be negative");
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json).context("parsing engine parameters")?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine parameters from {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
