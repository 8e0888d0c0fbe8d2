use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::engine_parameters::BaseEngineParameters;
use crate::hit_window::HitWindowSettings;

/// Five-fret guitar engine parameters. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuitarEngineParameters {
    pub base: BaseEngineParameters,
    /// How long a strum waits for a matching note before it counts as an overstrum
    pub strum_leniency: f64,
    /// Strum leniency used when no note is in its window at strum time
    pub strum_leniency_small: f64,
    /// Window after a hopo/tap hit in which a strum is ignored
    pub hopo_leniency: f64,
    /// Ghosted fret presses block the note they ghosted
    pub anti_ghosting: bool,
    /// Hopos and taps accept fret presses made any time before their window
    pub infinite_front_end: bool,
    /// How long one whammy input keeps star power sustains charging the meter
    pub whammy_timer_threshold: f64,
}

impl Default for GuitarEngineParameters {
    fn default() -> Self {
        Self::five_fret()
    }
}

impl GuitarEngineParameters {
    /// Standard five-fret preset.
    pub fn five_fret() -> Self {
        Self {
            base: BaseEngineParameters::default(),
            strum_leniency: 0.05,
            strum_leniency_small: 0.025,
            hopo_leniency: 0.08,
            anti_ghosting: true,
            infinite_front_end: false,
            whammy_timer_threshold: 0.1,
        }
    }

    /// Preset with a density-dependent window and infinite front end.
    pub fn casual() -> Self {
        Self {
            base: BaseEngineParameters {
                hit_window: HitWindowSettings::dynamic(0.1, 0.18, 1.0, 0.7),
                ..BaseEngineParameters::default()
            },
            anti_ghosting: false,
            infinite_front_end: true,
            ..Self::five_fret()
        }
    }

    pub fn hit_window(&self) -> &HitWindowSettings {
        &self.base.hit_window
    }

    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        for (name, value) in [
            ("strum_leniency", self.strum_leniency),
            ("strum_leniency_small", self.strum_leniency_small),
            ("hopo_leniency", self.hopo_leniency),
            ("whammy_timer_threshold", self.whammy_timer_threshold),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                bail!("{name} must be a positive duration, got {value}");
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self =
            serde_json::from_str(json).context("parsing guitar engine parameters")?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading guitar engine parameters from {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
