use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Tempo used when a chart has no tempo marker at tick 0.
pub const DEFAULT_BPM: f64 = 120.0;

/// Tempo change at a tick position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u32,
    pub bpm: f64,
    /// Time in seconds, derived from the preceding tempo changes
    pub time: f64,
}

/// Tick/time conversion for a chart.
///
/// Piecewise linear over the tempo map; `resolution` is ticks per quarter-note beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTrack {
    resolution: u32,
    tempos: Vec<TempoChange>,
}

impl SyncTrack {
    /// Build a sync track from `(tick, bpm)` markers in tick order.
    pub fn new(resolution: u32, markers: &[(u32, f64)]) -> Result<Self> {
        if resolution == 0 {
            bail!("sync track resolution must be positive");
        }

        let mut tempos: Vec<TempoChange> = Vec::with_capacity(markers.len() + 1);
        if markers.first().is_none_or(|&(tick, _)| tick != 0) {
            tempos.push(TempoChange {
                tick: 0,
                bpm: DEFAULT_BPM,
                time: 0.0,
            });
        }

        for &(tick, bpm) in markers {
            if !(bpm > 0.0 && bpm.is_finite()) {
                bail!("invalid tempo {bpm} at tick {tick}");
            }
            let time = match tempos.last() {
                Some(prev) if tick < prev.tick => {
                    bail!("tempo change at tick {tick} is before tick {}", prev.tick)
                }
                Some(prev) if tick == prev.tick && tick != 0 => {
                    bail!("duplicate tempo change at tick {tick}")
                }
                Some(prev) => prev.time + ticks_to_seconds(tick - prev.tick, prev.bpm, resolution),
                None => 0.0,
            };
            if tick == 0 {
                tempos.clear();
            }
            tempos.push(TempoChange { tick, bpm, time });
        }

        Ok(Self { resolution, tempos })
    }

    /// Constant-tempo track.
    pub fn constant(resolution: u32, bpm: f64) -> Result<Self> {
        Self::new(resolution, &[(0, bpm)])
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn tempos(&self) -> &[TempoChange] {
        &self.tempos
    }

    pub fn tick_to_time(&self, tick: u32) -> f64 {
        let index = self.tempos.partition_point(|t| t.tick <= tick).saturating_sub(1);
        let tempo = &self.tempos[index];
        tempo.time + ticks_to_seconds(tick - tempo.tick, tempo.bpm, self.resolution)
    }

    /// Tick at `time`, rounded down. Times before the chart start map to tick 0.
    pub fn time_to_tick(&self, time: f64) -> u32 {
        if time <= 0.0 {
            return 0;
        }
        let index = self.tempos.partition_point(|t| t.time <= time).saturating_sub(1);
        let tempo = &self.tempos[index];
        let beats = (time - tempo.time) * tempo.bpm / 60.0;
        let ticks = (beats * self.resolution as f64).floor();
        tempo.tick.saturating_add(ticks.min(u32::MAX as f64) as u32)
    }
}

fn ticks_to_seconds(ticks: u32, bpm: f64, resolution: u32) -> f64 {
    ticks as f64 / resolution as f64 * 60.0 / bpm
}
