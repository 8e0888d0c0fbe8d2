// Sustain scoring: points accrue per tick while a hit note stays held

use fret_model::NoteId;

/// Sustain points per beat held, before the multiplier.
pub const POINTS_PER_BEAT: u32 = 25;

/// The final `1 / SUSTAIN_BURST_FRACTION` beat of a sustain is awarded early.
pub const SUSTAIN_BURST_FRACTION: u32 = 4;

/// Ticks of held sustain worth one point.
pub fn ticks_per_sustain_point(resolution: u32) -> f64 {
    resolution as f64 / POINTS_PER_BEAT as f64
}

/// Whole points in a sustain of `tick_length` ticks.
pub fn sustain_points(tick_length: u32, ticks_per_point: f64) -> u32 {
    (tick_length as f64 / ticks_per_point) as u32
}

/// A hit sustain still accruing points.
///
/// Points are recomputed from ticks on every pass, so the total never depends on how often
/// the engine is updated.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSustain {
    pub note: NoteId,
    pub start_tick: u32,
    pub end_tick: u32,
    /// Time at which the rest of the sustain is awarded at once
    pub burst_time: f64,
    /// Notes scored per point: the chord size, or 1 for one fret of a disjoint chord
    pub note_count: u32,
    pub points_awarded: u32,
}

impl ActiveSustain {
    /// Points earned from the start up to `tick`.
    pub fn points_at(&self, tick: u32, ticks_per_point: f64) -> u32 {
        let held = tick.min(self.end_tick).saturating_sub(self.start_tick);
        sustain_points(held, ticks_per_point)
    }

    pub fn total_points(&self, ticks_per_point: f64) -> u32 {
        self.points_at(self.end_tick, ticks_per_point)
    }
}
