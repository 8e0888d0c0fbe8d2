use serde::{Deserialize, Serialize};

/// Hit ratio below which a solo awards nothing.
pub const SOLO_MIN_HIT_RATIO: f64 = 0.6;

/// Points per solo note at a perfect hit ratio.
pub const SOLO_POINTS_PER_NOTE: f64 = 100.0;

/// Bonuses are rounded down to a multiple of this.
pub const SOLO_BONUS_ROUNDING: i32 = 50;

/// Summary of one solo span, built once when the engine is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoloSection {
    pub note_count: u32,
    pub notes_hit: u32,
    /// Awarded when the span closes
    pub solo_bonus: i32,
}

impl SoloSection {
    pub fn new(note_count: u32) -> Self {
        Self {
            note_count,
            notes_hit: 0,
            solo_bonus: 0,
        }
    }

    pub fn hit_ratio(&self) -> f64 {
        if self.note_count == 0 {
            return 0.0;
        }
        self.notes_hit as f64 / self.note_count as f64
    }

    pub fn reset(&mut self) {
        self.notes_hit = 0;
        self.solo_bonus = 0;
    }
}

/// Bonus for `notes_hit` of `note_count` solo notes.
///
/// Nothing below a 60% hit ratio; from there the per-note value scales linearly up to
/// 100 points at 100%, and the total is floored to a multiple of 50.
pub fn calculate_solo_bonus(notes_hit: u32, note_count: u32) -> i32 {
    if note_count == 0 {
        return 0;
    }
    let ratio = notes_hit as f64 / note_count as f64;
    if ratio < SOLO_MIN_HIT_RATIO {
        return 0;
    }

    let scale = ((ratio - SOLO_MIN_HIT_RATIO) / (1.0 - SOLO_MIN_HIT_RATIO)).clamp(0.0, 1.0);
    let points = (SOLO_POINTS_PER_NOTE * notes_hit as f64 * scale) as i32;
    points - points % SOLO_BONUS_ROUNDING
}
