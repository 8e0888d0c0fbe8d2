use fret_model::NoteId;

/// Notification produced while the engine advances.
///
/// Events accumulate in order of occurrence and are drained by the caller after each
/// advancement call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    NoteHit { note_index: usize, note: NoteId },
    NoteMissed { note_index: usize, note: NoteId },
    StarPowerPhraseHit { note: NoteId },
    StarPowerPhraseMissed { note: NoteId },
    /// Index into the engine's solo sections
    SoloStart { section: usize },
    SoloEnd { section: usize },
    StarPowerStatus { active: bool },
    SustainStart { note: NoteId },
    /// `finished` is false when the sustain was let go early
    SustainEnd { note: NoteId, finished: bool },
    Overstrum { time: f64 },
    GhostInput { time: f64 },
}

impl EngineEvent {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::NoteHit { .. })
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Self::NoteMissed { .. })
    }
}
