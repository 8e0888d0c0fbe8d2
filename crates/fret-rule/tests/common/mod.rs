// Shared chart builders and input scripts for engine integration tests

#![allow(dead_code)]

use fret_model::{
    FiveFretGuitarFret, GuitarNote, GuitarNoteType, InstrumentDifficulty, NoteTrack, Phrase,
    PhraseType, SyncTrack,
};
use fret_rule::{FiveFretEngine, GameInput, GuitarAction, GuitarEngineParameters};

pub const RESOLUTION: u32 = 480;
pub const BPM: f64 = 120.0;
/// Ticks between consecutive chart notes (half a second at 120 BPM)
pub const NOTE_SPACING_TICKS: u32 = 480;
/// Tick of the first chart note (one second in)
pub const FIRST_NOTE_TICK: u32 = 960;

pub fn sync_track() -> SyncTrack {
    SyncTrack::constant(RESOLUTION, BPM).unwrap()
}

pub fn tick_of(index: usize) -> u32 {
    FIRST_NOTE_TICK + NOTE_SPACING_TICKS * index as u32
}

/// Note `index` of a chart built by [`ChartBuilder`].
pub fn time_of(index: usize) -> f64 {
    sync_track().tick_to_time(tick_of(index))
}

/// Evenly spaced chart, one chord per half second starting at one second.
#[derive(Default)]
pub struct ChartBuilder {
    chords: Vec<(Vec<FiveFretGuitarFret>, GuitarNoteType)>,
    phrases: Vec<Phrase>,
    /// (chord index, length in ticks, disjoint)
    sustains: Vec<(usize, u32, bool)>,
}

impl ChartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(mut self, fret: FiveFretGuitarFret, kind: GuitarNoteType) -> Self {
        self.chords.push((vec![fret], kind));
        self
    }

    pub fn chord(mut self, frets: &[FiveFretGuitarFret], kind: GuitarNoteType) -> Self {
        self.chords.push((frets.to_vec(), kind));
        self
    }

    /// Strummed single notes cycling green to orange.
    pub fn strums(mut self, count: usize) -> Self {
        for i in 0..count {
            let fret = FiveFretGuitarFret::ALL[1 + i % 5];
            self.chords.push((vec![fret], GuitarNoteType::Strum));
        }
        self
    }

    /// Phrase covering notes `first..=last`.
    pub fn phrase(mut self, kind: PhraseType, first: usize, last: usize) -> Self {
        let tick = tick_of(first);
        let tick_length = NOTE_SPACING_TICKS * (last - first + 1) as u32;
        let sync = sync_track();
        let time = sync.tick_to_time(tick);
        let time_length = sync.tick_to_time(tick + tick_length) - time;
        self.phrases
            .push(Phrase::new(kind, tick, tick_length, time, time_length));
        self
    }

    /// Sustain chord `index` for `ticks`.
    pub fn sustain(mut self, index: usize, ticks: u32, disjoint: bool) -> Self {
        self.sustains.push((index, ticks, disjoint));
        self
    }

    pub fn build(self) -> InstrumentDifficulty<GuitarNote> {
        let mut notes = NoteTrack::new();
        let mut ids = Vec::new();
        for (i, (frets, kind)) in self.chords.iter().enumerate() {
            let id = notes
                .push_guitar_chord(frets, *kind, tick_of(i), time_of(i))
                .unwrap();
            ids.push(id);
        }
        let sync = sync_track();
        for &(index, ticks, disjoint) in &self.sustains {
            let time_length = sync.tick_to_time(tick_of(index) + ticks) - time_of(index);
            notes
                .set_guitar_sustain(ids[index], ticks, time_length, disjoint)
                .unwrap();
        }
        let mut chart = InstrumentDifficulty::new(notes, self.phrases);
        chart.apply_phrase_flags();
        chart
    }

    pub fn engine(self) -> FiveFretEngine {
        self.engine_with(GuitarEngineParameters::default())
    }

    pub fn engine_with(self, params: GuitarEngineParameters) -> FiveFretEngine {
        FiveFretEngine::new_five_fret(self.build(), sync_track(), params, false)
    }

    pub fn bot(self) -> FiveFretEngine {
        FiveFretEngine::new_five_fret(
            self.build(),
            sync_track(),
            GuitarEngineParameters::default(),
            true,
        )
    }
}

/// Input script for a human player, kept in time order by construction.
#[derive(Default)]
pub struct Player {
    inputs: Vec<GameInput<GuitarAction>>,
    held: Vec<GuitarAction>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, time: f64, fret: GuitarAction) -> &mut Self {
        self.inputs.push(GameInput::button(time, fret, true));
        self.held.push(fret);
        self
    }

    pub fn release(&mut self, time: f64, fret: GuitarAction) -> &mut Self {
        self.inputs.push(GameInput::button(time, fret, false));
        self.held.retain(|&f| f != fret);
        self
    }

    /// Release everything held, then hold exactly `frets`.
    pub fn fret(&mut self, time: f64, frets: &[GuitarAction]) -> &mut Self {
        for held in std::mem::take(&mut self.held) {
            if !frets.contains(&held) {
                self.inputs.push(GameInput::button(time, held, false));
            } else {
                self.held.push(held);
            }
        }
        for &fret in frets {
            if !self.held.contains(&fret) {
                self.press(time, fret);
            }
        }
        self
    }

    pub fn strum(&mut self, time: f64) -> &mut Self {
        self.inputs
            .push(GameInput::button(time, GuitarAction::StrumDown, true));
        self.inputs
            .push(GameInput::button(time, GuitarAction::StrumDown, false));
        self
    }

    pub fn star_power(&mut self, time: f64) -> &mut Self {
        self.inputs
            .push(GameInput::button(time, GuitarAction::StarPower, true));
        self.inputs
            .push(GameInput::button(time, GuitarAction::StarPower, false));
        self
    }

    pub fn whammy(&mut self, time: f64) -> &mut Self {
        self.inputs
            .push(GameInput::integer(time, GuitarAction::Whammy, 80));
        self
    }

    /// Fret note `index` 0.2s early and strum it on time.
    pub fn strum_note(&mut self, index: usize, frets: &[GuitarAction]) -> &mut Self {
        let time = time_of(index);
        self.fret(time - 0.2, frets).strum(time)
    }

    pub fn inputs(&self) -> &[GameInput<GuitarAction>] {
        &self.inputs
    }
}

/// Fret action for the cycling single notes built by [`ChartBuilder::strums`].
pub fn cycling_fret(index: usize) -> GuitarAction {
    GuitarAction::from_fret_index(index % 5).unwrap()
}

/// Queue every input and advance the engine to `time`.
pub fn play(engine: &mut FiveFretEngine, inputs: &[GameInput<GuitarAction>], time: f64) {
    for &input in inputs {
        engine.queue_input(input);
    }
    engine.update(time);
}
