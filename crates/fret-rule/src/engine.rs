// Event-time scheduler: interleaves queued inputs with anchor updates

use std::collections::VecDeque;

use fret_model::{InstrumentDifficulty, NoteId, NoteTrack, SyncTrack};

use crate::engine_core::EngineCore;
use crate::engine_event::EngineEvent;
use crate::engine_parameters::BaseEngineParameters;
use crate::engine_state::BaseEngineState;
use crate::engine_stats::EngineStats;
use crate::game_input::GameInput;

/// Extra hit logic passes allowed at one timestamp beyond one per note.
const RERUN_SLACK: usize = 8;

/// Instrument-specific hit resolution plugged into [`Engine`].
pub trait HitLogic {
    /// Note payload of the instrument's chart
    type Note;
    /// Input action enum of the instrument
    type Action: Copy + std::fmt::Debug;
    type Stats: EngineStats;

    /// Unmultiplied score of a perfect run, sustains included, for star thresholds.
    fn calculate_base_score(notes: &NoteTrack<Self::Note>, sync_track: &SyncTrack) -> i32;

    /// Apply an input to instrument state. Hit resolution happens afterwards in
    /// [`HitLogic::update_hit_logic`].
    fn mutate_state_with_input(
        &mut self,
        core: &EngineCore<Self::Note, Self::Stats>,
        input: &GameInput<Self::Action>,
    );

    /// Resolve notes at `time`. Setting `core.rerun_hit_logic` requests another pass at the
    /// same time.
    fn update_hit_logic(&mut self, core: &mut EngineCore<Self::Note, Self::Stats>, time: f64);

    /// Whether the note `id` can be hit with the current input state.
    fn can_note_be_hit(
        &self,
        core: &EngineCore<Self::Note, Self::Stats>,
        id: NoteId,
    ) -> bool;

    /// Timer expiries strictly between `previous` and `next`.
    fn queue_timer_updates(&self, previous: f64, next: f64, anchors: &mut Vec<f64>);

    fn reset(&mut self, keep_buttons: bool);
}

/// Generic engine: scheduler plus shared core, parameterized by instrument hit logic.
#[derive(Debug, Clone)]
pub struct Engine<L: HitLogic> {
    core: EngineCore<L::Note, L::Stats>,
    logic: L,
    input_queue: VecDeque<GameInput<L::Action>>,
    /// Ascending, without duplicates
    scheduled_updates: Vec<f64>,
}

impl<L: HitLogic> Engine<L> {
    pub fn new(
        chart: InstrumentDifficulty<L::Note>,
        sync_track: SyncTrack,
        parameters: BaseEngineParameters,
        logic: L,
        chord_separate: bool,
        is_bot: bool,
    ) -> Self {
        let base_score = L::calculate_base_score(&chart.notes, &sync_track);
        Self {
            core: EngineCore::new(
                chart,
                sync_track,
                parameters,
                base_score,
                chord_separate,
                is_bot,
            ),
            logic,
            input_queue: VecDeque::new(),
            scheduled_updates: Vec::new(),
        }
    }

    pub fn core(&self) -> &EngineCore<L::Note, L::Stats> {
        &self.core
    }

    pub fn logic(&self) -> &L {
        &self.logic
    }

    pub fn stats(&self) -> &L::Stats {
        self.core.stats()
    }

    pub fn state(&self) -> &BaseEngineState {
        self.core.state()
    }

    pub fn notes(&self) -> &NoteTrack<L::Note> {
        self.core.notes()
    }

    pub fn base_score(&self) -> i32 {
        self.core.base_score()
    }

    pub fn is_input_queued(&self) -> bool {
        !self.input_queue.is_empty()
    }

    pub fn scheduled_updates(&self) -> &[f64] {
        &self.scheduled_updates
    }

    /// Front end and back end of the note at the cursor.
    pub fn calculate_hit_window(&self) -> (f64, f64) {
        self.core.calculate_hit_window()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.core.drain_events()
    }

    /// Queue an input for the next [`Engine::update`].
    ///
    /// Inputs older than the last queued input or the current time are moved forward to it.
    pub fn queue_input(&mut self, input: GameInput<L::Action>) {
        let mut input = input;
        let state = self.core.state();

        if input.time < state.last_queued_input_time {
            log::warn!(
                "moving out-of-order input {:?} from {} to last queued input time {}",
                input.action,
                input.time,
                state.last_queued_input_time
            );
            input = input.with_time(state.last_queued_input_time);
        }
        if input.time < state.current_time {
            log::warn!(
                "moving past input {:?} from {} to current time {}",
                input.action,
                input.time,
                state.current_time
            );
            input = input.with_time(state.current_time);
        }

        self.core.state.last_queued_input_time = input.time;
        self.input_queue.push_back(input);
    }

    /// Schedule a hit logic pass at `time`.
    pub fn queue_update_time(&mut self, time: f64) {
        let current = self.core.state().current_time;
        if time == current {
            return;
        }
        if time < current {
            contract_violation!("cannot queue update at {time}, current time is {current}");
            return;
        }

        if let Err(pos) = self
            .scheduled_updates
            .binary_search_by(|t| t.total_cmp(&time))
        {
            self.scheduled_updates.insert(pos, time);
        }
    }

    /// Advance to `time`: queued inputs up to `time` in order, anchors in between, then a
    /// final pass exactly at `time`.
    pub fn update(&mut self, time: f64) {
        let current = self.core.state().current_time;
        if time < current {
            contract_violation!("time cannot go backwards (current {current}, requested {time})");
            return;
        }

        while let Some(mut input) = self.input_queue.pop_front() {
            if input.time > time {
                log::warn!(
                    "input at {} is beyond update time {time}, keeping it queued",
                    input.time
                );
                self.input_queue.push_front(input);
                break;
            }
            let current = self.core.state().current_time;
            if input.time < current {
                contract_violation!("queued input at {} is before current time {current}", input.time);
                input = input.with_time(current);
            }

            self.run_queued_updates(input.time);
            log::trace!(
                "input {:?} ({}) at {}",
                input.action,
                input.button,
                input.time
            );
            self.logic.mutate_state_with_input(&self.core, &input);
            self.run_hit_logic(input.time);
        }

        self.run_queued_updates(time);
        self.run_hit_logic(time);
    }

    /// Reset, queue every input at or before `time`, and advance to `time`.
    ///
    /// Returns the number of inputs consumed from `inputs`.
    pub fn process_up_to_time(&mut self, time: f64, inputs: &[GameInput<L::Action>]) -> usize {
        self.reset(false);

        let mut consumed = 0;
        for &input in inputs {
            if input.time > time {
                break;
            }
            self.queue_input(input);
            consumed += 1;
        }

        self.update(time);
        consumed
    }

    pub fn reset(&mut self, keep_buttons: bool) {
        self.input_queue.clear();
        self.scheduled_updates.clear();
        self.core.reset();
        self.logic.reset(keep_buttons);
    }

    /// Run every anchor strictly before `target`.
    ///
    /// Anchors at or after `target` stay scheduled; one exactly at `target` is covered by the
    /// pass the caller runs there.
    fn run_queued_updates(&mut self, target: f64) {
        let mut anchors = Vec::new();
        self.core
            .queue_note_anchors(self.core.state().current_time, target, &mut anchors);
        for time in anchors.drain(..) {
            self.queue_update_time(time);
        }

        loop {
            // Timer anchors move with every pass, so they are regenerated each time
            let current = self.core.state().current_time;
            self.logic.queue_timer_updates(current, target, &mut anchors);
            self.core.queue_star_power_anchor(current, target, &mut anchors);
            self.core.queue_sustain_anchors(current, target, &mut anchors);
            for time in anchors.drain(..) {
                self.queue_update_time(time);
            }

            let Some(&next) = self.scheduled_updates.first() else {
                break;
            };
            if next > target {
                break;
            }
            self.scheduled_updates.remove(0);
            if next == target {
                break;
            }

            log::trace!("running scheduled update at {next}");
            self.run_hit_logic(next);
        }
    }

    fn run_hit_logic(&mut self, time: f64) {
        let limit = self.core.notes().note_count() + RERUN_SLACK;
        let mut passes = 0;
        loop {
            self.core.rerun_hit_logic = false;
            self.logic.update_hit_logic(&mut self.core, time);
            if !self.core.rerun_hit_logic {
                break;
            }

            passes += 1;
            if passes > limit {
                contract_violation!("hit logic did not settle at {time} after {passes} passes");
                self.core.rerun_hit_logic = false;
                break;
            }
        }
    }
}
