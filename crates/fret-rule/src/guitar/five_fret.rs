// Five-fret hit resolution: strums, hopos/taps, anchoring, ghosting, infinite front end,
// sustains and whammy

use fret_model::{GuitarNote, InstrumentDifficulty, NoteId, NoteTrack, SyncTrack};

use crate::engine::{Engine, HitLogic};
use crate::engine_core::{EngineCore, WindowPosition};
use crate::engine_event::EngineEvent;
use crate::game_input::{GameInput, GuitarAction};
use crate::sustain::{sustain_points, ticks_per_sustain_point};

use super::parameters::GuitarEngineParameters;
use super::state::GuitarEngineState;
use super::stats::GuitarStats;

/// Points per note of a chord, before the multiplier.
pub const POINTS_PER_NOTE: i32 = 50;

pub type FiveFretEngine = Engine<FiveFretLogic>;

type Core = EngineCore<GuitarNote, GuitarStats>;

impl FiveFretEngine {
    /// Five-fret engine; chords always score as one note.
    pub fn new_five_fret(
        chart: InstrumentDifficulty<GuitarNote>,
        sync_track: SyncTrack,
        params: GuitarEngineParameters,
        is_bot: bool,
    ) -> Self {
        let base = params.base.clone();
        Engine::new(
            chart,
            sync_track,
            base,
            FiveFretLogic::new(params),
            false,
            is_bot,
        )
    }

    pub fn guitar_state(&self) -> &GuitarEngineState {
        &self.logic().state
    }
}

/// Five-fret guitar hit logic.
#[derive(Debug, Clone)]
pub struct FiveFretLogic {
    params: GuitarEngineParameters,
    state: GuitarEngineState,
}

impl FiveFretLogic {
    pub fn new(params: GuitarEngineParameters) -> Self {
        let state = GuitarEngineState::new(&params);
        Self { params, state }
    }

    pub fn params(&self) -> &GuitarEngineParameters {
        &self.params
    }

    pub fn state(&self) -> &GuitarEngineState {
        &self.state
    }

    fn update_bot(&mut self, core: &mut Core) {
        core.update_sustains();
        if core.can_star_power_activate() {
            core.activate_star_power();
        }
        core.update_star_power();

        let Some(id) = core.note_at_cursor() else {
            return;
        };
        let note = &core.notes()[id];
        if core.state().current_time < note.time {
            return;
        }

        self.state.button_mask = note.data.note_mask;
        self.state.last_button_mask = self.state.button_mask;
        self.hit_note(core, id);
    }

    fn has_star_power_sustain(&self, core: &Core) -> bool {
        core.active_sustains()
            .iter()
            .any(|sustain| core.notes()[sustain.note].is_star_power())
    }

    /// Count ticks whammied on star power sustains since the previous pass.
    fn accumulate_whammy(&mut self, core: &Core) {
        let state = core.state();
        if !self.state.whammy_timer.is_active(state.last_update_time)
            || !self.has_star_power_sustain(core)
        {
            return;
        }
        self.state.whammy_ticks += state.current_tick.saturating_sub(state.last_tick);
    }

    /// End sustains whose frets are no longer held. Extra frets do not drop a sustain.
    fn drop_released_sustains(&mut self, core: &mut Core) {
        let held = self.state.button_mask;
        let released: Vec<NoteId> = core
            .active_sustains()
            .iter()
            .map(|sustain| sustain.note)
            .filter(|&id| {
                let note = &core.notes()[id].data;
                let mask = if note.disjoint {
                    note.fret.mask()
                } else {
                    note.note_mask
                };
                if mask == 0 {
                    held != 0
                } else {
                    held & mask != mask
                }
            })
            .collect();
        for id in released {
            core.end_sustain(id);
        }
    }

    /// Move pending whammy ticks into the meter whenever the current run of accumulation
    /// ends, then restart the whammy timer on request.
    fn update_whammy_star_power(&mut self, core: &mut Core) {
        let time = core.state().current_time;
        let flush = !self.state.whammy_timer.is_active(time)
            || self.state.whammy_requested
            || self.state.star_power_requested
            || !self.has_star_power_sustain(core);
        if flush && self.state.whammy_ticks > 0 {
            let bars = self.state.whammy_ticks as f64 / core.ticks_per_bar();
            log::debug!(
                "whammy added {bars} bars ({} ticks) at {time}",
                self.state.whammy_ticks
            );
            self.state.whammy_ticks = 0;
            core.gain_star_power(bars);
        }

        if self.state.whammy_requested {
            self.state.whammy_requested = false;
            self.state.whammy_timer.start(time);
        }
    }

    fn update_timers(&mut self, core: &mut Core) {
        let time = core.state().current_time;

        if self.state.strum_leniency_timer.is_expired(time) {
            log::debug!("strum leniency ran out at {time}");
            self.state.strum_leniency_timer.disable();
            self.overstrum(core);
        }

        if self.state.hopo_leniency_timer.is_expired(time) {
            self.state.hopo_leniency_timer.disable();
        }
    }

    fn handle_strum(&mut self, core: &mut Core) {
        let time = core.state().current_time;

        if self.state.hopo_leniency_timer.is_active(time) {
            // Strum right after a hopo/tap hit is swallowed
            log::debug!("hopo strummed at {time}");
            self.state.hopo_leniency_timer.disable();
            self.state.strum_leniency_timer.disable();
            self.state.has_strummed = false;
            core.stats_mut().hopos_strummed += 1;
            return;
        }

        if self.state.strum_leniency_timer.is_active(time) {
            log::debug!("strummed again during strum leniency at {time}");
            self.overstrum(core);
        }

        let note_in_window = core
            .note_at_cursor()
            .is_some_and(|id| core.note_window_position(id, time) == WindowPosition::Inside);
        let leniency = if note_in_window {
            self.params.strum_leniency
        } else {
            self.params.strum_leniency_small
        };
        self.state
            .strum_leniency_timer
            .start_with_threshold(time, leniency);
    }

    fn check_for_note_hit(&mut self, core: &mut Core, id: NoteId) {
        let time = core.state().current_time;

        match core.note_window_position(id, time) {
            // Passed notes are missed before inputs are looked at
            WindowPosition::Passed => return,
            WindowPosition::NotReached => {
                if self.state.has_fretted && self.params.infinite_front_end {
                    self.state.infinite_front_end_armed = true;
                }
                return;
            }
            WindowPosition::Inside => {}
        }

        // Fret pressed before the window with infinite front end
        if self.state.infinite_front_end_armed
            && !self.state.has_strummed
            && self.can_fret_hit(core, id)
            && self.can_note_be_hit(core, id)
        {
            self.hit_note(core, id);
            return;
        }

        if self.state.has_strummed || self.state.strum_leniency_timer.is_active(time) {
            if self.can_note_be_hit(core, id) {
                self.hit_note(core, id);
                return;
            }
            if core.stats().base.combo == 0 && self.skip_to_hittable_note(core, id, true) {
                return;
            }
        }

        if self.state.has_fretted {
            self.check_ghosting(core, id);

            if self.can_fret_hit(core, id) && self.can_note_be_hit(core, id) {
                self.hit_note(core, id);
                return;
            }
            if core.stats().base.combo == 0 {
                self.skip_to_hittable_note(core, id, false);
            }
        }
    }

    /// Hit a later note already inside its window, for combo regain.
    fn skip_to_hittable_note(&mut self, core: &mut Core, current: NoteId, strummed: bool) -> bool {
        let time = core.state().current_time;
        let mut next = core.notes()[current].next;

        while let Some(id) = next {
            match core.note_window_position(id, time) {
                WindowPosition::NotReached => return false,
                WindowPosition::Inside => {
                    let playable = strummed || self.can_fret_hit(core, id);
                    if playable && self.can_note_be_hit(core, id) {
                        log::debug!("skipping ahead to hittable note {} at {time}", id.0);
                        self.hit_note(core, id);
                        return true;
                    }
                }
                WindowPosition::Passed => {}
            }
            next = core.notes()[id].next;
        }
        false
    }

    /// Hopo/tap legality without a strum.
    fn can_fret_hit(&self, core: &Core, id: NoteId) -> bool {
        let note = &core.notes()[id];
        let combo = core.stats().base.combo;
        let fret_playable = note.data.is_tap() || (note.data.is_hopo() && combo > 0);
        if !fret_playable || self.state.tap_button_mask != 0 {
            return false;
        }
        if self.params.anti_ghosting && self.state.was_note_ghosted {
            return false;
        }
        if self.params.infinite_front_end {
            return true;
        }

        let time = core.state().current_time;
        let (front_end, _) = core.hit_window_for(id);
        note.time < self.state.fret_press_time + front_end.abs()
            || self.state.strum_leniency_timer.is_active(time)
    }

    fn check_ghosting(&mut self, core: &mut Core, id: NoteId) {
        if !self.state.is_fret_press {
            return;
        }
        let note = &core.notes()[id].data;
        if note.is_open() {
            return;
        }
        let fret_playable = !note.is_strum();

        let held = self.state.button_mask;
        let new_highest = highest_fret(held) > highest_fret(self.state.last_button_mask);
        if new_highest && held & note.note_mask == 0 {
            let time = core.state().current_time;
            log::debug!("ghost input at {time} on note {}", id.0);
            core.stats_mut().ghost_inputs += 1;
            core.push_event(EngineEvent::GhostInput { time });
            // Only fret hits can be blocked; strum notes just count the ghost
            if self.params.anti_ghosting && fret_playable {
                self.state.was_note_ghosted = true;
            }
        }
    }

    fn hit_note(&mut self, core: &mut Core, id: NoteId) {
        let time = core.state().current_time;
        let parent = core.notes().parent_or_self(id);
        let note = &core.notes()[parent];
        let is_fret_playable = note.data.is_hopo() || note.data.is_tap();
        let disjoint = note.data.disjoint;
        let chord_size = note.children.len() as u32 + 1;
        let points = POINTS_PER_NOTE * chord_size as i32;

        self.state.tap_button_mask = self.state.button_mask;
        if is_fret_playable {
            self.state.hopo_leniency_timer.start(time);
        } else {
            // Strummed notes never block the next hopo/tap
            self.state.tap_button_mask = 0;
            self.state.fret_press_time = f64::NEG_INFINITY;
        }
        self.state.strum_leniency_timer.disable();
        self.state.was_note_ghosted = false;
        self.state.infinite_front_end_armed = false;

        core.hit_note(parent, points);

        if disjoint {
            for id in core.notes().all_notes(parent) {
                core.start_sustain(id, 1);
            }
        } else {
            core.start_sustain(parent, chord_size);
        }
    }

    fn miss_note(&mut self, core: &mut Core, id: NoteId) {
        self.state.tap_button_mask = self.state.button_mask;
        self.state.was_note_ghosted = false;
        self.state.infinite_front_end_armed = false;
        core.miss_note(id);
    }

    fn overstrum(&mut self, core: &mut Core) {
        if let Some(id) = core.note_at_cursor()
            && !core.notes()[id].is_star_power_start()
        {
            core.strip_star_power(id);
        }

        let time = core.state().current_time;
        let stats = core.stats_mut();
        stats.base.combo = 0;
        stats.overstrums += 1;
        core.update_multiplier();

        log::debug!("overstrum at {time}");
        core.push_event(EngineEvent::Overstrum { time });
    }
}

impl HitLogic for FiveFretLogic {
    type Note = GuitarNote;
    type Action = GuitarAction;
    type Stats = GuitarStats;

    fn calculate_base_score(notes: &NoteTrack<GuitarNote>, sync_track: &SyncTrack) -> i32 {
        let ticks_per_point = ticks_per_sustain_point(sync_track.resolution());
        notes
            .parents()
            .map(|(id, note)| {
                let chord_size = note.children.len() as u32 + 1;
                let sustain = if note.data.disjoint {
                    notes
                        .all_notes(id)
                        .iter()
                        .map(|&n| sustain_points(notes[n].tick_length, ticks_per_point))
                        .sum::<u32>()
                } else {
                    sustain_points(note.tick_length, ticks_per_point) * chord_size
                };
                (POINTS_PER_NOTE as u32 * chord_size + sustain) as i32
            })
            .sum()
    }

    fn mutate_state_with_input(&mut self, core: &Core, input: &GameInput<GuitarAction>) {
        if core.is_bot() {
            return;
        }

        match input.action {
            GuitarAction::StarPower => {
                if input.button {
                    self.state.star_power_requested = true;
                }
            }
            GuitarAction::Whammy => {
                if input.button || input.integer.is_some() {
                    self.state.whammy_requested = true;
                }
            }
            GuitarAction::StrumUp | GuitarAction::StrumDown => {
                if input.button {
                    self.state.has_strummed = true;
                }
            }
            fret => {
                let Some(bit) = fret.fret_bit() else {
                    return;
                };
                self.state.last_button_mask = self.state.button_mask;
                if input.button {
                    self.state.button_mask |= bit;
                } else {
                    self.state.button_mask &= !bit;
                }
                self.state.has_fretted = true;
                self.state.is_fret_press = input.button;
                self.state.fret_press_time = input.time;
            }
        }
    }

    fn update_hit_logic(&mut self, core: &mut Core, time: f64) {
        core.update_time_variables(time);

        if core.is_bot() {
            self.update_bot(core);
            return;
        }

        // Sustains pay out before anything in this pass can change the multiplier
        self.accumulate_whammy(core);
        core.update_sustains();
        self.drop_released_sustains(core);

        core.update_star_power();
        self.update_whammy_star_power(core);
        if self.state.star_power_requested {
            self.state.star_power_requested = false;
            core.activate_star_power();
        }
        self.update_timers(core);

        if self.state.button_mask != self.state.tap_button_mask {
            self.state.tap_button_mask = 0;
        }

        while let Some(id) = core.note_at_cursor()
            && core.note_window_position(id, time) == WindowPosition::Passed
        {
            self.miss_note(core, id);
        }

        if self.state.has_strummed {
            self.handle_strum(core);
        }

        if let Some(id) = core.note_at_cursor() {
            self.check_for_note_hit(core, id);
        }
        self.state.clear_input_flags();
    }

    /// Open notes need no frets held, others need at least one. Exact matches always hit;
    /// otherwise lower frets may be held as an anchor, except on strummed chords.
    fn can_note_be_hit(&self, core: &Core, id: NoteId) -> bool {
        let note = &core.notes()[id];
        let mask = note.data.note_mask;
        let held = self.state.button_mask;

        if (mask == 0) != (held == 0) {
            return false;
        }
        if held == mask {
            return true;
        }

        if note.is_chord() {
            if note.data.is_strum() {
                return false;
            }
            let below_chord = (mask & mask.wrapping_neg()) - 1;
            held & !below_chord == mask
        } else {
            (held ^ mask) < mask
        }
    }

    fn queue_timer_updates(&self, previous: f64, next: f64, anchors: &mut Vec<f64>) {
        for timer in [&self.state.strum_leniency_timer, &self.state.whammy_timer] {
            if timer.is_enabled()
                && crate::math::is_time_between(timer.end_time(), previous, next)
            {
                anchors.push(timer.end_time());
            }
        }
    }

    fn reset(&mut self, keep_buttons: bool) {
        self.state.reset(keep_buttons);
    }
}

/// 1-based index of the highest held fret, 0 when none is held.
fn highest_fret(mask: u8) -> u32 {
    u8::BITS - mask.leading_zeros()
}
