// Instrument-independent note bookkeeping: hit windows, hit/miss, star power, solos, stars

use fret_model::{InstrumentDifficulty, NoteFlags, NoteId, NoteTrack, Phrase, PhraseType, SyncTrack};

use crate::engine_event::EngineEvent;
use crate::engine_parameters::BaseEngineParameters;
use crate::engine_state::BaseEngineState;
use crate::engine_stats::EngineStats;
use crate::math::{bit_increment, inverse_lerp, is_time_between};
use crate::solo_section::{SoloSection, calculate_solo_bonus};
use crate::sustain::{ActiveSustain, SUSTAIN_BURST_FRACTION, ticks_per_sustain_point};
use crate::{
    COMBO_PER_MULTIPLIER, STAR_POWER_ACTIVATION_THRESHOLD, STAR_POWER_BEATS_PER_BAR,
    STAR_POWER_PHRASE_GAIN,
};

/// Where a time falls relative to a note's hit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Before the front end
    NotReached,
    /// Between front end and back end, both inclusive
    Inside,
    /// After the back end
    Passed,
}

/// Shared engine core, generic over the instrument note payload `N` and stats `S`.
///
/// Instrument hit logic decides *whether* a note is hit; the core applies the consequences
/// (combo, score, star power, solos, sustains, cursor advancement) identically for every
/// instrument.
#[derive(Debug, Clone)]
pub struct EngineCore<N, S> {
    pub(crate) notes: NoteTrack<N>,
    phrases: Vec<Phrase>,
    sync_track: SyncTrack,
    pub(crate) parameters: BaseEngineParameters,
    pub(crate) state: BaseEngineState,
    pub(crate) stats: S,
    solos: Vec<SoloSection>,
    events: Vec<EngineEvent>,
    star_score_thresholds: Vec<i32>,
    base_score: i32,
    active_sustains: Vec<ActiveSustain>,
    ticks_per_sustain_point: f64,
    /// Ticks before a sustain's end at which its remaining points are awarded
    sustain_burst_threshold: u32,
    chord_separate: bool,
    is_bot: bool,
    pub(crate) rerun_hit_logic: bool,
}

impl<N, S: EngineStats> EngineCore<N, S> {
    pub fn new(
        chart: InstrumentDifficulty<N>,
        sync_track: SyncTrack,
        parameters: BaseEngineParameters,
        base_score: i32,
        chord_separate: bool,
        is_bot: bool,
    ) -> Self {
        let InstrumentDifficulty { notes, phrases } = chart;

        let star_score_thresholds = parameters
            .star_multiplier_thresholds
            .iter()
            .map(|m| (base_score as f64 * m) as i32)
            .collect();

        let mut stats = S::default();
        let total_notes = if chord_separate {
            notes.note_count()
        } else {
            notes.len()
        };
        stats.base_mut().total_notes = total_notes as u32;
        stats.base_mut().total_star_power_phrases = phrases
            .iter()
            .filter(|p| p.kind == PhraseType::StarPower)
            .count() as u32;

        let resolution = sync_track.resolution();
        let mut core = Self {
            notes,
            phrases,
            sync_track,
            parameters,
            state: BaseEngineState::default(),
            stats,
            solos: Vec::new(),
            events: Vec::new(),
            star_score_thresholds,
            base_score,
            active_sustains: Vec::new(),
            ticks_per_sustain_point: ticks_per_sustain_point(resolution),
            sustain_burst_threshold: resolution / SUSTAIN_BURST_FRACTION,
            chord_separate,
            is_bot,
            rerun_hit_logic: false,
        };
        core.solos = core.find_solo_sections();
        core
    }

    pub fn notes(&self) -> &NoteTrack<N> {
        &self.notes
    }

    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    pub fn sync_track(&self) -> &SyncTrack {
        &self.sync_track
    }

    pub fn parameters(&self) -> &BaseEngineParameters {
        &self.parameters
    }

    pub fn state(&self) -> &BaseEngineState {
        &self.state
    }

    pub fn stats(&self) -> &S {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut S {
        &mut self.stats
    }

    pub fn solos(&self) -> &[SoloSection] {
        &self.solos
    }

    pub fn base_score(&self) -> i32 {
        self.base_score
    }

    pub fn star_score_thresholds(&self) -> &[i32] {
        &self.star_score_thresholds
    }

    pub fn active_sustains(&self) -> &[ActiveSustain] {
        &self.active_sustains
    }

    pub fn ticks_per_sustain_point(&self) -> f64 {
        self.ticks_per_sustain_point
    }

    pub fn sustain_burst_threshold(&self) -> u32 {
        self.sustain_burst_threshold
    }

    pub fn is_bot(&self) -> bool {
        self.is_bot
    }

    pub fn is_chord_separate(&self) -> bool {
        self.chord_separate
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn push_event(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Notes counted for a parent: the whole chord when chords score separately, else one.
    pub fn number_of_notes(&self, parent: NoteId) -> u32 {
        if self.chord_separate {
            self.notes[parent].children.len() as u32 + 1
        } else {
            1
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.stats.reset();
        self.events.clear();
        self.notes.reset_state();
        self.active_sustains.clear();
        for solo in &mut self.solos {
            solo.reset();
        }
        self.rerun_hit_logic = false;
    }

    pub fn update_time_variables(&mut self, time: f64) {
        if time < self.state.current_time {
            contract_violation!(
                "time cannot go backwards (current {}, new {time})",
                self.state.current_time
            );
            return;
        }

        self.state.last_update_time = self.state.current_time;
        self.state.last_tick = self.state.current_tick;
        self.state.current_time = time;
        self.state.current_tick = self.sync_track.time_to_tick(time);
    }

    /// Parent note at the cursor, `None` once the chart is exhausted.
    pub fn note_at_cursor(&self) -> Option<NoteId> {
        self.notes.parent_at(self.state.note_index)
    }

    /// Average of the half-gaps to the neighboring notes.
    ///
    /// A missing neighbor counts as half the maximum window (or the other half-gap, for the
    /// first note).
    pub fn average_note_distance(&self, id: NoteId) -> f64 {
        let note = &self.notes[self.notes.parent_or_self(id)];

        let current_to_next = match note.next {
            Some(next) => (self.notes[next].time - note.time) / 2.0,
            None => self.parameters.hit_window.max_window / 2.0,
        };
        let previous_to_current = match note.previous {
            Some(prev) => (note.time - self.notes[prev].time) / 2.0,
            None => current_to_next,
        };

        previous_to_current + current_to_next
    }

    /// Front end and back end (relative to note time) of a note's window.
    pub fn hit_window_for(&self, id: NoteId) -> (f64, f64) {
        let settings = &self.parameters.hit_window;
        let window = settings.calculate_hit_window(self.average_note_distance(id));
        (settings.front_end(window), settings.back_end(window))
    }

    /// Window of the note at the cursor, or the maximum window once the chart is exhausted.
    pub fn calculate_hit_window(&self) -> (f64, f64) {
        match self.note_at_cursor() {
            Some(id) => self.hit_window_for(id),
            None => {
                let settings = &self.parameters.hit_window;
                (
                    settings.front_end(settings.max_window),
                    settings.back_end(settings.max_window),
                )
            }
        }
    }

    pub fn note_window_position(&self, id: NoteId, time: f64) -> WindowPosition {
        let (front_end, back_end) = self.hit_window_for(id);
        let note_time = self.notes[id].time;
        if time < note_time + front_end {
            WindowPosition::NotReached
        } else if time > note_time + back_end {
            WindowPosition::Passed
        } else {
            WindowPosition::Inside
        }
    }

    /// Anchors for note front ends (or exact note times for bots) and just past back ends,
    /// strictly between `previous` and `next`.
    pub fn queue_note_anchors(&self, previous: f64, next: f64, anchors: &mut Vec<f64>) {
        for &id in &self.notes.parent_ids()[self.state.note_index.min(self.notes.len())..] {
            let note_time = self.notes[id].time;
            let (front_end, back_end) = self.hit_window_for(id);
            let front_end = note_time + front_end;

            if next < front_end {
                break;
            }

            let reachable = if self.is_bot { note_time } else { front_end };
            if is_time_between(reachable, previous, next) {
                log::trace!("anchor: note {} reachable at {reachable}", id.0);
                anchors.push(reachable);
            }

            // A note exactly on its back end is still hittable
            let miss_time = bit_increment(note_time + back_end);
            if is_time_between(miss_time, previous, next) {
                log::trace!("anchor: note {} missed at {miss_time}", id.0);
                anchors.push(miss_time);
            }
        }
    }

    pub fn queue_star_power_anchor(&self, previous: f64, next: f64, anchors: &mut Vec<f64>) {
        if let Some(end) = self.state.star_power_end_time
            && is_time_between(end, previous, next)
        {
            anchors.push(end);
        }
    }

    pub fn queue_sustain_anchors(&self, previous: f64, next: f64, anchors: &mut Vec<f64>) {
        for sustain in &self.active_sustains {
            if is_time_between(sustain.burst_time, previous, next) {
                anchors.push(sustain.burst_time);
            }
        }
    }

    /// Miss every unresolved note before `current`, oldest first.
    ///
    /// Returns true when at least one note was skipped.
    pub fn skip_previous_notes(&mut self, current: NoteId) -> bool {
        let mut stale = Vec::new();
        let mut prev = self.notes[self.notes.parent_or_self(current)].previous;
        while let Some(id) = prev
            && !self.notes.was_fully_hit_or_missed(id)
        {
            stale.push(id);
            prev = self.notes[id].previous;
        }

        for &id in stale.iter().rev() {
            log::trace!(
                "note {} skipped at {}",
                id.0,
                self.state.current_time
            );
            if self.chord_separate {
                for note in self.notes.all_notes(id) {
                    if !self.notes[note].is_resolved() {
                        self.miss_note(note);
                    }
                }
            } else {
                self.miss_note(id);
            }
        }
        !stale.is_empty()
    }

    /// Apply a hit worth `points` before the multiplier.
    ///
    /// Without separate chord scoring, the whole chord of `id` is hit at once.
    pub fn hit_note(&mut self, id: NoteId, points: i32) {
        let parent = self.notes.parent_or_self(id);
        self.skip_previous_notes(parent);

        if self.chord_separate {
            self.notes[id].was_hit = true;
        } else {
            for note in self.notes.all_notes(parent) {
                self.notes[note].was_hit = true;
            }
        }
        let fully_resolved = self.notes.was_fully_hit_or_missed(parent);

        let stats = self.stats.base_mut();
        stats.combo += 1;
        stats.max_combo = stats.max_combo.max(stats.combo);
        stats.notes_hit += 1;
        self.update_multiplier();

        if fully_resolved
            && self.notes[parent].is_star_power()
            && self.notes[parent].is_star_power_end()
        {
            self.award_star_power(parent);
        }

        if self.notes[parent].is_solo_start() && !self.state.is_solo_active {
            self.start_solo();
        }
        if self.state.is_solo_active
            && let Some(solo) = self.solos.get_mut(self.state.current_solo_index)
        {
            solo.notes_hit += 1;
        }

        let multiplier = self.stats.base().score_multiplier as i32;
        self.add_score(points * multiplier);

        log::debug!(
            "hit note {} (index {}) at {}, combo {}",
            id.0,
            self.state.note_index,
            self.state.current_time,
            self.stats.base().combo
        );
        self.events.push(EngineEvent::NoteHit {
            note_index: self.state.note_index,
            note: id,
        });

        if fully_resolved {
            if self.notes[parent].is_solo_end() {
                self.end_solo();
            }
            self.advance_to_next_note();
        }
    }

    pub fn miss_note(&mut self, id: NoteId) {
        let parent = self.notes.parent_or_self(id);

        if self.chord_separate {
            self.notes[id].was_missed = true;
        } else {
            for note in self.notes.all_notes(parent) {
                if !self.notes[note].was_hit {
                    self.notes[note].was_missed = true;
                }
            }
        }
        let fully_resolved = self.notes.was_fully_hit_or_missed(parent);

        let stats = self.stats.base_mut();
        stats.combo = 0;
        stats.notes_missed += 1;
        self.update_multiplier();

        self.strip_star_power(parent);

        if self.notes[parent].is_solo_start() && !self.state.is_solo_active {
            self.start_solo();
        }

        log::debug!(
            "missed note {} (index {}) at {}",
            id.0,
            self.state.note_index,
            self.state.current_time
        );
        self.events.push(EngineEvent::NoteMissed {
            note_index: self.state.note_index,
            note: id,
        });

        if fully_resolved {
            if self.notes[parent].is_solo_end() {
                self.end_solo();
            }
            self.advance_to_next_note();
        }
    }

    fn advance_to_next_note(&mut self) {
        self.state.note_index += 1;
        self.rerun_hit_logic = true;
    }

    /// Remove star power from the phrase containing `id`.
    ///
    /// Clears the note, its chord, and neighbors back to the phrase start and forward to the
    /// phrase end, so a broken phrase cannot award power from its remaining notes.
    pub fn strip_star_power(&mut self, id: NoteId) {
        let id = self.notes.parent_or_self(id);
        if !self.notes[id].is_star_power() {
            return;
        }

        self.clear_star_power_flag(id);

        if !self.notes[id].is_star_power_start() {
            let mut prev = self.notes[id].previous;
            while let Some(p) = prev
                && self.notes[p].is_star_power()
            {
                self.clear_star_power_flag(p);
                if self.notes[p].is_star_power_start() {
                    break;
                }
                prev = self.notes[p].previous;
            }
        }

        if !self.notes[id].is_star_power_end() {
            let mut next = self.notes[id].next;
            while let Some(n) = next
                && self.notes[n].is_star_power()
            {
                self.clear_star_power_flag(n);
                if self.notes[n].is_star_power_end() {
                    break;
                }
                next = self.notes[n].next;
            }
        }

        log::debug!("star power phrase missed at note {}", id.0);
        self.events.push(EngineEvent::StarPowerPhraseMissed { note: id });
    }

    fn clear_star_power_flag(&mut self, parent: NoteId) {
        for note in self.notes.all_notes(parent) {
            self.notes[note].flags.remove(NoteFlags::STAR_POWER);
        }
    }

    fn award_star_power(&mut self, id: NoteId) {
        self.gain_star_power(STAR_POWER_PHRASE_GAIN);
        self.stats.base_mut().star_power_phrases_hit += 1;
        log::debug!("star power phrase hit at note {}", id.0);
        self.events.push(EngineEvent::StarPowerPhraseHit { note: id });
    }

    /// Fill the meter by `amount` bars, capped at a full meter.
    pub fn gain_star_power(&mut self, amount: f64) {
        if self.stats.base().is_star_power_active {
            self.rebase_star_power();
            self.state.star_power_base_amount =
                (self.state.star_power_base_amount + amount).min(1.0);
            self.stats.base_mut().star_power_amount = self.state.star_power_base_amount;
            self.state.star_power_end_time = Some(self.star_power_end_time());
        } else {
            let stats = self.stats.base_mut();
            stats.star_power_amount = (stats.star_power_amount + amount).min(1.0);
        }
    }

    pub fn can_star_power_activate(&self) -> bool {
        let stats = self.stats.base();
        stats.star_power_amount >= STAR_POWER_ACTIVATION_THRESHOLD && !stats.is_star_power_active
    }

    pub fn activate_star_power(&mut self) {
        if !self.can_star_power_activate() {
            return;
        }

        self.state.star_power_base_tick = self.state.current_tick;
        self.state.star_power_base_amount = self.stats.base().star_power_amount;
        self.state.star_power_end_time = Some(self.star_power_end_time());

        let stats = self.stats.base_mut();
        stats.is_star_power_active = true;
        stats.star_power_activation_count += 1;
        self.update_multiplier();

        log::debug!(
            "star power activated at {} ({} bars)",
            self.state.current_time,
            self.state.star_power_base_amount
        );
        self.events
            .push(EngineEvent::StarPowerStatus { active: true });
    }

    /// Drain active star power to the current tick, deactivating at the projected end time.
    pub fn update_star_power(&mut self) {
        if !self.stats.base().is_star_power_active {
            return;
        }

        if self
            .state
            .star_power_end_time
            .is_some_and(|end| self.state.current_time >= end)
        {
            self.state.star_power_end_time = None;
            self.state.star_power_base_amount = 0.0;
            let stats = self.stats.base_mut();
            stats.star_power_amount = 0.0;
            stats.is_star_power_active = false;
            self.update_multiplier();

            log::debug!("star power ended at {}", self.state.current_time);
            self.events
                .push(EngineEvent::StarPowerStatus { active: false });
            return;
        }

        self.stats.base_mut().star_power_amount = self.drained_star_power();
    }

    pub fn ticks_per_bar(&self) -> f64 {
        self.sync_track.resolution() as f64 * STAR_POWER_BEATS_PER_BAR as f64
    }

    fn drained_star_power(&self) -> f64 {
        let elapsed = self
            .state
            .current_tick
            .saturating_sub(self.state.star_power_base_tick);
        (self.state.star_power_base_amount - elapsed as f64 / self.ticks_per_bar()).max(0.0)
    }

    fn rebase_star_power(&mut self) {
        self.state.star_power_base_amount = self.drained_star_power();
        self.state.star_power_base_tick = self.state.current_tick;
    }

    fn star_power_end_time(&self) -> f64 {
        let ticks = (self.state.star_power_base_amount * self.ticks_per_bar()).ceil();
        let end_tick = self
            .state
            .star_power_base_tick
            .saturating_add(ticks.min(u32::MAX as f64) as u32);
        let end_time = self.sync_track.tick_to_time(end_tick);
        if end_time > self.state.current_time {
            end_time
        } else {
            bit_increment(self.state.current_time)
        }
    }

    pub fn update_multiplier(&mut self) {
        let max = self.parameters.max_multiplier;
        let stats = self.stats.base_mut();
        let multiplier = (stats.combo / COMBO_PER_MULTIPLIER + 1).min(max);
        stats.score_multiplier = if stats.is_star_power_active {
            multiplier * 2
        } else {
            multiplier
        };
    }

    /// Start scoring the sustain of the hit note `id`, worth `note_count` notes per point.
    ///
    /// Notes without a sustain are ignored. Points count from the note's tick, so an early hit
    /// earns nothing until the note is reached.
    pub fn start_sustain(&mut self, id: NoteId, note_count: u32) {
        let note = &self.notes[id];
        if note.tick_length == 0 {
            return;
        }

        let start_tick = note.tick;
        let end_tick = note.tick.saturating_add(note.tick_length);
        let burst_tick = end_tick
            .saturating_sub(self.sustain_burst_threshold)
            .max(start_tick);
        let burst_time = self.sync_track.tick_to_time(burst_tick);

        log::debug!(
            "sustain started on note {} at {}, ends at tick {end_tick}",
            id.0,
            self.state.current_time
        );
        self.active_sustains.push(ActiveSustain {
            note: id,
            start_tick,
            end_tick,
            burst_time,
            note_count,
            points_awarded: 0,
        });
        self.events.push(EngineEvent::SustainStart { note: id });
    }

    /// Award sustain points earned up to the current tick at the current multiplier.
    ///
    /// Sustains at or past their burst time pay out in full and finish.
    pub fn update_sustains(&mut self) {
        if self.active_sustains.is_empty() {
            return;
        }

        let tick = self.state.current_tick;
        let time = self.state.current_time;
        let ticks_per_point = self.ticks_per_sustain_point;
        let mut points = 0u32;
        let mut finished = Vec::new();
        self.active_sustains.retain_mut(|sustain| {
            let done = time >= sustain.burst_time;
            let earned = if done {
                sustain.total_points(ticks_per_point)
            } else {
                sustain.points_at(tick, ticks_per_point)
            };
            points += earned.saturating_sub(sustain.points_awarded) * sustain.note_count;
            sustain.points_awarded = sustain.points_awarded.max(earned);
            if done {
                finished.push(sustain.note);
            }
            !done
        });

        if points > 0 {
            let multiplier = self.stats.base().score_multiplier as i32;
            self.add_score(points as i32 * multiplier);
        }
        for note in finished {
            log::debug!("sustain on note {} finished at {time}", note.0);
            self.events.push(EngineEvent::SustainEnd {
                note,
                finished: true,
            });
        }
    }

    /// Stop scoring the sustain of `id`, keeping the points already awarded.
    pub fn end_sustain(&mut self, id: NoteId) {
        let Some(index) = self.active_sustains.iter().position(|s| s.note == id) else {
            return;
        };
        self.active_sustains.remove(index);
        log::debug!(
            "sustain on note {} dropped at {}",
            id.0,
            self.state.current_time
        );
        self.events.push(EngineEvent::SustainEnd {
            note: id,
            finished: false,
        });
    }

    pub fn add_score(&mut self, points: i32) {
        self.stats.base_mut().committed_score += points;
        self.update_stars();
    }

    /// Star index counts thresholds at or below the star score; the fraction interpolates
    /// towards the next threshold.
    pub fn update_stars(&mut self) {
        // An empty chart has all-zero thresholds
        if self.base_score <= 0 {
            return;
        }
        let score = self.stats.base().star_score();
        let thresholds = &self.star_score_thresholds;

        while self.state.current_star_index < thresholds.len()
            && score >= thresholds[self.state.current_star_index]
        {
            self.state.current_star_index += 1;
        }

        let index = self.state.current_star_index;
        let progress = match thresholds.get(index) {
            Some(&next) => {
                let previous = if index > 0 { thresholds[index - 1] } else { 0 };
                inverse_lerp(previous as f64, next as f64, score as f64)
                    .clamp(0.0, 1.0 - f64::EPSILON)
            }
            None => 0.0,
        };
        self.stats.base_mut().stars = index as f64 + progress;
    }

    fn start_solo(&mut self) {
        if self.state.current_solo_index >= self.solos.len() {
            return;
        }
        self.state.is_solo_active = true;
        log::debug!(
            "solo {} started at {}",
            self.state.current_solo_index,
            self.state.current_time
        );
        self.events.push(EngineEvent::SoloStart {
            section: self.state.current_solo_index,
        });
    }

    fn end_solo(&mut self) {
        if !self.state.is_solo_active {
            return;
        }
        let index = self.state.current_solo_index;
        let Some(solo) = self.solos.get_mut(index) else {
            self.state.is_solo_active = false;
            return;
        };

        solo.solo_bonus = calculate_solo_bonus(solo.notes_hit, solo.note_count);
        let bonus = solo.solo_bonus;
        log::debug!(
            "solo {index} ended: {}/{} hit, bonus {bonus}",
            solo.notes_hit,
            solo.note_count
        );

        self.stats.base_mut().solo_bonuses += bonus;
        self.state.is_solo_active = false;
        self.events.push(EngineEvent::SoloEnd { section: index });
        self.state.current_solo_index += 1;
    }

    fn find_solo_sections(&self) -> Vec<SoloSection> {
        let mut sections = Vec::new();
        let parents = self.notes.parent_ids();
        let mut i = 0;
        while i < parents.len() {
            let start = parents[i];
            if !self.notes[start].is_solo_start() {
                i += 1;
                continue;
            }

            let mut count = 0;
            let mut end = None;
            for (j, &id) in parents.iter().enumerate().skip(i) {
                count += self.number_of_notes(id);
                if self.notes[id].is_solo_end() {
                    end = Some(j);
                    break;
                }
            }
            match end {
                Some(j) => {
                    sections.push(SoloSection::new(count));
                    i = j + 1;
                }
                None => break,
            }
        }
        sections
    }
}
