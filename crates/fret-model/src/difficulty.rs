use serde::{Deserialize, Serialize};

use crate::note::NoteFlags;
use crate::note_track::{NoteId, NoteTrack};
use crate::phrase::{Phrase, PhraseType};

/// One playable difficulty of one instrument: its notes and phrase regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDifficulty<T> {
    pub notes: NoteTrack<T>,
    pub phrases: Vec<Phrase>,
}

impl<T> InstrumentDifficulty<T> {
    pub fn new(notes: NoteTrack<T>, phrases: Vec<Phrase>) -> Self {
        Self { notes, phrases }
    }

    pub fn phrase_count(&self, kind: PhraseType) -> usize {
        self.phrases.iter().filter(|p| p.kind == kind).count()
    }

    /// Precompute star power and solo flags from the phrase list.
    ///
    /// Every parent inside a star power phrase (and its chord) gets `STAR_POWER`; the first and
    /// last parent get the start/end markers. Solo phrases mark only their first and last parent.
    /// Phrases containing no note are ignored.
    pub fn apply_phrase_flags(&mut self) {
        for phrase in &self.phrases {
            let inside: Vec<NoteId> = self
                .notes
                .parents()
                .filter(|(_, note)| phrase.contains_tick(note.tick))
                .map(|(id, _)| id)
                .collect();
            let (Some(&first), Some(&last)) = (inside.first(), inside.last()) else {
                continue;
            };

            match phrase.kind {
                PhraseType::StarPower => {
                    for &id in &inside {
                        let mut flags = NoteFlags::STAR_POWER;
                        if id == first {
                            flags.insert(NoteFlags::STAR_POWER_START);
                        }
                        if id == last {
                            flags.insert(NoteFlags::STAR_POWER_END);
                        }
                        for note in self.notes.all_notes(id) {
                            add_authored_flags(&mut self.notes, note, flags);
                        }
                    }
                }
                PhraseType::Solo => {
                    add_authored_flags(&mut self.notes, first, NoteFlags::SOLO_START);
                    add_authored_flags(&mut self.notes, last, NoteFlags::SOLO_END);
                }
            }
        }
    }
}

fn add_authored_flags<T>(notes: &mut NoteTrack<T>, id: NoteId, flags: NoteFlags) {
    let note = &mut notes[id];
    let flags = note.original_flags().union(flags);
    note.set_authored_flags(flags);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    fn track(count: u32) -> NoteTrack<()> {
        let mut track = NoteTrack::new();
        for i in 0..count {
            track
                .push(Note::new((), NoteFlags::NONE, i * 480, i as f64 * 0.5))
                .unwrap();
        }
        track
    }

    #[test]
    fn test_star_power_flags() {
        let mut diff = InstrumentDifficulty::new(
            track(6),
            vec![Phrase::new(PhraseType::StarPower, 480, 1440, 0.5, 1.5)],
        );
        diff.apply_phrase_flags();

        let ids = diff.notes.parent_ids().to_vec();
        assert!(!diff.notes[ids[0]].is_star_power());
        assert!(diff.notes[ids[1]].is_star_power_start());
        assert!(diff.notes[ids[2]].is_star_power());
        assert!(diff.notes[ids[3]].is_star_power_end());
        assert!(!diff.notes[ids[4]].is_star_power());
        assert_eq!(diff.phrase_count(PhraseType::StarPower), 1);
    }

    #[test]
    fn test_star_power_flags_reach_children() {
        let mut notes = track(1);
        let parent = notes.parent_ids()[0];
        let child = notes
            .add_child(parent, Note::new((), NoteFlags::NONE, 0, 0.0))
            .unwrap();
        let mut diff = InstrumentDifficulty::new(
            notes,
            vec![Phrase::new(PhraseType::StarPower, 0, 480, 0.0, 0.5)],
        );
        diff.apply_phrase_flags();

        assert!(diff.notes[child].is_star_power());
        assert!(diff.notes[parent].is_chord());
        diff.notes.reset_state();
        assert!(diff.notes[child].is_star_power());
    }

    #[test]
    fn test_solo_flags() {
        let mut diff = InstrumentDifficulty::new(
            track(5),
            vec![Phrase::new(PhraseType::Solo, 960, 960, 1.0, 1.0)],
        );
        diff.apply_phrase_flags();

        let ids = diff.notes.parent_ids().to_vec();
        assert!(diff.notes[ids[2]].is_solo_start());
        assert!(diff.notes[ids[3]].is_solo_end());
        assert!(!diff.notes[ids[4]].is_solo_end());
    }

    #[test]
    fn test_empty_phrase_ignored() {
        let mut diff = InstrumentDifficulty::new(
            track(2),
            vec![Phrase::new(PhraseType::Solo, 10_000, 480, 10.0, 0.5)],
        );
        diff.apply_phrase_flags();
        assert!(diff.notes.parents().all(|(_, n)| n.flags.is_empty()));
    }
}
