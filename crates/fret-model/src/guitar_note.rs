use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::note::{Note, NoteFlags};
use crate::note_track::{NoteId, NoteTrack};

/// Five-fret guitar fret. `Open` is played with no fret held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FiveFretGuitarFret {
    Open = 0,
    Green = 1,
    Red = 2,
    Yellow = 3,
    Blue = 4,
    Orange = 5,
}

impl FiveFretGuitarFret {
    pub const ALL: [Self; 6] = [
        Self::Open,
        Self::Green,
        Self::Red,
        Self::Yellow,
        Self::Blue,
        Self::Orange,
    ];

    /// Button mask bit for this fret (open is the empty mask).
    pub fn mask(self) -> u8 {
        match self {
            Self::Open => 0,
            fret => 1 << (fret as u8 - 1),
        }
    }
}

/// How a five-fret note may be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GuitarNoteType {
    #[default]
    Strum,
    /// Hammer-on/pull-off: hittable without strumming while in combo
    Hopo,
    /// Always hittable without strumming
    Tap,
}

/// Five-fret payload of a [`Note`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuitarNote {
    pub fret: FiveFretGuitarFret,
    pub note_type: GuitarNoteType,
    /// Sustain evaluated per fret instead of as a whole chord
    pub disjoint: bool,
    /// Own fret bit for children, union of the chord for parents
    pub note_mask: u8,
}

impl GuitarNote {
    pub fn new(fret: FiveFretGuitarFret, note_type: GuitarNoteType) -> Self {
        Self {
            fret,
            note_type,
            disjoint: false,
            note_mask: fret.mask(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.fret == FiveFretGuitarFret::Open
    }

    pub fn is_strum(&self) -> bool {
        self.note_type == GuitarNoteType::Strum
    }

    pub fn is_hopo(&self) -> bool {
        self.note_type == GuitarNoteType::Hopo
    }

    pub fn is_tap(&self) -> bool {
        self.note_type == GuitarNoteType::Tap
    }
}

impl NoteTrack<GuitarNote> {
    /// Push a chord (or single note) of the given frets at one instant.
    ///
    /// The first fret becomes the parent; the parent's mask is the union of all frets.
    pub fn push_guitar_chord(
        &mut self,
        frets: &[FiveFretGuitarFret],
        note_type: GuitarNoteType,
        tick: u32,
        time: f64,
    ) -> Result<NoteId> {
        let Some((&first, rest)) = frets.split_first() else {
            bail!("a guitar chord needs at least one fret");
        };
        if frets.len() > 1 && frets.contains(&FiveFretGuitarFret::Open) {
            bail!("open notes cannot be part of a chord");
        }
        let mut chord_mask = 0u8;
        for fret in frets {
            if chord_mask & fret.mask() != 0 {
                bail!("fret {fret:?} appears twice in one chord");
            }
            chord_mask |= fret.mask();
        }

        let parent = self.push(Note::new(
            GuitarNote::new(first, note_type),
            NoteFlags::NONE,
            tick,
            time,
        ))?;
        for &fret in rest {
            self.add_child(
                parent,
                Note::new(GuitarNote::new(fret, note_type), NoteFlags::NONE, tick, time),
            )?;
        }
        self[parent].data.note_mask = chord_mask;
        Ok(parent)
    }

    /// Give every note of the chord at `parent` a sustain.
    ///
    /// Disjoint chords keep each fret's sustain separately: releasing one fret only ends that
    /// fret's sustain.
    pub fn set_guitar_sustain(
        &mut self,
        parent: NoteId,
        tick_length: u32,
        time_length: f64,
        disjoint: bool,
    ) -> Result<()> {
        match self.get(parent) {
            Some(note) if note.is_parent() => {}
            Some(_) => bail!("note {} is not a chord parent", parent.0),
            None => bail!("no note with id {}", parent.0),
        }
        for id in self.all_notes(parent) {
            let note = &mut self[id];
            note.tick_length = tick_length;
            note.time_length = time_length;
            note.data.disjoint = disjoint;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FiveFretGuitarFret::*;

    #[test]
    fn test_fret_masks() {
        assert_eq!(Open.mask(), 0);
        assert_eq!(Green.mask(), 0b00001);
        assert_eq!(Red.mask(), 0b00010);
        assert_eq!(Orange.mask(), 0b10000);
    }

    #[test]
    fn test_chord_mask_is_union() {
        let mut track = NoteTrack::new();
        let id = track
            .push_guitar_chord(&[Green, Yellow], GuitarNoteType::Strum, 0, 0.0)
            .unwrap();
        assert_eq!(track[id].data.note_mask, 0b00101);
        assert!(track[id].is_chord());

        let child = track[id].children[0];
        assert_eq!(track[child].data.note_mask, Yellow.mask());
    }

    #[test]
    fn test_sustain_applies_to_whole_chord() {
        let mut track = NoteTrack::new();
        let id = track
            .push_guitar_chord(&[Red, Blue], GuitarNoteType::Strum, 480, 0.5)
            .unwrap();
        track.set_guitar_sustain(id, 960, 1.0, true).unwrap();

        for note in track.all_notes(id) {
            assert_eq!(track[note].tick_length, 960);
            assert_eq!(track[note].time_length, 1.0);
            assert!(track[note].data.disjoint);
        }

        let child = track[id].children[0];
        assert!(track.set_guitar_sustain(child, 960, 1.0, false).is_err());
        assert!(track.set_guitar_sustain(NoteId(7), 960, 1.0, false).is_err());
    }

    #[test]
    fn test_open_chord_rejected() {
        let mut track = NoteTrack::new();
        assert!(
            track
                .push_guitar_chord(&[Open, Green], GuitarNoteType::Strum, 0, 0.0)
                .is_err()
        );
        assert!(
            track
                .push_guitar_chord(&[], GuitarNoteType::Strum, 0, 0.0)
                .is_err()
        );
    }

    #[test]
    fn test_duplicate_fret_rejected() {
        let mut track = NoteTrack::new();
        assert!(
            track
                .push_guitar_chord(&[Red, Red], GuitarNoteType::Hopo, 0, 0.0)
                .is_err()
        );
    }
}
