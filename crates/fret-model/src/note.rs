use serde::{Deserialize, Serialize};

use crate::note_track::NoteId;

/// Chart-level note flags shared by every instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NoteFlags(u16);

impl NoteFlags {
    pub const NONE: Self = Self(0);
    /// Parent of a chord (has at least one child note)
    pub const CHORD: Self = Self(1 << 0);
    pub const STAR_POWER: Self = Self(1 << 1);
    pub const STAR_POWER_START: Self = Self(1 << 2);
    pub const STAR_POWER_END: Self = Self(1 << 3);
    pub const SOLO_START: Self = Self(1 << 4);
    pub const SOLO_END: Self = Self(1 << 5);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for NoteFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// A single note in an instrument track.
///
/// Neighbor and chord relations are arena ids into the owning [`NoteTrack`](crate::NoteTrack);
/// `previous`/`next` always link parent notes, children only know their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note<T> {
    pub tick: u32,
    pub tick_length: u32,
    /// Time in seconds
    pub time: f64,
    /// Sustain length in seconds
    pub time_length: f64,
    pub flags: NoteFlags,
    /// Flags as authored, restored by [`Note::reset_state`]
    original_flags: NoteFlags,
    /// Instrument payload (fret, note type, mask)
    pub data: T,
    pub previous: Option<NoteId>,
    pub next: Option<NoteId>,
    pub parent: Option<NoteId>,
    pub children: Vec<NoteId>,
    pub was_hit: bool,
    pub was_missed: bool,
}

impl<T> Note<T> {
    pub fn new(data: T, flags: NoteFlags, tick: u32, time: f64) -> Self {
        Self {
            tick,
            tick_length: 0,
            time,
            time_length: 0.0,
            flags,
            original_flags: flags,
            data,
            previous: None,
            next: None,
            parent: None,
            children: Vec::new(),
            was_hit: false,
            was_missed: false,
        }
    }

    pub fn with_length(mut self, tick_length: u32, time_length: f64) -> Self {
        self.tick_length = tick_length;
        self.time_length = time_length;
        self
    }

    pub fn is_parent(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_chord(&self) -> bool {
        self.flags.contains(NoteFlags::CHORD)
    }

    pub fn is_star_power(&self) -> bool {
        self.flags.contains(NoteFlags::STAR_POWER)
    }

    pub fn is_star_power_start(&self) -> bool {
        self.flags.contains(NoteFlags::STAR_POWER_START)
    }

    pub fn is_star_power_end(&self) -> bool {
        self.flags.contains(NoteFlags::STAR_POWER_END)
    }

    pub fn is_solo_start(&self) -> bool {
        self.flags.contains(NoteFlags::SOLO_START)
    }

    pub fn is_solo_end(&self) -> bool {
        self.flags.contains(NoteFlags::SOLO_END)
    }

    /// Hit or missed. Terminal: neither flag is ever cleared outside a reset.
    pub fn is_resolved(&self) -> bool {
        self.was_hit || self.was_missed
    }

    /// Set flags that survive [`Note::reset_state`] (chart loading time only).
    pub fn set_authored_flags(&mut self, flags: NoteFlags) {
        self.flags = flags;
        self.original_flags = flags;
    }

    pub fn original_flags(&self) -> NoteFlags {
        self.original_flags
    }

    pub fn reset_state(&mut self) {
        self.was_hit = false;
        self.was_missed = false;
        self.flags = self.original_flags;
    }
}
