use std::ops::{Index, IndexMut};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::note::{Note, NoteFlags};

/// Stable arena id of a note inside a [`NoteTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(pub usize);

/// Arena of notes for one instrument difficulty.
///
/// Parents are kept in chart order (tick, then insertion order) and linked through
/// `previous`/`next`. Chord children live in the same arena and point back to their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTrack<T> {
    notes: Vec<Note<T>>,
    parents: Vec<NoteId>,
}

impl<T> Default for NoteTrack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NoteTrack<T> {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Append a parent note and link it after the current last parent.
    pub fn push(&mut self, mut note: Note<T>) -> Result<NoteId> {
        let id = NoteId(self.notes.len());
        let previous = self.parents.last().copied();

        if let Some(prev) = previous {
            let prev_note = &self.notes[prev.0];
            if note.tick < prev_note.tick || note.time < prev_note.time {
                bail!(
                    "note at tick {} ({}s) pushed after note at tick {} ({}s)",
                    note.tick,
                    note.time,
                    prev_note.tick,
                    prev_note.time
                );
            }
        }

        note.previous = previous;
        note.next = None;
        note.parent = None;
        self.notes.push(note);
        if let Some(prev) = previous {
            self.notes[prev.0].next = Some(id);
        }
        self.parents.push(id);
        Ok(id)
    }

    /// Attach a chord child to `parent`. The parent gains [`NoteFlags::CHORD`].
    pub fn add_child(&mut self, parent: NoteId, mut child: Note<T>) -> Result<NoteId> {
        let Some(parent_note) = self.notes.get(parent.0) else {
            bail!("parent note {} does not exist", parent.0);
        };
        if !parent_note.is_parent() {
            bail!("note {} is a child and cannot own chord notes", parent.0);
        }
        if child.tick != parent_note.tick {
            bail!(
                "chord child at tick {} does not match parent tick {}",
                child.tick,
                parent_note.tick
            );
        }
        let parent_time = parent_note.time;

        let id = NoteId(self.notes.len());
        child.parent = Some(parent);
        child.previous = None;
        child.next = None;
        child.time = parent_time;
        self.notes.push(child);

        let parent_note = &mut self.notes[parent.0];
        parent_note.children.push(id);
        let flags = parent_note.original_flags().union(NoteFlags::CHORD);
        parent_note.set_authored_flags(flags);
        Ok(id)
    }

    /// Number of parent notes (playable chart positions).
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Number of notes including chord children.
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Parent id at chart position `index`.
    pub fn parent_at(&self, index: usize) -> Option<NoteId> {
        self.parents.get(index).copied()
    }

    pub fn parent_ids(&self) -> &[NoteId] {
        &self.parents
    }

    pub fn get(&self, id: NoteId) -> Option<&Note<T>> {
        self.notes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note<T>> {
        self.notes.get_mut(id.0)
    }

    /// Iterate parents in chart order.
    pub fn parents(&self) -> impl Iterator<Item = (NoteId, &Note<T>)> {
        self.parents.iter().map(|&id| (id, &self.notes[id.0]))
    }

    pub fn parent_or_self(&self, id: NoteId) -> NoteId {
        self.notes[id.0].parent.unwrap_or(id)
    }

    /// The parent followed by its children.
    pub fn all_notes(&self, id: NoteId) -> Vec<NoteId> {
        let mut ids = Vec::with_capacity(self.notes[id.0].children.len() + 1);
        ids.push(id);
        ids.extend_from_slice(&self.notes[id.0].children);
        ids
    }

    /// True once `id` and every chord child of it are hit or missed.
    pub fn was_fully_hit_or_missed(&self, id: NoteId) -> bool {
        let note = &self.notes[id.0];
        note.is_resolved()
            && note
                .children
                .iter()
                .all(|child| self.notes[child.0].is_resolved())
    }

    pub fn reset_state(&mut self) {
        for note in &mut self.notes {
            note.reset_state();
        }
    }
}

impl<T> Index<NoteId> for NoteTrack<T> {
    type Output = Note<T>;

    fn index(&self, id: NoteId) -> &Note<T> {
        &self.notes[id.0]
    }
}

impl<T> IndexMut<NoteId> for NoteTrack<T> {
    fn index_mut(&mut self, id: NoteId) -> &mut Note<T> {
        &mut self.notes[id.0]
    }
}
