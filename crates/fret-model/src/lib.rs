// Chart data model: notes, note links, phrases, sync track

mod difficulty;
mod guitar_note;
mod note;
mod note_track;
mod phrase;
mod sync_track;

pub use difficulty::InstrumentDifficulty;
pub use guitar_note::{FiveFretGuitarFret, GuitarNote, GuitarNoteType};
pub use note::{Note, NoteFlags};
pub use note_track::{NoteId, NoteTrack};
pub use phrase::{Phrase, PhraseType};
pub use sync_track::{SyncTrack, TempoChange};
