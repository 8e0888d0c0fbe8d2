// Autoplay input generation: fret and strum inputs that play a chart perfectly through the
// regular (non-bot) hit logic.

use fret_model::{GuitarNote, NoteTrack};
use fret_rule::{GameInput, GuitarAction};

/// Create an autoplay input log for a guitar track.
///
/// For each parent note, at the note's time:
/// - release every held fret that is not part of the note
/// - press every fret of the note that is not held yet
/// - strum
///
/// Hopos and taps are usually already hit by the fret change; their strum then falls in the
/// hopo leniency and is ignored.
pub fn create_autoplay_log(track: &NoteTrack<GuitarNote>) -> Vec<GameInput<GuitarAction>> {
    let mut inputs = Vec::with_capacity(track.len() * 3);
    let mut held = 0u8;

    for (_, note) in track.parents() {
        let time = note.time;
        let mask = note.data.note_mask;

        for (bit, &fret) in GuitarAction::FRETS.iter().enumerate() {
            let fret_mask = 1 << bit;
            if held & fret_mask != 0 && mask & fret_mask == 0 {
                inputs.push(GameInput::button(time, fret, false));
            }
        }
        for (bit, &fret) in GuitarAction::FRETS.iter().enumerate() {
            let fret_mask = 1 << bit;
            if held & fret_mask == 0 && mask & fret_mask != 0 {
                inputs.push(GameInput::button(time, fret, true));
            }
        }
        held = mask;

        inputs.push(GameInput::button(time, GuitarAction::StrumDown, true));
    }

    inputs
}
