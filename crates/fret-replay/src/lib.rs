// Replay recording, autoplay input generation, replay verification

pub mod autoplay;
pub mod input_log;
pub mod replay_data;
pub mod verify;

pub use autoplay::create_autoplay_log;
pub use replay_data::{ReplayData, chart_hash, read_replay, write_replay};
pub use verify::{StatsMismatch, VerifyReport, replay_to_end, verify};
