// Five-fret guitar engine

mod five_fret;
mod parameters;
mod state;
mod stats;

pub use five_fret::{FiveFretEngine, FiveFretLogic, POINTS_PER_NOTE};
pub use parameters::GuitarEngineParameters;
pub use state::GuitarEngineState;
pub use stats::GuitarStats;
