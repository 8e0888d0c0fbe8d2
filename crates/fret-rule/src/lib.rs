// Timing and scoring engine: hit windows, event scheduling, hit logic, sustains, stats

/// Programming-contract violation: logged always, fatal in debug builds.
///
/// Release builds log and let the caller correct the situation and continue.
macro_rules! contract_violation {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
        debug_assert!(false, $($arg)*);
    }};
}

mod engine;
mod engine_core;
mod engine_event;
mod engine_parameters;
mod engine_state;
pub mod engine_stats;
mod engine_timer;
mod game_input;
pub mod guitar;
mod hit_window;
pub mod math;
mod solo_section;
pub mod sustain;

pub use engine::{Engine, HitLogic};
pub use engine_core::{EngineCore, WindowPosition};
pub use engine_event::EngineEvent;
pub use engine_parameters::BaseEngineParameters;
pub use engine_state::BaseEngineState;
pub use engine_stats::{BaseStats, EngineStats, STATS_VERSION};
pub use engine_timer::EngineTimer;
pub use game_input::{GameInput, GuitarAction};
pub use guitar::{FiveFretEngine, FiveFretLogic, GuitarEngineParameters, GuitarEngineState, GuitarStats};
pub use hit_window::HitWindowSettings;
pub use solo_section::{SoloSection, calculate_solo_bonus};
pub use sustain::ActiveSustain;

/// Star power gained when a star power phrase is completed (one quarter of the meter).
pub const STAR_POWER_PHRASE_GAIN: f64 = 0.25;

/// Minimum meter fill for activation.
pub const STAR_POWER_ACTIVATION_THRESHOLD: f64 = 0.5;

/// Beats a completely full meter lasts once activated.
pub const STAR_POWER_BEATS_PER_BAR: u32 = 32;

/// Consecutive hits per multiplier step.
pub const COMBO_PER_MULTIPLIER: u32 = 10;
