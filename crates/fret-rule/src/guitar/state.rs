use crate::engine_timer::EngineTimer;

use super::parameters::GuitarEngineParameters;

/// Five-fret input and leniency state.
#[derive(Debug, Clone, PartialEq)]
pub struct GuitarEngineState {
    /// Held frets, green = bit 0
    pub button_mask: u8,
    /// Held frets before the latest fret input
    pub last_button_mask: u8,
    /// Frets held at the last hopo/tap hit; cleared once the held frets change
    pub tap_button_mask: u8,

    pub has_strummed: bool,
    pub has_fretted: bool,
    /// Latest fret input was a press, not a release
    pub is_fret_press: bool,
    pub star_power_requested: bool,

    pub strum_leniency_timer: EngineTimer,
    pub hopo_leniency_timer: EngineTimer,
    /// Time of the latest fret input
    pub fret_press_time: f64,

    pub infinite_front_end_armed: bool,
    pub was_note_ghosted: bool,

    /// Running while whammy input keeps arriving
    pub whammy_timer: EngineTimer,
    pub whammy_requested: bool,
    /// Ticks whammied on star power sustains, not yet added to the meter
    pub whammy_ticks: u32,
}

impl GuitarEngineState {
    pub fn new(params: &GuitarEngineParameters) -> Self {
        Self::with_timers(
            params.strum_leniency,
            params.hopo_leniency,
            params.whammy_timer_threshold,
        )
    }

    fn with_timers(strum_leniency: f64, hopo_leniency: f64, whammy_threshold: f64) -> Self {
        Self {
            button_mask: 0,
            last_button_mask: 0,
            tap_button_mask: 0,
            has_strummed: false,
            has_fretted: false,
            is_fret_press: false,
            star_power_requested: false,
            strum_leniency_timer: EngineTimer::new(strum_leniency),
            hopo_leniency_timer: EngineTimer::new(hopo_leniency),
            fret_press_time: f64::NEG_INFINITY,
            infinite_front_end_armed: false,
            was_note_ghosted: false,
            whammy_timer: EngineTimer::new(whammy_threshold),
            whammy_requested: false,
            whammy_ticks: 0,
        }
    }

    pub fn reset(&mut self, keep_buttons: bool) {
        let button_mask = if keep_buttons { self.button_mask } else { 0 };
        *self = Self {
            button_mask,
            last_button_mask: button_mask,
            ..Self::with_timers(
                self.strum_leniency_timer.threshold(),
                self.hopo_leniency_timer.threshold(),
                self.whammy_timer.threshold(),
            )
        };
    }

    /// Clear the per-input flags once an input has been resolved.
    pub fn clear_input_flags(&mut self) {
        self.has_strummed = false;
        self.has_fretted = false;
        self.is_fret_press = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_buttons_when_asked() {
        let params = GuitarEngineParameters::default();
        let mut state = GuitarEngineState::new(&params);
        state.button_mask = 0b00101;
        state.has_strummed = true;
        state.strum_leniency_timer.start(1.0);
        state.whammy_timer.start(1.0);
        state.whammy_ticks = 120;

        state.reset(true);
        assert_eq!(state.button_mask, 0b00101);
        assert!(!state.has_strummed);
        assert!(!state.strum_leniency_timer.is_enabled());
        assert_eq!(state.strum_leniency_timer.threshold(), 0.05);
        assert!(!state.whammy_timer.is_enabled());
        assert_eq!(state.whammy_ticks, 0);

        state.reset(false);
        assert_eq!(state, GuitarEngineState::new(&params));
    }
}
