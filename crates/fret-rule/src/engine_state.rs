/// Instrument-independent simulation state.
///
/// Owned by the engine core and reinitialized on reset; callers only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseEngineState {
    pub current_time: f64,
    pub last_update_time: f64,
    pub current_tick: u32,
    pub last_tick: u32,

    /// Index of the next unresolved parent note; never decreases between resets
    pub note_index: usize,
    pub last_queued_input_time: f64,

    pub current_star_index: usize,
    pub current_solo_index: usize,
    pub is_solo_active: bool,

    /// Tick the active star power drain is measured from
    pub star_power_base_tick: u32,
    /// Meter amount at `star_power_base_tick`
    pub star_power_base_amount: f64,
    /// Projected deactivation time of active star power
    pub star_power_end_time: Option<f64>,
}

impl Default for BaseEngineState {
    fn default() -> Self {
        Self {
            current_time: f64::NEG_INFINITY,
            last_update_time: f64::NEG_INFINITY,
            current_tick: 0,
            last_tick: 0,
            note_index: 0,
            last_queued_input_time: f64::NEG_INFINITY,
            current_star_index: 0,
            current_solo_index: 0,
            is_solo_active: false,
            star_power_base_tick: 0,
            star_power_base_amount: 0.0,
            star_power_end_time: None,
        }
    }
}

impl BaseEngineState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
