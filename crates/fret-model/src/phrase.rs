use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhraseType {
    StarPower,
    Solo,
}

/// A tick/time span of a chart with special scoring meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub kind: PhraseType,
    pub tick: u32,
    pub tick_length: u32,
    pub time: f64,
    pub time_length: f64,
}

impl Phrase {
    pub fn new(kind: PhraseType, tick: u32, tick_length: u32, time: f64, time_length: f64) -> Self {
        Self {
            kind,
            tick,
            tick_length,
            time,
            time_length,
        }
    }

    pub fn tick_end(&self) -> u32 {
        self.tick + self.tick_length
    }

    /// Whether `tick` falls inside `[tick, tick_end)`.
    ///
    /// Zero-length phrases contain only their own tick.
    pub fn contains_tick(&self, tick: u32) -> bool {
        if self.tick_length == 0 {
            return tick == self.tick;
        }
        tick >= self.tick && tick < self.tick_end()
    }
}
