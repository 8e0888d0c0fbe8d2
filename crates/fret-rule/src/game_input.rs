use serde::{Deserialize, Serialize};

/// A timestamped, already-normalized player input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameInput<A> {
    /// Song time in seconds
    pub time: f64,
    pub action: A,
    /// Pressed (true) or released (false)
    pub button: bool,
    /// Analog payload (e.g. whammy position)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer: Option<i32>,
}

impl<A> GameInput<A> {
    pub fn button(time: f64, action: A, pressed: bool) -> Self {
        Self {
            time,
            action,
            button: pressed,
            integer: None,
        }
    }

    pub fn integer(time: f64, action: A, value: i32) -> Self {
        Self {
            time,
            action,
            button: false,
            integer: Some(value),
        }
    }

    /// Same input moved to `time`.
    pub fn with_time(self, time: f64) -> Self {
        Self { time, ..self }
    }
}

/// Five-fret guitar input actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuitarAction {
    Green,
    Red,
    Yellow,
    Blue,
    Orange,
    StrumUp,
    StrumDown,
    StarPower,
    Whammy,
}

impl GuitarAction {
    pub const FRETS: [Self; 5] = [Self::Green, Self::Red, Self::Yellow, Self::Blue, Self::Orange];

    /// Every action, in the order used for compact codes.
    pub const ALL: [Self; 9] = [
        Self::Green,
        Self::Red,
        Self::Yellow,
        Self::Blue,
        Self::Orange,
        Self::StrumUp,
        Self::StrumDown,
        Self::StarPower,
        Self::Whammy,
    ];

    /// Stable one-byte code, the index into [`GuitarAction::ALL`].
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn is_fret(self) -> bool {
        self.fret_bit().is_some()
    }

    pub fn is_strum(self) -> bool {
        matches!(self, Self::StrumUp | Self::StrumDown)
    }

    /// Button mask bit of a fret action, `None` for non-fret actions.
    pub fn fret_bit(self) -> Option<u8> {
        match self {
            Self::Green => Some(1 << 0),
            Self::Red => Some(1 << 1),
            Self::Yellow => Some(1 << 2),
            Self::Blue => Some(1 << 3),
            Self::Orange => Some(1 << 4),
            _ => None,
        }
    }

    /// Fret action for a single mask bit index (0 = green).
    pub fn from_fret_index(index: usize) -> Option<Self> {
        Self::FRETS.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fret_bits() {
        assert_eq!(GuitarAction::Green.fret_bit(), Some(0b00001));
        assert_eq!(GuitarAction::Orange.fret_bit(), Some(0b10000));
        assert_eq!(GuitarAction::StrumUp.fret_bit(), None);
        assert!(GuitarAction::Blue.is_fret());
        assert!(!GuitarAction::StarPower.is_fret());
    }

    #[test]
    fn test_codes_follow_declaration_order() {
        for (i, action) in GuitarAction::ALL.iter().enumerate() {
            assert_eq!(action.code() as usize, i);
            assert_eq!(GuitarAction::from_code(i as u8), Some(*action));
        }
        assert_eq!(GuitarAction::from_code(9), None);
    }

    #[test]
    fn test_strum_actions() {
        assert!(GuitarAction::StrumUp.is_strum());
        assert!(GuitarAction::StrumDown.is_strum());
        assert!(!GuitarAction::Green.is_strum());
    }

    #[test]
    fn test_from_fret_index() {
        assert_eq!(GuitarAction::from_fret_index(2), Some(GuitarAction::Yellow));
        assert_eq!(GuitarAction::from_fret_index(5), None);
    }

    #[test]
    fn test_serde_omits_empty_integer() {
        let input = GameInput::button(1.25, GuitarAction::Red, true);
        let json = serde_json::to_string(&input).unwrap();
        assert!(!json.contains("integer"));
        let back: GameInput<GuitarAction> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }
}
