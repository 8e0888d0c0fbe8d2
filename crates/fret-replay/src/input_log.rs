// Fixed-size binary records for recorded guitar inputs.

use anyhow::{Result, anyhow, bail};
use fret_rule::{GameInput, GuitarAction};

/// Bytes per encoded input:
/// - 8 bytes: time in seconds, little-endian f64
/// - 1 byte: action code
/// - 1 byte: flags (bit 0 = button pressed, bit 1 = integer present)
/// - 4 bytes: integer value, little-endian i32 (0 when absent)
pub const RECORD_SIZE: usize = 14;

const FLAG_BUTTON: u8 = 1 << 0;
const FLAG_INTEGER: u8 = 1 << 1;

pub fn encode_inputs(inputs: &[GameInput<GuitarAction>]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(inputs.len() * RECORD_SIZE);
    for input in inputs {
        let mut flags = 0;
        if input.button {
            flags |= FLAG_BUTTON;
        }
        if input.integer.is_some() {
            flags |= FLAG_INTEGER;
        }
        raw.extend_from_slice(&input.time.to_le_bytes());
        raw.push(input.action.code());
        raw.push(flags);
        raw.extend_from_slice(&input.integer.unwrap_or(0).to_le_bytes());
    }
    raw
}

pub fn decode_inputs(raw: &[u8]) -> Result<Vec<GameInput<GuitarAction>>> {
    if raw.len() % RECORD_SIZE != 0 {
        bail!(
            "input log length {} is not a multiple of {RECORD_SIZE}",
            raw.len()
        );
    }

    let mut inputs = Vec::with_capacity(raw.len() / RECORD_SIZE);
    for (index, record) in raw.chunks_exact(RECORD_SIZE).enumerate() {
        let (time, rest) = record.split_at(8);
        let time = f64::from_le_bytes(time.try_into()?);
        let action = GuitarAction::from_code(rest[0])
            .ok_or_else(|| anyhow!("unknown action code {} in record {index}", rest[0]))?;
        let flags = rest[1];
        if flags & !(FLAG_BUTTON | FLAG_INTEGER) != 0 {
            bail!("unknown flags {flags:#04x} in record {index}");
        }
        let value = i32::from_le_bytes(rest[2..6].try_into()?);

        inputs.push(GameInput {
            time,
            action,
            button: flags & FLAG_BUTTON != 0,
            integer: (flags & FLAG_INTEGER != 0).then_some(value),
        });
    }
    Ok(inputs)
}
