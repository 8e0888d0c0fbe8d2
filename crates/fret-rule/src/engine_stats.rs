// Engine stats and their fixed-layout binary form

use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Current binary layout version of persisted stats.
///
/// Version 1 has no star power activation count and no guitar ghost input count.
pub const STATS_VERSION: u32 = 2;

/// Instrument-independent stats.
///
/// Written by the engine as a side effect of hits, misses and scoring; never consulted by
/// hit logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Score from notes, excluding solo bonuses
    pub committed_score: i32,
    pub combo: u32,
    pub max_combo: u32,
    pub score_multiplier: u32,
    pub notes_hit: u32,
    pub notes_missed: u32,
    pub total_notes: u32,
    pub star_power_phrases_hit: u32,
    pub total_star_power_phrases: u32,
    /// Meter fill in bars, 0.0 to 1.0
    pub star_power_amount: f64,
    pub is_star_power_active: bool,
    pub star_power_activation_count: u32,
    /// Star rank plus progress towards the next one
    pub stars: f64,
    pub solo_bonuses: i32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            committed_score: 0,
            combo: 0,
            max_combo: 0,
            score_multiplier: 1,
            notes_hit: 0,
            notes_missed: 0,
            total_notes: 0,
            star_power_phrases_hit: 0,
            total_star_power_phrases: 0,
            star_power_amount: 0.0,
            is_star_power_active: false,
            star_power_activation_count: 0,
            stars: 0.0,
            solo_bonuses: 0,
        }
    }
}

impl BaseStats {
    pub fn total_score(&self) -> i32 {
        self.committed_score + self.solo_bonuses
    }

    /// Score that counts towards star ranks.
    pub fn star_score(&self) -> i32 {
        self.committed_score
    }

    /// Clear progress while keeping chart totals.
    pub fn reset(&mut self) {
        *self = Self {
            total_notes: self.total_notes,
            total_star_power_phrases: self.total_star_power_phrases,
            ..Self::default()
        };
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i32(writer, self.committed_score)?;
        write_u32(writer, self.combo)?;
        write_u32(writer, self.max_combo)?;
        write_u32(writer, self.score_multiplier)?;
        write_u32(writer, self.notes_hit)?;
        write_u32(writer, self.notes_missed)?;
        write_u32(writer, self.total_notes)?;
        write_u32(writer, self.star_power_phrases_hit)?;
        write_u32(writer, self.total_star_power_phrases)?;
        write_f64(writer, self.star_power_amount)?;
        write_bool(writer, self.is_star_power_active)?;
        write_u32(writer, self.star_power_activation_count)?;
        write_f64(writer, self.stars)?;
        write_i32(writer, self.solo_bonuses)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        check_version(version)?;
        Ok(Self {
            committed_score: read_i32(reader)?,
            combo: read_u32(reader)?,
            max_combo: read_u32(reader)?,
            score_multiplier: read_u32(reader)?,
            notes_hit: read_u32(reader)?,
            notes_missed: read_u32(reader)?,
            total_notes: read_u32(reader)?,
            star_power_phrases_hit: read_u32(reader)?,
            total_star_power_phrases: read_u32(reader)?,
            star_power_amount: read_f64(reader)?,
            is_star_power_active: read_bool(reader)?,
            star_power_activation_count: if version >= 2 { read_u32(reader)? } else { 0 },
            stars: read_f64(reader)?,
            solo_bonuses: read_i32(reader)?,
        })
    }
}

/// Stats of one instrument engine: the base stats plus instrument counters.
pub trait EngineStats: Default + Clone + std::fmt::Debug {
    fn base(&self) -> &BaseStats;
    fn base_mut(&mut self) -> &mut BaseStats;

    /// Clear progress while keeping chart totals.
    fn reset(&mut self);

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn read_from<R: Read>(reader: &mut R, version: u32) -> Result<Self>;

    /// Serialize with a leading version tag.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        write_u32(&mut buf, STATS_VERSION)?;
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;
        let version = read_u32(&mut reader).context("reading stats version")?;
        let stats = Self::read_from(&mut reader, version)?;
        if !reader.is_empty() {
            bail!("{} trailing bytes after stats", reader.len());
        }
        Ok(stats)
    }
}

impl EngineStats for BaseStats {
    fn base(&self) -> &BaseStats {
        self
    }

    fn base_mut(&mut self) -> &mut BaseStats {
        self
    }

    fn reset(&mut self) {
        BaseStats::reset(self);
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        BaseStats::write_to(self, writer)
    }

    fn read_from<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        BaseStats::read_from(reader, version)
    }
}

pub(crate) fn check_version(version: u32) -> Result<()> {
    if version == 0 || version > STATS_VERSION {
        bail!("unsupported stats version {version} (latest is {STATS_VERSION})");
    }
    Ok(())
}

pub(crate) fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_f64<W: Write>(writer: &mut W, value: f64) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    writer.write_all(&[value as u8])?;
    Ok(())
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).context("stats truncated")?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).context("stats truncated")?;
    Ok(i32::from_le_bytes(buf))
}

pub(crate) fn read_f64<R: Read>(reader: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf).context("stats truncated")?;
    Ok(f64::from_le_bytes(buf))
}

pub(crate) fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).context("stats truncated")?;
    match buf[0] {
        0 => Ok(false),
        1 => Ok(true),
        other => bail!("invalid bool byte {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BaseStats {
        BaseStats {
            committed_score: 12_345,
            combo: 17,
            max_combo: 80,
            score_multiplier: 2,
            notes_hit: 95,
            notes_missed: 5,
            total_notes: 100,
            star_power_phrases_hit: 2,
            total_star_power_phrases: 3,
            star_power_amount: 0.375,
            is_star_power_active: true,
            star_power_activation_count: 1,
            stars: 4.25,
            solo_bonuses: 450,
        }
    }

    #[test]
    fn test_total_score_includes_solo_bonus() {
        let stats = sample();
        assert_eq!(stats.total_score(), 12_795);
        assert_eq!(stats.star_score(), 12_345);
    }

    #[test]
    fn test_reset_keeps_totals() {
        let mut stats = sample();
        stats.reset();
        assert_eq!(stats.total_notes, 100);
        assert_eq!(stats.total_star_power_phrases, 3);
        assert_eq!(stats.committed_score, 0);
        assert_eq!(stats.score_multiplier, 1);
        assert!(!stats.is_star_power_active);
    }

    #[test]
    fn test_versioned_bytes() {
        let stats = sample();
        let bytes = stats.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &STATS_VERSION.to_le_bytes());
        assert_eq!(BaseStats::from_bytes(&bytes).unwrap(), stats);
    }

    #[test]
    fn test_version_one_layout_has_no_activation_count() {
        let stats = sample();
        let mut v2 = Vec::new();
        stats.write_to(&mut v2).unwrap();

        // committed..is_star_power_active is 9 * 4 + 8 + 1 bytes, then the activation count
        let split = 9 * 4 + 8 + 1;
        let mut v1 = 1u32.to_le_bytes().to_vec();
        v1.extend_from_slice(&v2[..split]);
        v1.extend_from_slice(&v2[split + 4..]);

        let read = BaseStats::from_bytes(&v1).unwrap();
        assert_eq!(read.star_power_activation_count, 0);
        assert_eq!(read.stars, stats.stars);
        assert_eq!(read.solo_bonuses, stats.solo_bonuses);
    }

    #[test]
    fn test_rejects_bad_input() {
        let bytes = sample().to_bytes().unwrap();
        assert!(BaseStats::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut future = bytes.clone();
        future[..4].copy_from_slice(&99u32.to_le_bytes());
        assert!(BaseStats::from_bytes(&future).is_err());

        let mut trailing = bytes;
        trailing.push(0);
        assert!(BaseStats::from_bytes(&trailing).is_err());
    }
}
