use std::io::{Read, Write};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine_stats::{BaseStats, EngineStats, check_version, read_u32, write_u32};

/// Five-fret guitar stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuitarStats {
    pub base: BaseStats,
    pub overstrums: u32,
    /// Strums swallowed by hopo leniency
    pub hopos_strummed: u32,
    pub ghost_inputs: u32,
}

impl EngineStats for GuitarStats {
    fn base(&self) -> &BaseStats {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseStats {
        &mut self.base
    }

    fn reset(&mut self) {
        self.base.reset();
        self.overstrums = 0;
        self.hopos_strummed = 0;
        self.ghost_inputs = 0;
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.base.write_to(writer)?;
        write_u32(writer, self.overstrums)?;
        write_u32(writer, self.hopos_strummed)?;
        write_u32(writer, self.ghost_inputs)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        check_version(version)?;
        Ok(Self {
            base: BaseStats::read_from(reader, version)?,
            overstrums: read_u32(reader)?,
            hopos_strummed: read_u32(reader)?,
            ghost_inputs: if version >= 2 { read_u32(reader)? } else { 0 },
        })
    }
}
