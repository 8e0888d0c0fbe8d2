// ReplayData: a recorded play with its compressed input log.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use fret_model::{GuitarNote, InstrumentDifficulty};
use fret_rule::{EngineStats, GameInput, GuitarAction, GuitarEngineParameters, GuitarStats};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::input_log::{decode_inputs, encode_inputs};

/// A recorded play: inputs, the parameters they were played with, and the resulting stats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayData {
    #[serde(default)]
    pub player: String,
    /// [`chart_hash`] of the chart that was played.
    #[serde(default)]
    pub chart_hash: String,
    /// Recorded inputs in time order (populated after `validate()`).
    #[serde(default)]
    pub inputs: Vec<GameInput<GuitarAction>>,
    /// Compressed input log (Base64 URL-safe encoded GZIP).
    /// Populated after `shrink()`, cleared after `validate()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<String>,
    #[serde(default)]
    pub parameters: GuitarEngineParameters,
    /// Final stats in the versioned binary layout, Base64 URL-safe encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_data: Option<String>,
    /// Song time the play was advanced to.
    #[serde(default)]
    pub end_time: f64,
    /// Play date (unix timestamp).
    #[serde(default)]
    pub date: i64,
}

impl ReplayData {
    /// Replay of a finished play on `chart`.
    pub fn record(
        chart: &InstrumentDifficulty<GuitarNote>,
        parameters: GuitarEngineParameters,
        inputs: Vec<GameInput<GuitarAction>>,
        stats: &GuitarStats,
        end_time: f64,
    ) -> Result<Self> {
        let mut replay = Self {
            chart_hash: chart_hash(chart),
            inputs,
            parameters,
            end_time,
            ..Default::default()
        };
        replay.set_stats(stats)?;
        Ok(replay)
    }

    pub fn set_stats(&mut self, stats: &GuitarStats) -> Result<()> {
        self.stats_data = Some(URL_SAFE.encode(stats.to_bytes()?));
        Ok(())
    }

    /// Recorded final stats, `None` if the replay carries none.
    pub fn stats(&self) -> Result<Option<GuitarStats>> {
        let Some(data) = &self.stats_data else {
            return Ok(None);
        };
        let bytes = URL_SAFE.decode(data).context("decoding replay stats")?;
        Ok(Some(GuitarStats::from_bytes(&bytes)?))
    }

    /// Compress `inputs` into `input_data`.
    ///
    /// After compression, `inputs` is cleared and `input_data` is populated.
    pub fn shrink(&mut self) -> Result<()> {
        if self.inputs.is_empty() {
            return Ok(());
        }

        let raw = encode_inputs(&self.inputs);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        let gzip_buf = encoder.finish()?;

        self.input_data = Some(URL_SAFE.encode(&gzip_buf));
        self.inputs.clear();
        Ok(())
    }

    /// Decompress `input_data` into `inputs` and drop inputs with a non-finite time.
    ///
    /// After validation, `input_data` is cleared.
    /// Returns `true` if `inputs` is non-empty after validation.
    pub fn validate(&mut self) -> Result<bool> {
        if let Some(data) = self.input_data.take() {
            let gzip_data = URL_SAFE.decode(&data).context("decoding replay input log")?;
            let mut raw = Vec::new();
            GzDecoder::new(&gzip_data[..])
                .read_to_end(&mut raw)
                .context("decompressing replay input log")?;
            self.inputs = decode_inputs(&raw)?;
        }

        let before = self.inputs.len();
        self.inputs.retain(|input| input.time.is_finite());
        if self.inputs.len() < before {
            log::warn!(
                "dropped {} replay inputs with invalid times",
                before - self.inputs.len()
            );
        }
        Ok(!self.inputs.is_empty())
    }
}

/// SHA-256 over the tick layout, note kinds and phrases of a chart.
///
/// Times are left out, so the hash only depends on what the chart authored.
pub fn chart_hash(chart: &InstrumentDifficulty<GuitarNote>) -> String {
    let mut hasher = Sha256::new();
    for (id, note) in chart.notes.parents() {
        hasher.update(note.tick.to_le_bytes());
        hasher.update([
            note.data.note_mask,
            note.data.note_type as u8,
            note.data.is_open() as u8,
            note.data.disjoint as u8,
        ]);
        // Disjoint chords may sustain each fret for a different length
        for fret in chart.notes.all_notes(id) {
            hasher.update(chart.notes[fret].tick_length.to_le_bytes());
        }
    }
    for phrase in &chart.phrases {
        hasher.update([phrase.kind as u8]);
        hasher.update(phrase.tick.to_le_bytes());
        hasher.update(phrase.tick_length.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Read a replay file (GZIP-compressed JSON).
pub fn read_replay(path: &Path) -> Result<ReplayData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening replay {}", path.display()))?;
    let decoder = GzDecoder::new(file);
    let mut replay: ReplayData = serde_json::from_reader(decoder)
        .with_context(|| format!("parsing replay {}", path.display()))?;
    replay.validate()?;
    Ok(replay)
}

/// Write a replay file (GZIP-compressed JSON).
pub fn write_replay(replay: &mut ReplayData, path: &Path) -> Result<()> {
    replay.shrink()?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating replay {}", path.display()))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    serde_json::to_writer(&mut encoder, &*replay)?;
    encoder.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fret_model::{FiveFretGuitarFret, GuitarNoteType, NoteTrack, Phrase, PhraseType};

    fn sample_inputs() -> Vec<GameInput<GuitarAction>> {
        vec![
            GameInput::button(0.8, GuitarAction::Green, true),
            GameInput::button(1.0, GuitarAction::StrumDown, true),
            GameInput::button(1.3, GuitarAction::Green, false),
            GameInput::button(1.3, GuitarAction::Red, true),
            GameInput::integer(1.4, GuitarAction::Whammy, 64),
            GameInput::button(1.5, GuitarAction::StrumUp, true),
        ]
    }

    fn sample_chart() -> InstrumentDifficulty<GuitarNote> {
        let mut notes = NoteTrack::new();
        notes
            .push_guitar_chord(&[FiveFretGuitarFret::Green], GuitarNoteType::Strum, 960, 1.0)
            .unwrap();
        notes
            .push_guitar_chord(&[FiveFretGuitarFret::Red], GuitarNoteType::Hopo, 1440, 1.5)
            .unwrap();
        InstrumentDifficulty::new(
            notes,
            vec![Phrase::new(PhraseType::StarPower, 960, 960, 1.0, 1.0)],
        )
    }

    #[test]
    fn test_shrink_validate_round_trip() {
        let original = sample_inputs();
        let mut replay = ReplayData {
            inputs: original.clone(),
            ..Default::default()
        };

        replay.shrink().unwrap();
        assert!(replay.inputs.is_empty());
        assert!(replay.input_data.is_some());

        assert!(replay.validate().unwrap());
        assert!(replay.input_data.is_none());
        assert_eq!(replay.inputs, original);
    }

    #[test]
    fn test_shrink_empty_inputs() {
        let mut replay = ReplayData::default();
        replay.shrink().unwrap();
        assert!(replay.input_data.is_none());
        assert!(!replay.validate().unwrap());
    }

    #[test]
    fn test_validate_rejects_corrupt_data() {
        let mut replay = ReplayData {
            input_data: Some("not base64 !!".into()),
            ..Default::default()
        };
        assert!(replay.validate().is_err());

        let mut replay = ReplayData {
            input_data: Some(URL_SAFE.encode(b"not gzip")),
            ..Default::default()
        };
        assert!(replay.validate().is_err());
    }

    #[test]
    fn test_validate_drops_invalid_times() {
        let mut replay = ReplayData {
            inputs: vec![
                GameInput::button(0.5, GuitarAction::Green, true),
                GameInput::button(f64::NAN, GuitarAction::Red, true),
                GameInput::button(f64::INFINITY, GuitarAction::Red, false),
                GameInput::button(0.7, GuitarAction::StrumDown, true),
            ],
            ..Default::default()
        };
        assert!(replay.validate().unwrap());
        assert_eq!(replay.inputs.len(), 2);
    }

    #[test]
    fn test_stats_snapshot() {
        let mut stats = GuitarStats::default();
        stats.base.notes_hit = 42;
        stats.overstrums = 3;

        let replay = ReplayData::record(
            &sample_chart(),
            GuitarEngineParameters::default(),
            sample_inputs(),
            &stats,
            3.0,
        )
        .unwrap();
        assert_eq!(replay.stats().unwrap(), Some(stats));
        assert_eq!(ReplayData::default().stats().unwrap(), None);
    }

    #[test]
    fn test_chart_hash_ignores_play_state() {
        let chart = sample_chart();
        let mut played = chart.clone();
        let first = played.notes.parent_ids()[0];
        played.notes[first].was_hit = true;
        assert_eq!(chart_hash(&chart), chart_hash(&played));
        assert_eq!(chart_hash(&chart).len(), 64);

        let mut edited = chart.clone();
        edited.phrases.clear();
        assert_ne!(chart_hash(&chart), chart_hash(&edited));

        let mut sustained = chart.clone();
        sustained.notes.set_guitar_sustain(first, 480, 0.5, false).unwrap();
        assert_ne!(chart_hash(&chart), chart_hash(&sustained));
        let mut disjoint = sustained.clone();
        disjoint.notes.set_guitar_sustain(first, 480, 0.5, true).unwrap();
        assert_ne!(chart_hash(&sustained), chart_hash(&disjoint));
    }

    #[test]
    fn test_replay_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("play.replay");

        let mut replay = ReplayData {
            player: "test_player".into(),
            date: 1_700_000_000,
            ..ReplayData::record(
                &sample_chart(),
                GuitarEngineParameters::casual(),
                sample_inputs(),
                &GuitarStats::default(),
                3.0,
            )
            .unwrap()
        };

        write_replay(&mut replay, &path).unwrap();
        let loaded = read_replay(&path).unwrap();

        assert_eq!(loaded.player, "test_player");
        assert_eq!(loaded.date, 1_700_000_000);
        assert_eq!(loaded.chart_hash, chart_hash(&sample_chart()));
        assert_eq!(loaded.parameters, GuitarEngineParameters::casual());
        assert_eq!(loaded.inputs, sample_inputs());
        assert_eq!(loaded.end_time, 3.0);
    }

    #[test]
    fn test_serde_json_round_trip() {
        let mut replay = ReplayData {
            player: "player1".into(),
            inputs: sample_inputs(),
            ..Default::default()
        };
        replay.shrink().unwrap();

        let json = serde_json::to_string(&replay).unwrap();
        let mut deserialized: ReplayData = serde_json::from_str(&json).unwrap();
        deserialized.validate().unwrap();

        assert_eq!(deserialized.player, "player1");
        assert_eq!(deserialized.inputs.len(), 6);
    }
}
