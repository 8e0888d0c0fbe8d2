// Replay verification: re-run recorded inputs and compare against the recorded stats.

use anyhow::{Context, Result, bail};
use fret_model::{GuitarNote, InstrumentDifficulty, SyncTrack};
use fret_rule::{FiveFretEngine, GameInput, GuitarAction, GuitarStats};

use crate::replay_data::{ReplayData, chart_hash};

/// Reset `engine`, feed it `inputs` up to `end_time`, and return the final stats.
pub fn replay_to_end(
    engine: &mut FiveFretEngine,
    inputs: &[GameInput<GuitarAction>],
    end_time: f64,
) -> GuitarStats {
    let consumed = engine.process_up_to_time(end_time, inputs);
    if consumed < inputs.len() {
        log::warn!(
            "{} recorded inputs are after the replay end time {end_time}",
            inputs.len() - consumed
        );
    }
    engine.stats().clone()
}

/// A stat that differs between the recording and the re-run.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsMismatch {
    pub field: &'static str,
    pub recorded: String,
    pub replayed: String,
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub replayed: GuitarStats,
    pub mismatches: Vec<StatsMismatch>,
}

impl VerifyReport {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Re-run a validated replay on `chart` and compare the result with its recorded stats.
///
/// Fails when the replay was recorded on another chart, carries no stats, or still holds
/// its input log in compressed form.
pub fn verify(
    replay: &ReplayData,
    chart: InstrumentDifficulty<GuitarNote>,
    sync_track: SyncTrack,
) -> Result<VerifyReport> {
    if replay.input_data.is_some() {
        bail!("replay input log is still compressed; validate it first");
    }
    let hash = chart_hash(&chart);
    if !replay.chart_hash.is_empty() && replay.chart_hash != hash {
        bail!(
            "replay was recorded on chart {}, not {hash}",
            replay.chart_hash
        );
    }
    let recorded = replay
        .stats()?
        .context("replay carries no recorded stats")?;
    replay.parameters.validate()?;

    let mut engine =
        FiveFretEngine::new_five_fret(chart, sync_track, replay.parameters.clone(), false);
    let replayed = replay_to_end(&mut engine, &replay.inputs, replay.end_time);

    let mismatches = compare_stats(&recorded, &replayed);
    for mismatch in &mismatches {
        log::debug!(
            "replay mismatch on {}: recorded {}, replayed {}",
            mismatch.field,
            mismatch.recorded,
            mismatch.replayed
        );
    }
    Ok(VerifyReport {
        replayed,
        mismatches,
    })
}

fn compare_stats(recorded: &GuitarStats, replayed: &GuitarStats) -> Vec<StatsMismatch> {
    let (a, b) = (&recorded.base, &replayed.base);
    let mut mismatches = Vec::new();
    let mut check = |field: &'static str, recorded: String, replayed: String| {
        if recorded != replayed {
            mismatches.push(StatsMismatch {
                field,
                recorded,
                replayed,
            });
        }
    };

    check("committed_score", a.committed_score.to_string(), b.committed_score.to_string());
    check("solo_bonuses", a.solo_bonuses.to_string(), b.solo_bonuses.to_string());
    check("combo", a.combo.to_string(), b.combo.to_string());
    check("max_combo", a.max_combo.to_string(), b.max_combo.to_string());
    check("notes_hit", a.notes_hit.to_string(), b.notes_hit.to_string());
    check("notes_missed", a.notes_missed.to_string(), b.notes_missed.to_string());
    check(
        "star_power_phrases_hit",
        a.star_power_phrases_hit.to_string(),
        b.star_power_phrases_hit.to_string(),
    );
    check(
        "star_power_activation_count",
        a.star_power_activation_count.to_string(),
        b.star_power_activation_count.to_string(),
    );
    // Bit patterns, since re-runs are expected to be exact
    check(
        "star_power_amount",
        format!("{:?}", a.star_power_amount.to_bits()),
        format!("{:?}", b.star_power_amount.to_bits()),
    );
    check(
        "overstrums",
        recorded.overstrums.to_string(),
        replayed.overstrums.to_string(),
    );
    check(
        "hopos_strummed",
        recorded.hopos_strummed.to_string(),
        replayed.hopos_strummed.to_string(),
    );
    check(
        "ghost_inputs",
        recorded.ghost_inputs.to_string(),
        replayed.ghost_inputs.to_string(),
    );
    mismatches
}
