//! # Match Pipeline
//!
//! Runs both engines over one match. The engines share the grouped rallies
//! but not each other's output.

use serde::{Deserialize, Serialize};

use crate::analysis::phase::{segment_match, RallyPhases, ShotBucketer};
use crate::analysis::tempo::{
    BaselineFamily, BaselineRow, ClassifiedResponse, ComboFastSlow, ComboPattern, HighlightEvent,
    RallyTempoSummary, ServeReceiveSummary, TempoAnalysis,
};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{group_rallies, ShotEvent};
use crate::SCHEMA_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: BaselineFamily,
    pub count: usize,
}

/// Everything derived from one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub schema_version: u8,
    pub fps: f64,
    pub shot_count: usize,
    pub rally_count: usize,
    pub responses: Vec<ClassifiedResponse>,
    pub threshold_sources: Vec<SourceCount>,
    pub baselines: Vec<BaselineRow>,
    pub rally_tempo: Vec<RallyTempoSummary>,
    pub highlights: Vec<HighlightEvent>,
    pub combo_patterns: Vec<ComboPattern>,
    pub combo_fast_slow: Vec<ComboFastSlow>,
    pub serve_receive: Vec<ServeReceiveSummary>,
    pub phases: Vec<RallyPhases>,
}

/// Validate, then run the tempo and phase engines over `shots`.
///
/// `shots` must already be grouped by rally with strictly increasing
/// stroke numbers inside each rally.
pub fn analyze_match<B>(
    shots: &[ShotEvent],
    config: &AnalysisConfig,
    bucketer: &B,
) -> Result<MatchAnalysis>
where
    B: ShotBucketer + ?Sized,
{
    config.validate()?;
    let rallies = group_rallies(shots)?;

    let tempo = TempoAnalysis::run(&rallies, config);
    let phases = segment_match(&rallies, bucketer, &config.phase);

    let analysis = MatchAnalysis {
        schema_version: SCHEMA_VERSION,
        fps: config.tempo.fps,
        shot_count: shots.len(),
        rally_count: rallies.len(),
        threshold_sources: tempo
            .source_counts()
            .into_iter()
            .map(|(source, count)| SourceCount { source, count })
            .collect(),
        baselines: tempo.baselines.rows(),
        rally_tempo: tempo.rally_summaries(),
        highlights: tempo.highlights(config),
        combo_patterns: tempo.combo_patterns(config),
        combo_fast_slow: tempo.combo_fast_slow(config),
        serve_receive: tempo.serve_receive(),
        phases,
        responses: tempo.responses,
    };

    log::info!(
        "analyzed {} shots in {} rallies: {} responses, {} highlights",
        analysis.shot_count,
        analysis.rally_count,
        analysis.responses.len(),
        analysis.highlights.len()
    );
    Ok(analysis)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::shot::test_support::shot;
    use crate::models::{Player, ShotEvent};

    /// Six rallies of nine shots: an A serve, then alternating B/A.
    pub fn sample_match() -> Vec<ShotEvent> {
        let strokes = [
            "forehand_smash",
            "backhand_lift",
            "forehand_drop",
            "forehand_netkeep",
            "backhand_clear",
            "forehand_drive",
        ];
        let mut shots = Vec::new();
        let mut frame = 0i64;
        for rally in 1..=6u32 {
            let id = format!("1_{}", rally);
            shots.push(shot(&id, 1, frame, Player::A, "serve_short"));
            for stroke in 2..=9u32 {
                // 18..38 frames between hits, varied by rally and stroke
                frame += 18 + ((rally * 7 + stroke * 5) % 21) as i64;
                let player = if stroke % 2 == 0 { Player::B } else { Player::A };
                let label = strokes[((rally + stroke) % 6) as usize];
                shots.push(shot(&id, stroke, frame, player, label));
            }
            frame += 300;
        }
        shots
    }
}
