//! # Phase Segmentation Engine
//!
//! Turns each player's shots within a rally into a few tactical phases:
//!
//! 1. Bucket every stroke label through the injected [`ShotBucketer`]
//! 2. Raw scan into same-category runs (serves are isolated)
//! 3. Merge runs shorter than `min_phase_length` into neighbors
//!
//! Independent of the tempo engine; both read the same rallies.

pub mod category;
pub mod merge;
pub mod narrative;
pub mod segment;

pub use category::{CategoryTable, KeywordBucketer, ShotBucketer, TacticalCategory};
pub use merge::merge_short_segments;
pub use narrative::{
    build_narrative, find_turning_points, ControlBand, RallyResult, SwingDirection, TurningPoint,
};
pub use segment::{raw_segments, PhaseSegment};

use serde::{Deserialize, Serialize};

use crate::config::PhaseConfig;
use crate::models::{Player, RallyShots, ShotEvent};

/// Segment and merge one player's shots (stroke order).
pub fn detect_phases<B>(shots: &[&ShotEvent], bucketer: &B, min_phase_length: usize) -> Vec<PhaseSegment>
where
    B: ShotBucketer + ?Sized,
{
    let mut segments = raw_segments(shots, bucketer);
    merge_short_segments(&mut segments, min_phase_length);
    segments
}

/// Phases, turning points and narrative of one player in one rally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyPhases {
    pub rally_id: String,
    pub game_number: u32,
    pub rally_number: u32,
    pub player: Player,
    pub shot_count: usize,
    pub rally_winner: Option<Player>,
    pub rally_loser: Option<Player>,
    /// This player's result; `None` when the rally outcome is unknown
    pub result: Option<RallyResult>,
    pub phases: Vec<PhaseRecord>,
    pub turning_points: Vec<TurningPoint>,
    pub narrative: String,
}

/// Output view of a [`PhaseSegment`] with its derived labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub start_stroke_number: u32,
    pub end_stroke_number: u32,
    pub category: TacticalCategory,
    pub label: String,
    pub shot_count: usize,
    pub mean_effectiveness: Option<f64>,
    pub control: Option<ControlBand>,
    pub is_serve: bool,
    pub components: Vec<TacticalCategory>,
}

impl From<&PhaseSegment> for PhaseRecord {
    fn from(seg: &PhaseSegment) -> Self {
        Self {
            start_stroke_number: seg.start_stroke_number,
            end_stroke_number: seg.end_stroke_number,
            category: seg.category,
            label: seg.label().to_string(),
            shot_count: seg.shot_count,
            mean_effectiveness: seg.mean_effectiveness,
            control: seg.control(),
            is_serve: seg.is_serve,
            components: seg.components.clone(),
        }
    }
}

impl RallyPhases {
    /// `Serve(1-1) → Attacking(3-5) → Reset/Baseline(7-13)`
    pub fn summary_line(&self) -> String {
        self.phases
            .iter()
            .map(|p| {
                format!(
                    "{}({}-{})",
                    p.label, p.start_stroke_number, p.end_stroke_number
                )
            })
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// Phases for both players of every rally, rallies in input order.
///
/// A player with no shots in a rally still gets an (empty) entry.
pub fn segment_match<B>(
    rallies: &[RallyShots<'_>],
    bucketer: &B,
    config: &PhaseConfig,
) -> Vec<RallyPhases>
where
    B: ShotBucketer + ?Sized,
{
    let mut out = Vec::with_capacity(rallies.len() * 2);
    for rally in rallies {
        let (game_number, rally_number) = rally
            .shots
            .first()
            .map(|s| (s.game_number, s.rally_number))
            .unwrap_or((0, 0));
        let outcome = rally.outcome();
        for player in [Player::A, Player::B] {
            let shots = rally.by_player(player);
            let segments = detect_phases(&shots, bucketer, config.min_phase_length);
            let turning_points = find_turning_points(&shots, config.turning_point_threshold);
            let result = outcome.map(|o| {
                if o.winner == player {
                    RallyResult::Win
                } else {
                    RallyResult::Loss
                }
            });
            out.push(RallyPhases {
                rally_id: rally.rally_id.to_string(),
                game_number,
                rally_number,
                player,
                shot_count: shots.len(),
                rally_winner: outcome.map(|o| o.winner),
                rally_loser: outcome.map(|o| o.loser),
                result,
                narrative: build_narrative(&segments, &turning_points, result),
                phases: segments.iter().map(PhaseRecord::from).collect(),
                turning_points,
            });
        }
    }
    log::debug!(
        "segmented {} rallies into {} phases",
        rallies.len(),
        out.iter().map(|r| r.phases.len()).sum::<usize>()
    );
    out
}
