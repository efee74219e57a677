//! Narrative signals attached to phases: control bands, turning points and
//! a one-line account of the rally from one player's side.

use serde::{Deserialize, Serialize};

use super::segment::PhaseSegment;
use crate::models::ShotEvent;

/// How well a player held a phase, from mean effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlBand {
    Dominated,
    Controlled,
    Contested,
    Struggled,
}

impl ControlBand {
    /// `> 70` dominated, `> 55` controlled, `> 40` contested, else struggled.
    pub fn from_effectiveness(mean: f64) -> Self {
        if mean > 70.0 {
            ControlBand::Dominated
        } else if mean > 55.0 {
            ControlBand::Controlled
        } else if mean > 40.0 {
            ControlBand::Contested
        } else {
            ControlBand::Struggled
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ControlBand::Dominated => "Dominated",
            ControlBand::Controlled => "Controlled",
            ControlBand::Contested => "Contested",
            ControlBand::Struggled => "Struggled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingDirection {
    Positive,
    Negative,
}

/// Shot where a player's effectiveness swung sharply from their previous shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    pub stroke_number: u32,
    pub stroke: String,
    pub effectiveness: f64,
    /// `effectiveness - previous effectiveness`
    pub swing: f64,
    pub direction: SwingDirection,
}

/// Consecutive scored shots of one player whose effectiveness differs by
/// at least `threshold`. Pairs with a missing score are skipped.
pub fn find_turning_points(shots: &[&ShotEvent], threshold: f64) -> Vec<TurningPoint> {
    shots
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].effectiveness?;
            let curr = pair[1].effectiveness?;
            let swing = curr - prev;
            if !swing.is_finite() || swing.abs() < threshold {
                return None;
            }
            Some(TurningPoint {
                stroke_number: pair[1].stroke_number,
                stroke: pair[1].stroke_category.clone(),
                effectiveness: curr,
                swing,
                direction: if swing > 0.0 {
                    SwingDirection::Positive
                } else {
                    SwingDirection::Negative
                },
            })
        })
        .collect()
}

/// A rally from one player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RallyResult {
    Win,
    Loss,
}

impl RallyResult {
    pub fn as_str(self) -> &'static str {
        match self {
            RallyResult::Win => "WIN",
            RallyResult::Loss => "LOSS",
        }
    }
}

fn phase_line(index: usize, phase: &PhaseSegment) -> String {
    let range = if phase.start_stroke_number == phase.end_stroke_number {
        format!("Shot {}", phase.start_stroke_number)
    } else {
        format!("Shots {}-{}", phase.start_stroke_number, phase.end_stroke_number)
    };
    let mut line = format!("Phase {} ({}): {} - ", index + 1, range, phase.label());
    match (phase.mean_effectiveness, phase.control()) {
        (Some(mean), Some(band)) => {
            line.push_str(&format!("avg {:.0}% → {}", mean, band.as_str()));
        }
        _ => line.push_str("no score"),
    }
    line
}

fn turning_point_line(tp: &TurningPoint) -> String {
    format!(
        "TURNING POINT Shot {}: {} ({:.0}% eff, {:+.0} swing)",
        tp.stroke_number, tp.stroke, tp.effectiveness, tp.swing
    )
}

/// First turning point whose swing wins `better` against every other.
fn pick_turning_point(
    tps: &[TurningPoint],
    better: impl Fn(f64, f64) -> bool,
) -> Option<&TurningPoint> {
    tps.iter().fold(None, |best, tp| match best {
        Some(b) if !better(tp.swing, b.swing) => Some(b),
        _ => Some(tp),
    })
}

/// Why the rally went the way it did. `None` without any scored shot.
fn result_reason(
    result: RallyResult,
    phases: &[PhaseSegment],
    turning_points: &[TurningPoint],
) -> Option<String> {
    let scored: usize = phases.iter().map(|p| p.scored_shots()).sum();
    if scored == 0 {
        return None;
    }
    let overall = phases.iter().map(|p| p.effectiveness_sum()).sum::<f64>() / scored as f64;
    let last = phases.last()?;
    let last_mean = last.mean_effectiveness.unwrap_or(50.0);

    let reason = match result {
        RallyResult::Win => {
            if overall > 70.0 {
                "Dominated throughout".to_string()
            } else if let Some(tp) = pick_turning_point(turning_points, |a, b| a > b) {
                format!("Key moment: Shot {}", tp.stroke_number)
            } else if phases.len() > 1 && last_mean > 60.0 {
                format!("Strong finish with {}", last.label())
            } else if phases.len() > 1 {
                "Capitalized on opportunities".to_string()
            } else {
                "Executed well".to_string()
            }
        }
        RallyResult::Loss => {
            if overall < 35.0 {
                "Outplayed throughout".to_string()
            } else if let Some(tp) = pick_turning_point(turning_points, |a, b| a < b) {
                format!("Lost momentum at Shot {}", tp.stroke_number)
            } else if phases.len() > 1 && last_mean < 40.0 {
                format!("Failed in {}", last.label())
            } else if phases.len() > 1 {
                "Couldn't convert opportunities".to_string()
            } else {
                "Opponent executed better".to_string()
            }
        }
    };
    Some(reason)
}

/// `Phase 1 (Shot 1): Serve - no score | ... | Result: WIN - Executed well`
///
/// Phases, then turning points, then the result, joined by ` | `. An
/// unknown result reads `Result: UNKNOWN` with no reason.
pub fn build_narrative(
    phases: &[PhaseSegment],
    turning_points: &[TurningPoint],
    result: Option<RallyResult>,
) -> String {
    let mut parts: Vec<String> = phases
        .iter()
        .enumerate()
        .map(|(i, p)| phase_line(i, p))
        .collect();
    parts.extend(turning_points.iter().map(turning_point_line));

    let outcome = match result {
        Some(r) => match result_reason(r, phases, turning_points) {
            Some(reason) => format!("Result: {} - {}", r.as_str(), reason),
            None => format!("Result: {}", r.as_str()),
        },
        None => "Result: UNKNOWN".to_string(),
    };
    parts.push(outcome);
    parts.join(" | ")
}
