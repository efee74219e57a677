//! # Shot Events
//!
//! One row per shot within a rally. Frame numbers are the timing source of
//! truth; seconds are always derived through the configured fps.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::QualityBinConfig;
use crate::error::{AnalysisError, Result};

/// One of the two competitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    #[serde(alias = "P0", alias = "a")]
    A,
    #[serde(alias = "P1", alias = "b")]
    B,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// Parse a tracking-table token (`A`/`B` or `P0`/`P1`).
    pub fn from_token(token: &str) -> Option<Player> {
        match token.trim() {
            "A" | "a" | "P0" | "p0" => Some(Player::A),
            "B" | "b" | "P1" | "p1" => Some(Player::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Player::A => "A",
            Player::B => "B",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse bucket of a 0-100 effectiveness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityBin {
    Low,
    Medium,
    High,
}

impl QualityBin {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityBin::Low => "low",
            QualityBin::Medium => "medium",
            QualityBin::High => "high",
        }
    }
}

impl fmt::Display for QualityBin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rally-ending flag recorded on the final shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotOutcome {
    /// The hitter won the rally with this shot
    Winner,
    /// The hitter lost the rally with this shot (error, out, net)
    Error,
}

/// Who won and lost a rally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyOutcome {
    pub winner: Player,
    pub loser: Player,
}

impl RallyOutcome {
    pub fn won_by(winner: Player) -> Self {
        Self {
            winner,
            loser: winner.opponent(),
        }
    }
}

/// A single shot within a rally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEvent {
    pub rally_id: String,
    pub game_number: u32,
    pub rally_number: u32,
    /// 1-based, strictly increasing within a rally
    pub stroke_number: u32,
    pub frame_number: i64,
    pub player: Player,
    /// Raw technique label (e.g. `forehand_smash`)
    pub stroke_category: String,
    #[serde(default)]
    pub is_serve: bool,
    /// 0-100, absent when the shot was not scored
    #[serde(default)]
    pub effectiveness: Option<f64>,
    /// Rally winner as annotated on the row, if the table carries one
    #[serde(default)]
    pub rally_winner: Option<Player>,
    #[serde(default)]
    pub outcome: Option<ShotOutcome>,
}

impl ShotEvent {
    pub fn time_sec(&self, fps: f64) -> f64 {
        self.frame_number as f64 / fps
    }

    pub fn quality_bin(&self, bins: &QualityBinConfig) -> Option<QualityBin> {
        bins.bin(self.effectiveness)
    }
}

/// Shots of one rally, in stroke order.
#[derive(Debug, Clone)]
pub struct RallyShots<'a> {
    pub rally_id: &'a str,
    pub shots: Vec<&'a ShotEvent>,
}

impl<'a> RallyShots<'a> {
    /// Shots hit by `player`, in stroke order.
    pub fn by_player(&self, player: Player) -> Vec<&'a ShotEvent> {
        self.shots
            .iter()
            .copied()
            .filter(|s| s.player == player)
            .collect()
    }

    /// Winner and loser of the rally.
    ///
    /// An annotated `rally_winner` on the first shot wins; otherwise the
    /// last shot's outcome flag decides. `None` when neither is present.
    pub fn outcome(&self) -> Option<RallyOutcome> {
        if let Some(winner) = self.shots.first().and_then(|s| s.rally_winner) {
            return Some(RallyOutcome::won_by(winner));
        }
        let last = self.shots.last()?;
        match last.outcome? {
            ShotOutcome::Winner => Some(RallyOutcome::won_by(last.player)),
            ShotOutcome::Error => Some(RallyOutcome::won_by(last.player.opponent())),
        }
    }
}

/// Group shots by rally, preserving first-appearance order of rallies.
///
/// Stroke numbers must be strictly increasing within each rally in input
/// order; anything else is rejected rather than reordered.
pub fn group_rallies(shots: &[ShotEvent]) -> Result<Vec<RallyShots<'_>>> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut rallies: Vec<RallyShots<'_>> = Vec::new();

    for shot in shots {
        if shot.rally_id.trim().is_empty() {
            return Err(AnalysisError::EmptyRallyId {
                stroke_number: shot.stroke_number,
            });
        }

        let idx = *index.entry(shot.rally_id.as_str()).or_insert_with(|| {
            rallies.push(RallyShots {
                rally_id: shot.rally_id.as_str(),
                shots: Vec::new(),
            });
            rallies.len() - 1
        });

        let rally = &mut rallies[idx];
        if let Some(prev) = rally.shots.last() {
            if shot.stroke_number <= prev.stroke_number {
                return Err(AnalysisError::NonMonotonicStroke {
                    rally_id: shot.rally_id.clone(),
                    previous: prev.stroke_number,
                    found: shot.stroke_number,
                });
            }
        }
        rally.shots.push(shot);
    }

    Ok(rallies)
}
