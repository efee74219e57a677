//! Raw phase segmentation: one left-to-right pass over a player's shots.

use serde::{Deserialize, Serialize};

use super::category::{ShotBucketer, TacticalCategory};
use super::narrative::ControlBand;
use crate::models::ShotEvent;

/// A run of consecutive same-category shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSegment {
    pub start_stroke_number: u32,
    pub end_stroke_number: u32,
    pub category: TacticalCategory,
    pub shot_count: usize,
    /// Mean over shots with an effectiveness score
    pub mean_effectiveness: Option<f64>,
    pub is_serve: bool,
    /// Distinct categories absorbed by merging, in stroke order
    pub components: Vec<TacticalCategory>,
    #[serde(skip)]
    effectiveness_sum: f64,
    #[serde(skip)]
    effectiveness_n: usize,
}

impl PhaseSegment {
    fn open(shot: &ShotEvent, category: TacticalCategory, is_serve: bool) -> Self {
        let mut seg = Self {
            start_stroke_number: shot.stroke_number,
            end_stroke_number: shot.stroke_number,
            category,
            shot_count: 0,
            mean_effectiveness: None,
            is_serve,
            components: vec![category],
            effectiveness_sum: 0.0,
            effectiveness_n: 0,
        };
        seg.push(shot);
        seg
    }

    fn push(&mut self, shot: &ShotEvent) {
        self.end_stroke_number = shot.stroke_number;
        self.shot_count += 1;
        if let Some(eff) = shot.effectiveness.filter(|e| e.is_finite()) {
            self.effectiveness_sum += eff;
            self.effectiveness_n += 1;
        }
        self.refresh_mean();
    }

    fn refresh_mean(&mut self) {
        self.mean_effectiveness = if self.effectiveness_n > 0 {
            Some(self.effectiveness_sum / self.effectiveness_n as f64)
        } else {
            None
        };
    }

    /// Concatenate `next` onto `self`.
    ///
    /// The category of the longer side wins; on equal length the earlier
    /// segment keeps its category. Effectiveness is re-weighted by the
    /// number of scored shots on each side.
    pub(crate) fn absorb(&mut self, next: PhaseSegment) {
        if next.shot_count > self.shot_count {
            self.category = next.category;
        }
        self.end_stroke_number = next.end_stroke_number;
        self.shot_count += next.shot_count;
        self.effectiveness_sum += next.effectiveness_sum;
        self.effectiveness_n += next.effectiveness_n;
        for c in next.components {
            if !self.components.contains(&c) {
                self.components.push(c);
            }
        }
        self.refresh_mean();
    }

    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    pub fn control(&self) -> Option<ControlBand> {
        self.mean_effectiveness.map(ControlBand::from_effectiveness)
    }

    /// Number of shots that carried an effectiveness score.
    pub fn scored_shots(&self) -> usize {
        self.effectiveness_n
    }

    pub(crate) fn effectiveness_sum(&self) -> f64 {
        self.effectiveness_sum
    }
}

/// Split shots (one player, stroke order) into maximal same-category runs.
///
/// A serve shot always forms its own length-1 segment, and the shot after a
/// serve always opens a new one.
pub fn raw_segments<B>(shots: &[&ShotEvent], bucketer: &B) -> Vec<PhaseSegment>
where
    B: ShotBucketer + ?Sized,
{
    let mut segments: Vec<PhaseSegment> = Vec::new();

    for shot in shots {
        let bucket = bucketer.bucket(&shot.stroke_category);
        let is_serve = shot.is_serve || bucket == TacticalCategory::Serve;
        let category = if is_serve {
            TacticalCategory::Serve
        } else {
            bucket
        };

        match segments.last_mut() {
            Some(current) if !is_serve && !current.is_serve && current.category == category => {
                current.push(shot);
            }
            _ => segments.push(PhaseSegment::open(shot, category, is_serve)),
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::phase::category::KeywordBucketer;
    use crate::models::shot::test_support::{shot, with_eff};
    use crate::models::Player;

    #[test]
    fn test_runs_split_on_category_change() {
        let shots = vec![
            shot("r", 1, 0, Player::A, "serve_short"),
            shot("r", 3, 60, Player::A, "forehand_smash"),
            shot("r", 5, 120, Player::A, "backhand_smash"),
            shot("r", 7, 180, Player::A, "forehand_lift"),
        ];
        let refs: Vec<&ShotEvent> = shots.iter().collect();
        let segs = raw_segments(&refs, &KeywordBucketer);
        let cats: Vec<_> = segs.iter().map(|s| (s.category, s.shot_count)).collect();
        assert_eq!(
            cats,
            vec![
                (TacticalCategory::Serve, 1),
                (TacticalCategory::Attacking, 2),
                (TacticalCategory::Reset, 1),
            ]
        );
        assert_eq!(segs[1].start_stroke_number, 3);
        assert_eq!(segs[1].end_stroke_number, 5);
    }

    #[test]
    fn test_consecutive_serves_stay_separate() {
        let shots = vec![
            shot("r", 1, 0, Player::A, "serve_short"),
            shot("r", 2, 30, Player::A, "serve_long"),
        ];
        let refs: Vec<&ShotEvent> = shots.iter().collect();
        let segs = raw_segments(&refs, &KeywordBucketer);
        assert_eq!(segs.len(), 2);
        assert!(segs.iter().all(|s| s.is_serve && s.shot_count == 1));
    }

    #[test]
    fn test_mean_effectiveness_ignores_unscored() {
        let shots = vec![
            with_eff(shot("r", 1, 0, Player::B, "forehand_drive"), 60.0),
            shot("r", 3, 30, Player::B, "backhand_drive"),
            with_eff(shot("r", 5, 60, Player::B, "flat_push"), 80.0),
        ];
        let refs: Vec<&ShotEvent> = shots.iter().collect();
        let segs = raw_segments(&refs, &KeywordBucketer);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].mean_effectiveness, Some(70.0));
        assert_eq!(segs[0].scored_shots(), 2);
        assert_eq!(segs[0].control(), Some(ControlBand::Controlled));
    }

    #[test]
    fn test_absorb_weights_by_scored_shots() {
        let shots = vec![
            with_eff(shot("r", 1, 0, Player::A, "forehand_lift"), 30.0),
            with_eff(shot("r", 3, 30, Player::A, "forehand_smash"), 90.0),
            with_eff(shot("r", 5, 60, Player::A, "backhand_smash"), 60.0),
        ];
        let refs: Vec<&ShotEvent> = shots.iter().collect();
        let mut segs = raw_segments(&refs, &KeywordBucketer);
        let attack = segs.remove(1);
        segs[0].absorb(attack);
        let merged = &segs[0];
        assert_eq!(merged.category, TacticalCategory::Attacking);
        assert_eq!(merged.shot_count, 3);
        assert_eq!(merged.mean_effectiveness, Some(60.0));
        assert_eq!(
            merged.components,
            vec![TacticalCategory::Reset, TacticalCategory::Attacking]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(raw_segments(&[], &KeywordBucketer).is_empty());
    }
}
