//! # Tempo Classification
//!
//! Resolves a `(p10, p90)` threshold for every sample by walking
//! [`FALLBACK_ORDER`] and labels the clamped response time fast / normal /
//! slow. Boundaries are inclusive toward fast and slow.
//!
//! The robust z-score is a separate signal, always computed against the
//! player-level baseline rather than the resolved family.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::baseline::{BaselineFamily, BaselineSet, FALLBACK_ORDER};
use super::response::ResponseTimeSample;
use crate::models::{Player, QualityBin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoLabel {
    Fast,
    Normal,
    Slow,
}

impl TempoLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            TempoLabel::Fast => "fast",
            TempoLabel::Normal => "normal",
            TempoLabel::Slow => "slow",
        }
    }
}

impl fmt::Display for TempoLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds chosen for one sample, with the family they came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub fast_threshold: f64,
    pub slow_threshold: f64,
    pub source: BaselineFamily,
}

impl Threshold {
    pub fn classify(&self, value: f64) -> TempoLabel {
        classify(value, self.fast_threshold, self.slow_threshold)
    }
}

/// `fast` if `value <= fast`, `slow` if `value >= slow`, else `normal`.
pub fn classify(value: f64, fast: f64, slow: f64) -> TempoLabel {
    if value <= fast {
        TempoLabel::Fast
    } else if value >= slow {
        TempoLabel::Slow
    } else {
        TempoLabel::Normal
    }
}

/// First usable family in priority order.
///
/// Quality-conditioned families are skipped automatically for samples with
/// no incoming quality bin, since they have no key.
pub fn select_threshold(sample: &ResponseTimeSample, baselines: &BaselineSet) -> Option<Threshold> {
    FALLBACK_ORDER.iter().find_map(|&family| {
        let (fast, slow) = baselines.usable(family, sample)?.thresholds()?;
        Some(Threshold {
            fast_threshold: fast,
            slow_threshold: slow,
            source: family,
        })
    })
}

/// Robust z-score of the sample against its player's baseline (family 6).
pub fn baseline_z_score(sample: &ResponseTimeSample, baselines: &BaselineSet) -> Option<f64> {
    baselines
        .player_baseline(sample.player)?
        .robust_z(sample.value_clamped)
}

/// Classification result for one response. Unresolvable fields are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedResponse {
    pub rally_id: String,
    pub game_number: u32,
    pub rally_number: u32,
    pub stroke_number: u32,
    pub frame_number: i64,
    pub time_sec: f64,
    pub player: Player,
    pub response_stroke: String,
    pub opponent_prev_stroke: String,
    pub opponent_prev_is_serve: bool,
    pub incoming_quality_bin: Option<QualityBin>,
    pub response_time_raw_sec: f64,
    pub response_time_sec: f64,
    pub classification: Option<TempoLabel>,
    pub threshold_source: Option<BaselineFamily>,
    pub fast_threshold: Option<f64>,
    pub slow_threshold: Option<f64>,
    pub z_score: Option<f64>,
}

pub fn classify_sample(sample: &ResponseTimeSample, baselines: &BaselineSet) -> ClassifiedResponse {
    let threshold = select_threshold(sample, baselines);
    ClassifiedResponse {
        rally_id: sample.rally_id.clone(),
        game_number: sample.game_number,
        rally_number: sample.rally_number,
        stroke_number: sample.stroke_number,
        frame_number: sample.frame_number,
        time_sec: sample.time_sec,
        player: sample.player,
        response_stroke: sample.response_stroke.clone(),
        opponent_prev_stroke: sample.opponent_prev_stroke.clone(),
        opponent_prev_is_serve: sample.opponent_prev_is_serve,
        incoming_quality_bin: sample.incoming_quality_bin,
        response_time_raw_sec: sample.value_raw,
        response_time_sec: sample.value_clamped,
        classification: threshold.map(|t| t.classify(sample.value_clamped)),
        threshold_source: threshold.map(|t| t.source),
        fast_threshold: threshold.map(|t| t.fast_threshold),
        slow_threshold: threshold.map(|t| t.slow_threshold),
        z_score: baseline_z_score(sample, baselines),
    }
}

/// Classify every sample against a frozen baseline set.
pub fn classify_samples(
    samples: &[ResponseTimeSample],
    baselines: &BaselineSet,
) -> Vec<ClassifiedResponse> {
    let out: Vec<ClassifiedResponse> = samples
        .iter()
        .map(|s| classify_sample(s, baselines))
        .collect();
    let unresolved = out.iter().filter(|c| c.classification.is_none()).count();
    if unresolved > 0 {
        log::warn!("{} responses had no resolvable threshold", unresolved);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tempo::baseline::build_baselines;
    use crate::analysis::tempo::baseline::test_support::sample;
    use crate::config::TempoConfig;
    use proptest::prelude::*;

    #[test]
    fn test_boundaries_inclusive() {
        assert_eq!(classify(0.4, 0.4, 1.2), TempoLabel::Fast);
        assert_eq!(classify(1.2, 0.4, 1.2), TempoLabel::Slow);
        assert_eq!(classify(0.8, 0.4, 1.2), TempoLabel::Normal);
        // degenerate thresholds prefer fast
        assert_eq!(classify(1.0, 1.0, 1.0), TempoLabel::Fast);
    }

    #[test]
    fn test_small_combo_falls_back_to_baseline() {
        let samples: Vec<_> = [0.5, 0.6, 0.55, 3.9]
            .iter()
            .map(|&v| sample(Player::A, "smash", "lift", None, v))
            .collect();
        let baselines = build_baselines(&samples, &TempoConfig::default());

        for s in &samples {
            let t = select_threshold(s, &baselines).unwrap();
            assert_eq!(t.source, BaselineFamily::Baseline);
            assert_ne!(t.source, BaselineFamily::Combo);
        }
        let slow = classify_sample(&samples[3], &baselines);
        assert_eq!(slow.classification, Some(TempoLabel::Slow));
        assert_eq!(slow.threshold_source, Some(BaselineFamily::Baseline));
    }

    #[test]
    fn test_quality_family_preferred_when_available() {
        let cfg = TempoConfig {
            min_combo_n: 3,
            min_opponent_n: 3,
            ..TempoConfig::default()
        };
        let mut samples: Vec<_> = (0..3)
            .map(|i| sample(Player::A, "smash", "lift", Some(QualityBin::High), 0.4 + 0.1 * i as f64))
            .collect();
        samples.push(sample(Player::A, "smash", "lift", None, 0.9));
        let baselines = build_baselines(&samples, &cfg);

        let t = select_threshold(&samples[0], &baselines).unwrap();
        assert_eq!(t.source, BaselineFamily::ComboWithQuality);

        // no quality bin → quality families skipped, plain combo has 4 samples
        let t = select_threshold(&samples[3], &baselines).unwrap();
        assert_eq!(t.source, BaselineFamily::Combo);
    }

    #[test]
    fn test_opponent_only_between_combo_and_baseline() {
        let cfg = TempoConfig {
            min_combo_n: 5,
            min_opponent_n: 4,
            ..TempoConfig::default()
        };
        let mut samples = Vec::new();
        for (i, resp) in ["lift", "lift", "drop", "clear"].iter().enumerate() {
            samples.push(sample(Player::B, "smash", resp, None, 0.5 + 0.1 * i as f64));
        }
        let baselines = build_baselines(&samples, &cfg);
        let t = select_threshold(&samples[0], &baselines).unwrap();
        assert_eq!(t.source, BaselineFamily::OpponentOnly);
    }

    #[test]
    fn test_zero_mad_gives_null_z() {
        let samples: Vec<_> = (0..5)
            .map(|_| sample(Player::A, "clear", "clear", None, 1.0))
            .collect();
        let baselines = build_baselines(&samples, &TempoConfig::default());
        let c = classify_sample(&samples[0], &baselines);
        assert_eq!(c.z_score, None);
        assert_eq!(c.classification, Some(TempoLabel::Fast));
    }

    fn arb_sample() -> impl Strategy<Value = ResponseTimeSample> {
        (
            prop_oneof![Just(Player::A), Just(Player::B)],
            prop_oneof![Just("smash"), Just("clear"), Just("drop")],
            prop_oneof![Just("lift"), Just("net"), Just("drive")],
            prop_oneof![
                Just(None),
                Just(Some(QualityBin::Low)),
                Just(Some(QualityBin::Medium)),
                Just(Some(QualityBin::High))
            ],
            0.15f64..4.0,
        )
            .prop_map(|(p, o, r, q, v)| sample(p, o, r, q, v))
    }

    proptest! {
        #[test]
        fn prop_fallback_monotonic_and_always_resolves(
            samples in prop::collection::vec(arb_sample(), 1..120),
            min_combo in 1usize..12,
            min_opp in 1usize..12,
        ) {
            let cfg = TempoConfig { min_combo_n: min_combo, min_opponent_n: min_opp, ..TempoConfig::default() };
            let baselines = build_baselines(&samples, &cfg);
            for s in &samples {
                let t = select_threshold(s, &baselines);
                prop_assert!(t.is_some(), "threshold must always resolve");
                let chosen = t.unwrap().source;
                let chosen_rank = FALLBACK_ORDER.iter().position(|f| *f == chosen).unwrap();
                for earlier in &FALLBACK_ORDER[..chosen_rank] {
                    prop_assert!(baselines.usable(*earlier, s).is_none());
                }
                prop_assert!(classify_sample(s, &baselines).classification.is_some());
            }
        }
    }
}
