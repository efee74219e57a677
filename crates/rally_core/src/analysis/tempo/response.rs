//! # Response-Time Extraction
//!
//! Walks each rally in stroke order and measures, for every shot, the time
//! since the opponent's most recent hit.
//!
//! ## Algorithm
//! 1. Track the last hit (frame, stroke, effectiveness, serve flag) per player
//! 2. For each shot, look up the opponent's last hit
//! 3. No opponent hit yet → no sample (the shot is excluded, not defaulted)
//! 4. Serve shots are skipped unless `include_serves` is set
//! 5. `value_raw = Δframes / fps`, `value_clamped = clamp(value_raw)`

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::models::{Player, QualityBin, RallyShots, ShotEvent};

/// Response time of one shot, with the context used to key baselines.
///
/// Computed once; never written back onto the input shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeSample {
    pub rally_id: String,
    pub game_number: u32,
    pub rally_number: u32,
    pub stroke_number: u32,
    pub frame_number: i64,
    pub time_sec: f64,
    pub player: Player,
    pub response_stroke: String,
    pub opponent_prev_stroke: String,
    /// Whether the incoming opponent shot was a serve
    pub opponent_prev_is_serve: bool,
    pub incoming_effectiveness: Option<f64>,
    pub incoming_quality_bin: Option<QualityBin>,
    pub value_raw: f64,
    pub value_clamped: f64,
    /// Time since this player's own previous hit, if any
    pub self_cycle_sec: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct LastHit<'a> {
    frame: i64,
    stroke: &'a str,
    effectiveness: Option<f64>,
    quality: Option<QualityBin>,
    is_serve: bool,
}

fn slot(player: Player) -> usize {
    match player {
        Player::A => 0,
        Player::B => 1,
    }
}

/// Extract response-time samples for one rally.
pub fn extract_rally_samples(
    rally: &RallyShots<'_>,
    config: &AnalysisConfig,
) -> Vec<ResponseTimeSample> {
    let tempo = &config.tempo;
    let mut last: [Option<LastHit<'_>>; 2] = [None, None];
    let mut prev_player: Option<Player> = None;
    let mut samples = Vec::new();

    for shot in &rally.shots {
        if prev_player == Some(shot.player) {
            log::warn!(
                "rally {}: consecutive shots by player {} at stroke {}",
                rally.rally_id,
                shot.player,
                shot.stroke_number
            );
        }
        prev_player = Some(shot.player);

        let opponent_hit = last[slot(shot.player.opponent())];
        let own_hit = last[slot(shot.player)];

        if let Some(opp) = opponent_hit {
            if !shot.is_serve || tempo.include_serves {
                samples.extend(build_sample(shot, &opp, own_hit.as_ref(), config));
            }
        }

        last[slot(shot.player)] = Some(LastHit {
            frame: shot.frame_number,
            stroke: shot.stroke_category.as_str(),
            effectiveness: shot.effectiveness,
            quality: shot.quality_bin(&config.quality),
            is_serve: shot.is_serve,
        });
    }

    samples
}

fn build_sample(
    shot: &ShotEvent,
    opp: &LastHit<'_>,
    own: Option<&LastHit<'_>>,
    config: &AnalysisConfig,
) -> Option<ResponseTimeSample> {
    let fps = config.tempo.fps;
    let Some(delta) = shot.frame_number.checked_sub(opp.frame) else {
        log::warn!(
            "rally {}: frame gap at stroke {} overflows, sample skipped",
            shot.rally_id,
            shot.stroke_number
        );
        return None;
    };
    if delta < 0 {
        log::warn!(
            "rally {}: stroke {} is {} frames before the opponent's previous hit",
            shot.rally_id,
            shot.stroke_number,
            -delta
        );
    }
    let value_raw = delta as f64 / fps;

    Some(ResponseTimeSample {
        rally_id: shot.rally_id.clone(),
        game_number: shot.game_number,
        rally_number: shot.rally_number,
        stroke_number: shot.stroke_number,
        frame_number: shot.frame_number,
        time_sec: shot.time_sec(fps),
        player: shot.player,
        response_stroke: shot.stroke_category.clone(),
        opponent_prev_stroke: opp.stroke.to_string(),
        opponent_prev_is_serve: opp.is_serve,
        incoming_effectiveness: opp.effectiveness,
        incoming_quality_bin: opp.quality,
        value_raw,
        value_clamped: config.tempo.clamp(value_raw),
        self_cycle_sec: own
            .and_then(|o| shot.frame_number.checked_sub(o.frame))
            .map(|d| d as f64 / fps),
    })
}

/// Extract samples for every rally of a match.
pub fn extract_response_samples(
    rallies: &[RallyShots<'_>],
    config: &AnalysisConfig,
) -> Vec<ResponseTimeSample> {
    let samples: Vec<ResponseTimeSample> = rallies
        .iter()
        .flat_map(|r| extract_rally_samples(r, config))
        .collect();
    log::debug!(
        "extracted {} response samples from {} rallies",
        samples.len(),
        rallies.len()
    );
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group_rallies;
    use crate::models::shot::test_support::{shot, with_eff};

    fn rally() -> Vec<ShotEvent> {
        vec![
            with_eff(shot("r1", 1, 100, Player::A, "serve_short"), 80.0),
            with_eff(shot("r1", 2, 130, Player::B, "net_lift"), 40.0),
            shot("r1", 3, 160, Player::A, "forehand_clear"),
            shot("r1", 4, 316, Player::B, "backhand_drop"),
        ]
    }

    #[test]
    fn test_first_shot_produces_no_sample() {
        let shots = rally();
        let rallies = group_rallies(&shots).unwrap();
        let samples = extract_response_samples(&rallies, &AnalysisConfig::default());
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].stroke_number, 2);
    }

    #[test]
    fn test_values_and_context() {
        let shots = rally();
        let rallies = group_rallies(&shots).unwrap();
        let samples = extract_response_samples(&rallies, &AnalysisConfig::default());

        let receive = &samples[0];
        assert_eq!(receive.player, Player::B);
        assert_eq!(receive.opponent_prev_stroke, "serve_short");
        assert!(receive.opponent_prev_is_serve);
        assert!((receive.value_raw - 1.0).abs() < 1e-9);
        assert_eq!(receive.incoming_quality_bin, Some(QualityBin::High));
        assert_eq!(receive.self_cycle_sec, None);

        let third = &samples[1];
        assert_eq!(third.incoming_quality_bin, Some(QualityBin::Low));
        assert!((third.self_cycle_sec.unwrap() - 2.0).abs() < 1e-9);

        // 156 frames = 5.2s → clamped to the 4.0s cap
        let slow = &samples[2];
        assert!((slow.value_raw - 5.2).abs() < 1e-9);
        assert_eq!(slow.value_clamped, 4.0);
        assert_eq!(slow.incoming_quality_bin, None);
    }

    #[test]
    fn test_serves_excluded_by_default() {
        let shots = vec![
            shot("r1", 1, 0, Player::A, "serve_short"),
            shot("r1", 2, 30, Player::B, "net_lift"),
            // mislabeled second serve mid-rally
            shot("r1", 3, 60, Player::A, "serve_flick"),
        ];
        let rallies = group_rallies(&shots).unwrap();

        let default_samples = extract_response_samples(&rallies, &AnalysisConfig::default());
        assert_eq!(default_samples.len(), 1);

        let mut cfg = AnalysisConfig::default();
        cfg.tempo.include_serves = true;
        assert_eq!(extract_response_samples(&rallies, &cfg).len(), 2);
    }

    #[test]
    fn test_same_player_consecutive_is_tolerated() {
        let shots = vec![
            shot("r1", 1, 0, Player::A, "serve_short"),
            shot("r1", 2, 30, Player::B, "net_lift"),
            shot("r1", 3, 60, Player::B, "forehand_clear"),
        ];
        let rallies = group_rallies(&shots).unwrap();
        let samples = extract_response_samples(&rallies, &AnalysisConfig::default());
        // both B shots respond to A's serve at frame 0
        assert_eq!(samples.len(), 2);
        assert!((samples[1].value_raw - 2.0).abs() < 1e-9);
        assert!((samples[1].self_cycle_sec.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_frames_skip_the_sample() {
        let shots = vec![
            shot("r1", 1, i64::MIN, Player::A, "serve_short"),
            shot("r1", 2, i64::MAX, Player::B, "net_lift"),
            shot("r1", 3, i64::MAX, Player::A, "forehand_clear"),
        ];
        let rallies = group_rallies(&shots).unwrap();
        let samples = extract_response_samples(&rallies, &AnalysisConfig::default());
        // B's gap overflows; A's response to B is zero frames
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].stroke_number, 3);
        assert_eq!(samples[0].value_raw, 0.0);
        assert_eq!(samples[0].self_cycle_sec, None);
    }
}
