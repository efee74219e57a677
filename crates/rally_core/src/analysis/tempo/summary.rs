//! # Tempo Summaries
//!
//! Aggregations over classified responses for reporting layers:
//! - `summarize_rallies` - within-rally pace dynamics per player
//! - `detect_highlights` - standout responses (label, |z|, combo p10/p90 breach)
//! - `combo_patterns` - recurring fast/slow tendencies per stroke pair
//! - `combo_fast_slow` - when in the match each stroke pair ran fast or slow
//! - `serve_receive` - first responses to a serve, per player
//!
//! All rates and medians use the clamped response time.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::baseline::{BaselineFamily, BaselineSet};
use super::classify::{ClassifiedResponse, TempoLabel};
use super::response::ResponseTimeSample;
use crate::analysis::stats::{index_slope, median, percentile, std_dev};
use crate::config::HighlightConfig;
use crate::models::Player;

// ============================================================================
// Rally dynamics
// ============================================================================

/// Pace dynamics of one player within one rally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyTempoSummary {
    pub rally_id: String,
    pub game_number: u32,
    pub rally_number: u32,
    pub player: Player,
    pub shots_with_response: usize,
    pub median_response_time_sec: Option<f64>,
    pub fast_count: usize,
    pub normal_count: usize,
    pub slow_count: usize,
    pub stddev_sec: Option<f64>,
    pub iqr_sec: Option<f64>,
    pub range_sec: Option<f64>,
    /// Label changes between consecutive responses
    pub transitions: usize,
    /// Longest run of identical labels
    pub longest_run: usize,
    /// Median of the late half minus median of the early half
    pub early_late_delta_sec: Option<f64>,
    /// Least-squares slope of response time over response index
    pub slope_sec_per_shot: Option<f64>,
    pub delta_vs_baseline_sec: Option<f64>,
}

pub fn summarize_rallies(
    responses: &[ClassifiedResponse],
    baselines: &BaselineSet,
) -> Vec<RallyTempoSummary> {
    let mut order: Vec<(&str, Player)> = Vec::new();
    let mut groups: FxHashMap<(&str, Player), Vec<&ClassifiedResponse>> = FxHashMap::default();
    for r in responses {
        let key = (r.rally_id.as_str(), r.player);
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(r);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let group = groups.remove(&key)?;
            Some(summarize_group(&group, baselines))
        })
        .collect()
}

fn summarize_group(group: &[&ClassifiedResponse], baselines: &BaselineSet) -> RallyTempoSummary {
    let first = group[0];
    let rts: Vec<f64> = group.iter().map(|r| r.response_time_sec).collect();
    // unresolved labels count as normal for run/transition purposes
    let labels: Vec<TempoLabel> = group
        .iter()
        .map(|r| r.classification.unwrap_or(TempoLabel::Normal))
        .collect();
    let n = rts.len();

    let count = |label: TempoLabel| {
        group
            .iter()
            .filter(|r| r.classification == Some(label))
            .count()
    };

    let transitions = labels.windows(2).filter(|w| w[0] != w[1]).count();
    let mut longest_run = if n > 0 { 1 } else { 0 };
    let mut current = 1;
    for w in labels.windows(2) {
        if w[0] == w[1] {
            current += 1;
            longest_run = longest_run.max(current);
        } else {
            current = 1;
        }
    }

    let mid = n / 2;
    let (early, late) = if mid > 0 {
        (&rts[..mid], &rts[mid..])
    } else {
        (&rts[..], &rts[..])
    };
    let early_late_delta_sec = match (median(early), median(late)) {
        (Some(e), Some(l)) => Some(l - e),
        _ => None,
    };

    let med = median(&rts);
    let iqr_sec = match (percentile(&rts, 25.0), percentile(&rts, 75.0)) {
        (Some(p25), Some(p75)) => Some(p75 - p25),
        _ => None,
    };
    let range_sec = if n > 1 {
        let max = rts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = rts.iter().cloned().fold(f64::INFINITY, f64::min);
        Some(max - min)
    } else if n == 1 {
        Some(0.0)
    } else {
        None
    };
    let delta_vs_baseline_sec = match (med, baselines.player_baseline(first.player)) {
        (Some(m), Some(base)) => Some(m - base.median),
        _ => None,
    };

    RallyTempoSummary {
        rally_id: first.rally_id.clone(),
        game_number: first.game_number,
        rally_number: first.rally_number,
        player: first.player,
        shots_with_response: n,
        median_response_time_sec: med,
        fast_count: count(TempoLabel::Fast),
        normal_count: count(TempoLabel::Normal),
        slow_count: count(TempoLabel::Slow),
        stddev_sec: std_dev(&rts),
        iqr_sec,
        range_sec,
        transitions,
        longest_run,
        early_late_delta_sec,
        slope_sec_per_shot: index_slope(&rts),
        delta_vs_baseline_sec,
    }
}

// ============================================================================
// Highlights
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightReason {
    FastLabel,
    SlowLabel,
    ZScore,
    ComboP10,
    ComboP90,
    ComboQualityP10,
    ComboQualityP90,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightEvent {
    pub rally_id: String,
    pub player: Player,
    pub stroke_number: u32,
    pub frame_number: i64,
    pub time_sec: f64,
    pub response_stroke: String,
    pub opponent_prev_stroke: String,
    pub response_time_sec: f64,
    pub classification: Option<TempoLabel>,
    pub z_score: Option<f64>,
    pub threshold_source: Option<BaselineFamily>,
    /// Sorted, deduplicated
    pub reasons: Vec<HighlightReason>,
}

/// Flag standout responses.
///
/// `samples` and `responses` are parallel slices (same order, same length).
/// The combo check prefers the quality-conditioned combo when it is usable.
pub fn detect_highlights(
    samples: &[ResponseTimeSample],
    responses: &[ClassifiedResponse],
    baselines: &BaselineSet,
    config: &HighlightConfig,
) -> Vec<HighlightEvent> {
    let mut out = Vec::new();
    for (sample, resp) in samples.iter().zip(responses) {
        let mut reasons = Vec::new();
        match resp.classification {
            Some(TempoLabel::Fast) => reasons.push(HighlightReason::FastLabel),
            Some(TempoLabel::Slow) => reasons.push(HighlightReason::SlowLabel),
            _ => {}
        }
        if let Some(z) = resp.z_score {
            if z.abs() >= config.standout_z {
                reasons.push(HighlightReason::ZScore);
            }
        }

        let rt = sample.value_clamped;
        if let Some((p10, p90)) = baselines
            .usable(BaselineFamily::ComboWithQuality, sample)
            .and_then(|s| s.thresholds())
        {
            if rt <= p10 {
                reasons.push(HighlightReason::ComboQualityP10);
            }
            if rt >= p90 {
                reasons.push(HighlightReason::ComboQualityP90);
            }
        } else if let Some((p10, p90)) = baselines
            .usable(BaselineFamily::Combo, sample)
            .and_then(|s| s.thresholds())
        {
            if rt <= p10 {
                reasons.push(HighlightReason::ComboP10);
            }
            if rt >= p90 {
                reasons.push(HighlightReason::ComboP90);
            }
        }

        if reasons.is_empty() {
            continue;
        }
        reasons.sort();
        reasons.dedup();
        out.push(HighlightEvent {
            rally_id: resp.rally_id.clone(),
            player: resp.player,
            stroke_number: resp.stroke_number,
            frame_number: resp.frame_number,
            time_sec: resp.time_sec,
            response_stroke: resp.response_stroke.clone(),
            opponent_prev_stroke: resp.opponent_prev_stroke.clone(),
            response_time_sec: resp.response_time_sec,
            classification: resp.classification,
            z_score: resp.z_score,
            threshold_source: resp.threshold_source,
            reasons,
        });
    }
    out
}

// ============================================================================
// Combo patterns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboPattern {
    pub player: Player,
    pub opponent_prev_stroke: String,
    pub response_stroke: String,
    pub count: usize,
    pub fast_rate: f64,
    pub slow_rate: f64,
    pub median_sec: Option<f64>,
    pub p10: Option<f64>,
    pub p90: Option<f64>,
    pub delta_vs_player_median: Option<f64>,
    pub flagged: bool,
}

fn label_rate(group: &[&ClassifiedResponse], label: TempoLabel) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    group
        .iter()
        .filter(|r| r.classification == Some(label))
        .count() as f64
        / group.len() as f64
}

/// Per (player, opponent stroke, response stroke) tendencies, sorted by key.
pub fn combo_patterns(
    responses: &[ClassifiedResponse],
    baselines: &BaselineSet,
    config: &HighlightConfig,
) -> Vec<ComboPattern> {
    let mut groups: FxHashMap<(Player, &str, &str), Vec<&ClassifiedResponse>> =
        FxHashMap::default();
    for r in responses {
        groups
            .entry((
                r.player,
                r.opponent_prev_stroke.as_str(),
                r.response_stroke.as_str(),
            ))
            .or_default()
            .push(r);
    }

    let mut keys: Vec<_> = groups.keys().copied().collect();
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let group = &groups[&key];
            let (player, opp, resp) = key;
            let rts: Vec<f64> = group.iter().map(|r| r.response_time_sec).collect();
            let med = median(&rts);
            let fast_rate = label_rate(group, TempoLabel::Fast);
            let slow_rate = label_rate(group, TempoLabel::Slow);
            let delta = match (med, baselines.player_baseline(player)) {
                (Some(m), Some(base)) => Some(m - base.median),
                _ => None,
            };
            let flagged = group.len() >= config.pattern_min_n
                && (fast_rate >= config.pattern_rate || slow_rate >= config.pattern_rate)
                && delta.map_or(false, |d| d.abs() >= config.pattern_delta);
            ComboPattern {
                player,
                opponent_prev_stroke: opp.to_string(),
                response_stroke: resp.to_string(),
                count: group.len(),
                fast_rate,
                slow_rate,
                median_sec: med,
                p10: percentile(&rts, 10.0),
                p90: percentile(&rts, 90.0),
                delta_vs_player_median: delta,
                flagged,
            }
        })
        .collect()
}

/// Match timestamps of the fast and slow responses of one stroke pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboFastSlow {
    pub player: Player,
    pub opponent_prev_stroke: String,
    pub response_stroke: String,
    pub fast_count: usize,
    pub slow_count: usize,
    /// Seconds into the match, millisecond precision, in response order
    pub fast_times_sec: Vec<f64>,
    pub slow_times_sec: Vec<f64>,
}

fn round_ms(t: f64) -> f64 {
    (t * 1000.0).round() / 1000.0
}

/// Stroke pairs with at least `fast_slow_min_count` fast or slow labels,
/// sorted by key. Unresolved and normal responses are ignored.
pub fn combo_fast_slow(
    responses: &[ClassifiedResponse],
    config: &HighlightConfig,
) -> Vec<ComboFastSlow> {
    let mut groups: FxHashMap<(Player, &str, &str), (Vec<f64>, Vec<f64>)> =
        FxHashMap::default();
    for r in responses {
        let (fast, slow) = groups
            .entry((
                r.player,
                r.opponent_prev_stroke.as_str(),
                r.response_stroke.as_str(),
            ))
            .or_default();
        match r.classification {
            Some(TempoLabel::Fast) => fast.push(round_ms(r.time_sec)),
            Some(TempoLabel::Slow) => slow.push(round_ms(r.time_sec)),
            _ => {}
        }
    }

    let min = config.fast_slow_min_count;
    let mut rows: Vec<ComboFastSlow> = groups
        .into_iter()
        .filter(|(_, (fast, slow))| fast.len() >= min || slow.len() >= min)
        .map(|((player, opp, resp), (fast, slow))| ComboFastSlow {
            player,
            opponent_prev_stroke: opp.to_string(),
            response_stroke: resp.to_string(),
            fast_count: fast.len(),
            slow_count: slow.len(),
            fast_times_sec: fast,
            slow_times_sec: slow,
        })
        .collect();
    rows.sort_by(|a, b| {
        (a.player, &a.opponent_prev_stroke, &a.response_stroke).cmp(&(
            b.player,
            &b.opponent_prev_stroke,
            &b.response_stroke,
        ))
    });
    rows
}

// ============================================================================
// Serve receive
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeReceiveSummary {
    pub player: Player,
    pub count_after_serve: usize,
    pub median_sec: Option<f64>,
    pub p10: Option<f64>,
    pub p90: Option<f64>,
    pub fast_rate: f64,
    pub slow_rate: f64,
    pub baseline_median_sec: Option<f64>,
    pub delta_vs_baseline_sec: Option<f64>,
}

/// Responses whose incoming opponent shot was a serve, per player.
pub fn serve_receive(
    responses: &[ClassifiedResponse],
    baselines: &BaselineSet,
) -> Vec<ServeReceiveSummary> {
    [Player::A, Player::B]
        .into_iter()
        .map(|player| {
            let group: Vec<&ClassifiedResponse> = responses
                .iter()
                .filter(|r| r.player == player && r.opponent_prev_is_serve)
                .collect();
            let rts: Vec<f64> = group.iter().map(|r| r.response_time_sec).collect();
            let med = median(&rts);
            let base_median = baselines.player_baseline(player).map(|b| b.median);
            ServeReceiveSummary {
                player,
                count_after_serve: group.len(),
                median_sec: med,
                p10: percentile(&rts, 10.0),
                p90: percentile(&rts, 90.0),
                fast_rate: label_rate(&group, TempoLabel::Fast),
                slow_rate: label_rate(&group, TempoLabel::Slow),
                baseline_median_sec: base_median,
                delta_vs_baseline_sec: match (med, base_median) {
                    (Some(m), Some(b)) => Some(m - b),
                    _ => None,
                },
            }
        })
        .collect()
}
