//! # Baseline Families
//!
//! Six granularities of response-time statistics, from most to least
//! specific:
//!
//! | # | family                        | key                                         | min count        |
//! |---|-------------------------------|---------------------------------------------|------------------|
//! | 1 | `combo_with_quality`          | player, opp stroke, resp stroke, quality    | `min_combo_n`    |
//! | 2 | `opponent_only_with_quality`  | player, opp stroke, quality                 | `min_opponent_n` |
//! | 3 | `baseline_with_quality`       | player, quality                             | none             |
//! | 4 | `combo`                       | player, opp stroke, resp stroke             | `min_combo_n`    |
//! | 5 | `opponent_only`               | player, opp stroke                          | `min_opponent_n` |
//! | 6 | `baseline`                    | player                                      | none             |
//!
//! [`BaselineSet`] is built once from the full sample set and is read-only
//! afterwards.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::response::ResponseTimeSample;
use crate::analysis::stats::ComboStatistic;
use crate::config::TempoConfig;
use crate::models::{Player, QualityBin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineFamily {
    ComboWithQuality,
    OpponentOnlyWithQuality,
    BaselineWithQuality,
    Combo,
    OpponentOnly,
    Baseline,
}

/// Threshold lookup order. Reordering or dropping a family is a one-line change.
pub const FALLBACK_ORDER: [BaselineFamily; 6] = [
    BaselineFamily::ComboWithQuality,
    BaselineFamily::OpponentOnlyWithQuality,
    BaselineFamily::BaselineWithQuality,
    BaselineFamily::Combo,
    BaselineFamily::OpponentOnly,
    BaselineFamily::Baseline,
];

impl BaselineFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            BaselineFamily::ComboWithQuality => "combo_with_quality",
            BaselineFamily::OpponentOnlyWithQuality => "opponent_only_with_quality",
            BaselineFamily::BaselineWithQuality => "baseline_with_quality",
            BaselineFamily::Combo => "combo",
            BaselineFamily::OpponentOnly => "opponent_only",
            BaselineFamily::Baseline => "baseline",
        }
    }

    fn index(self) -> usize {
        match self {
            BaselineFamily::ComboWithQuality => 0,
            BaselineFamily::OpponentOnlyWithQuality => 1,
            BaselineFamily::BaselineWithQuality => 2,
            BaselineFamily::Combo => 3,
            BaselineFamily::OpponentOnly => 4,
            BaselineFamily::Baseline => 5,
        }
    }

    pub fn uses_quality(self) -> bool {
        matches!(
            self,
            BaselineFamily::ComboWithQuality
                | BaselineFamily::OpponentOnlyWithQuality
                | BaselineFamily::BaselineWithQuality
        )
    }

    /// Minimum sample count before this family's thresholds are trusted.
    pub fn min_count(self, config: &TempoConfig) -> usize {
        match self {
            BaselineFamily::ComboWithQuality | BaselineFamily::Combo => config.min_combo_n,
            BaselineFamily::OpponentOnlyWithQuality | BaselineFamily::OpponentOnly => {
                config.min_opponent_n
            }
            BaselineFamily::BaselineWithQuality | BaselineFamily::Baseline => 0,
        }
    }

    /// Key of `sample` in this family, or `None` when the family does not
    /// apply (quality families for a sample without a quality bin).
    pub fn key_for(self, sample: &ResponseTimeSample) -> Option<BaselineKey> {
        let quality = if self.uses_quality() {
            Some(sample.incoming_quality_bin?)
        } else {
            None
        };
        let opponent_stroke = match self {
            BaselineFamily::BaselineWithQuality | BaselineFamily::Baseline => None,
            _ => Some(sample.opponent_prev_stroke.clone()),
        };
        let response_stroke = match self {
            BaselineFamily::ComboWithQuality | BaselineFamily::Combo => {
                Some(sample.response_stroke.clone())
            }
            _ => None,
        };
        Some(BaselineKey {
            player: sample.player,
            opponent_stroke,
            response_stroke,
            quality,
        })
    }
}

impl fmt::Display for BaselineFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping key; unused components are `None` for coarser families.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaselineKey {
    pub player: Player,
    pub opponent_stroke: Option<String>,
    pub response_stroke: Option<String>,
    pub quality: Option<QualityBin>,
}

impl BaselineKey {
    pub fn player(player: Player) -> Self {
        Self {
            player,
            opponent_stroke: None,
            response_stroke: None,
            quality: None,
        }
    }
}

/// `A|opp:smash|resp:lift|q:high`
impl fmt::Display for BaselineKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.player)?;
        if let Some(opp) = &self.opponent_stroke {
            write!(f, "|opp:{}", opp)?;
        }
        if let Some(resp) = &self.response_stroke {
            write!(f, "|resp:{}", resp)?;
        }
        if let Some(q) = self.quality {
            write!(f, "|q:{}", q)?;
        }
        Ok(())
    }
}

/// One row of the exported baseline table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRow {
    pub family: BaselineFamily,
    pub key: String,
    pub player: Player,
    pub usable: bool,
    #[serde(flatten)]
    pub stats: ComboStatistic,
}

/// Frozen statistics for all six families.
#[derive(Debug, Clone, Default)]
pub struct BaselineSet {
    families: [FxHashMap<BaselineKey, ComboStatistic>; 6],
}

impl BaselineSet {
    pub fn get(&self, family: BaselineFamily, key: &BaselineKey) -> Option<&ComboStatistic> {
        self.families[family.index()].get(key)
    }

    /// Statistic of `family` for `sample`, present or not.
    pub fn lookup(
        &self,
        family: BaselineFamily,
        sample: &ResponseTimeSample,
    ) -> Option<&ComboStatistic> {
        let key = family.key_for(sample)?;
        self.get(family, &key)
    }

    /// Usable statistic of `family` for `sample` (thresholds not nulled).
    pub fn usable(
        &self,
        family: BaselineFamily,
        sample: &ResponseTimeSample,
    ) -> Option<&ComboStatistic> {
        self.lookup(family, sample).filter(|s| s.is_usable())
    }

    /// Player-level baseline (family 6).
    pub fn player_baseline(&self, player: Player) -> Option<&ComboStatistic> {
        self.get(BaselineFamily::Baseline, &BaselineKey::player(player))
    }

    pub fn is_empty(&self) -> bool {
        self.families.iter().all(|f| f.is_empty())
    }

    /// Flat table of every family/key, sorted by family priority then key.
    pub fn rows(&self) -> Vec<BaselineRow> {
        let mut rows = Vec::new();
        for family in FALLBACK_ORDER {
            let mut entries: Vec<(&BaselineKey, &ComboStatistic)> =
                self.families[family.index()].iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, stats) in entries {
                rows.push(BaselineRow {
                    family,
                    key: key.to_string(),
                    player: key.player,
                    usable: stats.is_usable(),
                    stats: stats.clone(),
                });
            }
        }
        rows
    }
}

/// Build every family's statistics from the complete, clamped sample set.
///
/// Groups below their family's minimum keep `count`, `median` and MAD but
/// have `p10`/`p90` nulled, which forces fallback during classification.
pub fn build_baselines(samples: &[ResponseTimeSample], config: &TempoConfig) -> BaselineSet {
    let mut grouped: [FxHashMap<BaselineKey, Vec<f64>>; 6] = Default::default();

    for sample in samples {
        for family in FALLBACK_ORDER {
            if let Some(key) = family.key_for(sample) {
                grouped[family.index()]
                    .entry(key)
                    .or_default()
                    .push(sample.value_clamped);
            }
        }
    }

    let mut set = BaselineSet::default();
    for family in FALLBACK_ORDER {
        let min_count = family.min_count(config);
        let groups = std::mem::take(&mut grouped[family.index()]);
        let target = &mut set.families[family.index()];
        for (key, values) in groups {
            if let Some(stat) = ComboStatistic::from_values(&values) {
                target.insert(key, stat.require_count(min_count));
            }
        }
        log::debug!(
            "baseline family {}: {} keys ({} usable)",
            family,
            target.len(),
            target.values().filter(|s| s.is_usable()).count()
        );
    }

    for player in [Player::A, Player::B] {
        if let Some(base) = set.player_baseline(player) {
            if base.median_absolute_deviation == 0.0 {
                log::warn!(
                    "player {} baseline has zero MAD over {} samples; z-scores undefined",
                    player,
                    base.count
                );
            }
        }
    }

    set
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn sample(
        player: Player,
        opp: &str,
        resp: &str,
        q: Option<QualityBin>,
        value: f64,
    ) -> ResponseTimeSample {
        ResponseTimeSample {
            rally_id: "r".to_string(),
            game_number: 1,
            rally_number: 1,
            stroke_number: 2,
            frame_number: 0,
            time_sec: 0.0,
            player,
            response_stroke: resp.to_string(),
            opponent_prev_stroke: opp.to_string(),
            opponent_prev_is_serve: opp.contains("serve"),
            incoming_effectiveness: None,
            incoming_quality_bin: q,
            value_raw: value,
            value_clamped: value,
            self_cycle_sec: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sample;
    use super::*;

    #[test]
    fn test_keys_per_family() {
        let s = sample(Player::A, "smash", "lift", Some(QualityBin::High), 0.5);
        assert_eq!(
            BaselineFamily::ComboWithQuality.key_for(&s).unwrap().to_string(),
            "A|opp:smash|resp:lift|q:high"
        );
        assert_eq!(
            BaselineFamily::OpponentOnlyWithQuality.key_for(&s).unwrap().to_string(),
            "A|opp:smash|q:high"
        );
        assert_eq!(
            BaselineFamily::BaselineWithQuality.key_for(&s).unwrap().to_string(),
            "A|q:high"
        );
        assert_eq!(
            BaselineFamily::Combo.key_for(&s).unwrap().to_string(),
            "A|opp:smash|resp:lift"
        );
        assert_eq!(
            BaselineFamily::OpponentOnly.key_for(&s).unwrap().to_string(),
            "A|opp:smash"
        );
        assert_eq!(BaselineFamily::Baseline.key_for(&s).unwrap().to_string(), "A");

        let unbinned = sample(Player::B, "smash", "lift", None, 0.5);
        assert!(BaselineFamily::ComboWithQuality.key_for(&unbinned).is_none());
        assert!(BaselineFamily::Baseline.key_for(&unbinned).is_some());
    }

    #[test]
    fn test_small_combo_is_nulled() {
        let samples: Vec<_> = [0.5, 0.6, 0.55, 3.9]
            .iter()
            .map(|&v| sample(Player::A, "smash", "lift", None, v))
            .collect();
        let set = build_baselines(&samples, &TempoConfig::default());

        let combo = set.lookup(BaselineFamily::Combo, &samples[0]).unwrap();
        assert_eq!(combo.count, 4);
        assert!(!combo.is_usable());
        assert!(set.usable(BaselineFamily::OpponentOnly, &samples[0]).is_none());

        let base = set.player_baseline(Player::A).unwrap();
        assert!(base.is_usable(), "player baseline has no minimum");
        assert!(set.player_baseline(Player::B).is_none());
    }

    #[test]
    fn test_rows_sorted_by_priority() {
        let samples = vec![
            sample(Player::B, "clear", "drop", Some(QualityBin::Low), 0.9),
            sample(Player::A, "smash", "lift", Some(QualityBin::High), 0.5),
        ];
        let set = build_baselines(&samples, &TempoConfig::default());
        let rows = set.rows();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].family, BaselineFamily::ComboWithQuality);
        assert_eq!(rows[0].player, Player::A);
        assert_eq!(rows[11].family, BaselineFamily::Baseline);
        assert_eq!(rows[11].key, "B");
        assert!(rows[11].usable);
        assert!(!rows[0].usable);
    }
}
