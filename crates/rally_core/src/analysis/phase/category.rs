//! # Shot Categories
//!
//! Maps raw stroke labels onto a small set of tactical buckets. The phase
//! engine never decides this itself; it takes any [`ShotBucketer`].
//!
//! Two bucketers ship with the crate:
//! - [`CategoryTable`] - explicit label lists loaded from JSON
//! - [`KeywordBucketer`] - substring heuristic when no table is available

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticalCategory {
    Attacking,
    Defensive,
    NetBattle,
    NetKill,
    Placement,
    Reset,
    Pressure,
    /// Reserved for serve segments
    Serve,
    Other,
}

impl TacticalCategory {
    pub const ALL: [TacticalCategory; 9] = [
        TacticalCategory::Attacking,
        TacticalCategory::Defensive,
        TacticalCategory::NetBattle,
        TacticalCategory::NetKill,
        TacticalCategory::Placement,
        TacticalCategory::Reset,
        TacticalCategory::Pressure,
        TacticalCategory::Serve,
        TacticalCategory::Other,
    ];

    /// Human-readable phase label.
    pub fn label(self) -> &'static str {
        match self {
            TacticalCategory::Attacking => "Attacking",
            TacticalCategory::Defensive => "Defensive",
            TacticalCategory::NetBattle => "Net Battle",
            TacticalCategory::NetKill => "Net Kill",
            TacticalCategory::Placement => "Placement",
            TacticalCategory::Reset => "Reset/Baseline",
            TacticalCategory::Pressure => "Pressure",
            TacticalCategory::Serve => "Serve",
            TacticalCategory::Other => "Mixed",
        }
    }

    /// Key used in category table files.
    pub fn table_key(self) -> &'static str {
        match self {
            TacticalCategory::Attacking => "attacking_shots",
            TacticalCategory::Defensive => "defensive_shots",
            TacticalCategory::NetBattle => "net_shots",
            TacticalCategory::NetKill => "net_kill",
            TacticalCategory::Placement => "placement_shots",
            TacticalCategory::Reset => "reset_shots",
            TacticalCategory::Pressure => "pressure_shots",
            TacticalCategory::Serve => "serve_shots",
            TacticalCategory::Other => "unknown",
        }
    }

    pub fn from_table_key(key: &str) -> Option<TacticalCategory> {
        Self::ALL.iter().copied().find(|c| c.table_key() == key)
    }
}

impl fmt::Display for TacticalCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a raw stroke label to a tactical category. Must be pure.
pub trait ShotBucketer {
    fn bucket(&self, stroke: &str) -> TacticalCategory;
}

impl<F> ShotBucketer for F
where
    F: Fn(&str) -> TacticalCategory,
{
    fn bucket(&self, stroke: &str) -> TacticalCategory {
        self(stroke)
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase().replace("_cross", "")
}

/// Explicit label lists per category.
///
/// Lookup is case-insensitive and ignores a `_cross` direction suffix.
/// Unlisted labels fall into [`TacticalCategory::Other`].
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    entries: BTreeMap<String, TacticalCategory>,
}

#[derive(Deserialize)]
struct CategoryFile {
    #[serde(default)]
    shot_categories: BTreeMap<String, Vec<String>>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"shot_categories": {"attacking_shots": [..], ..}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CategoryFile = serde_json::from_str(json)?;
        Self::from_lists(file.shot_categories)
    }

    /// Build from category-key → label lists.
    ///
    /// Unknown category keys are skipped with a warning. A label listed
    /// under two categories keeps the first in category order.
    pub fn from_lists(lists: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut table = Self::new();
        let mut resolved: Vec<(TacticalCategory, Vec<String>)> = Vec::new();
        for (key, labels) in lists {
            match TacticalCategory::from_table_key(&key) {
                Some(category) => resolved.push((category, labels)),
                None => log::warn!("ignoring unknown shot category '{}'", key),
            }
        }
        resolved.sort_by_key(|(c, _)| *c);
        for (category, labels) in resolved {
            for label in labels {
                table.entries.entry(normalize(&label)).or_insert(category);
            }
        }
        if table.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "category table lists no shots".to_string(),
            ));
        }
        Ok(table)
    }

    pub fn get(&self, stroke: &str) -> Option<TacticalCategory> {
        self.entries.get(&normalize(stroke)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ShotBucketer for CategoryTable {
    fn bucket(&self, stroke: &str) -> TacticalCategory {
        self.get(stroke).unwrap_or(TacticalCategory::Other)
    }
}

/// Substring heuristic over common stroke labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordBucketer;

impl ShotBucketer for KeywordBucketer {
    fn bucket(&self, stroke: &str) -> TacticalCategory {
        let s = stroke.to_lowercase();
        // order matters: "nettap" before the generic net keywords
        if s.contains("serve") {
            TacticalCategory::Serve
        } else if s.contains("smash") {
            TacticalCategory::Attacking
        } else if s.contains("defense") || s.contains("defence") {
            TacticalCategory::Defensive
        } else if s.contains("nettap") || s.contains("net_kill") {
            TacticalCategory::NetKill
        } else if s.contains("netkeep") || s.contains("dribble") || s.contains("net") {
            TacticalCategory::NetBattle
        } else if s.contains("drop") {
            TacticalCategory::Placement
        } else if s.contains("lift") || s.contains("clear") {
            TacticalCategory::Reset
        } else if s.contains("drive") || s.contains("flat") || s.contains("push") {
            TacticalCategory::Pressure
        } else {
            TacticalCategory::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "shot_categories": {
            "attacking_shots": ["forehand_smash", "Backhand_Smash"],
            "reset_shots": ["forehand_lift", "forehand_clear"],
            "net_shots": ["forehand_netkeep"],
            "trick_shots": ["behind_the_back"]
        }
    }"#;

    #[test]
    fn test_table_lookup_normalizes() {
        let table = CategoryTable::from_json(TABLE).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.bucket("FOREHAND_SMASH"), TacticalCategory::Attacking);
        assert_eq!(table.bucket("backhand_smash_cross"), TacticalCategory::Attacking);
        assert_eq!(table.bucket("forehand_clear"), TacticalCategory::Reset);
        assert_eq!(table.bucket("behind_the_back"), TacticalCategory::Other);
    }

    #[test]
    fn test_table_rejects_empty() {
        assert!(CategoryTable::from_json(r#"{"shot_categories": {}}"#).is_err());
        assert!(CategoryTable::from_json("not json").is_err());
    }

    #[test]
    fn test_keyword_bucketer() {
        let b = KeywordBucketer;
        assert_eq!(b.bucket("forehand_smash"), TacticalCategory::Attacking);
        assert_eq!(b.bucket("backhand_nettap"), TacticalCategory::NetKill);
        assert_eq!(b.bucket("forehand_netkeep"), TacticalCategory::NetBattle);
        assert_eq!(b.bucket("backhand_drop_cross"), TacticalCategory::Placement);
        assert_eq!(b.bucket("forehand_lift"), TacticalCategory::Reset);
        assert_eq!(b.bucket("flat_game"), TacticalCategory::Pressure);
        assert_eq!(b.bucket("serve_short"), TacticalCategory::Serve);
        assert_eq!(b.bucket("unknown_thing"), TacticalCategory::Other);
    }

    #[test]
    fn test_closure_is_a_bucketer() {
        let all_reset = |_: &str| TacticalCategory::Reset;
        assert_eq!(all_reset.bucket("anything"), TacticalCategory::Reset);
    }

    #[test]
    fn test_labels_and_keys_roundtrip() {
        for c in TacticalCategory::ALL {
            assert_eq!(TacticalCategory::from_table_key(c.table_key()), Some(c));
        }
        assert_eq!(TacticalCategory::Reset.to_string(), "Reset/Baseline");
    }
}
