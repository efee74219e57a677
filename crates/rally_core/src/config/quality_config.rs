//! Effectiveness → quality bin splits

use serde::{Deserialize, Serialize};

use crate::models::QualityBin;

/// Splits used to bucket a 0-100 effectiveness score.
///
/// `low` below `low_below`, `medium` up to and including `high_above`,
/// `high` above it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityBinConfig {
    pub low_below: f64,
    pub high_above: f64,
}

impl Default for QualityBinConfig {
    fn default() -> Self {
        Self {
            low_below: 50.0,
            high_above: 75.0,
        }
    }
}

impl QualityBinConfig {
    pub fn bin(&self, effectiveness: Option<f64>) -> Option<QualityBin> {
        let v = effectiveness?;
        if !v.is_finite() {
            return None;
        }
        if v < self.low_below {
            Some(QualityBin::Low)
        } else if v <= self.high_above {
            Some(QualityBin::Medium)
        } else {
            Some(QualityBin::High)
        }
    }
}
