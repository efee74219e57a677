//! Tempo Classification Configuration

use serde::{Deserialize, Serialize};

/// Response-time extraction and baseline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Video frame rate used to convert frames to seconds (default: 30.0)
    pub fps: f64,
    /// Lower clamp for response times in seconds (default: 0.15)
    pub lower_cap: f64,
    /// Upper clamp for response times in seconds (default: 4.0)
    pub upper_cap: f64,
    /// Min samples to trust a combo-level statistic (default: 30)
    pub min_combo_n: usize,
    /// Min samples to trust an opponent-only statistic (default: 30)
    pub min_opponent_n: usize,
    /// Emit samples for serve shots themselves (default: false)
    pub include_serves: bool,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            lower_cap: 0.15,
            upper_cap: 4.0,
            min_combo_n: 30,
            min_opponent_n: 30,
            include_serves: false,
        }
    }
}

impl TempoConfig {
    /// Clamp a raw response time into `[lower_cap, upper_cap]`.
    pub fn clamp(&self, value: f64) -> f64 {
        crate::analysis::stats::clamp(value, self.lower_cap, self.upper_cap)
    }
}
