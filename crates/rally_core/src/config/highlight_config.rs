//! Highlight & pattern detection thresholds

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// |z| against the player baseline MAD that flags a standout (default: 2.0)
    pub standout_z: f64,
    /// Min samples before a combo pattern can be flagged (default: 30)
    pub pattern_min_n: usize,
    /// Fast or slow rate that flags a combo pattern (default: 0.35)
    pub pattern_rate: f64,
    /// |median - player median| in seconds that flags a combo pattern (default: 0.15)
    pub pattern_delta: f64,
    /// Fast or slow labels a stroke pair needs to be listed in the
    /// fast/slow timing summary (default: 3)
    pub fast_slow_min_count: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            standout_z: 2.0,
            pattern_min_n: 30,
            pattern_rate: 0.35,
            pattern_delta: 0.15,
            fast_slow_min_count: 3,
        }
    }
}
