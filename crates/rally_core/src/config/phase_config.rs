//! Phase Segmentation Configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Phases shorter than this are merged into a neighbor (default: 2)
    pub min_phase_length: usize,
    /// Effectiveness swing between consecutive shots that marks a turning point (default: 40.0)
    pub turning_point_threshold: f64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            min_phase_length: 2,
            turning_point_threshold: 40.0,
        }
    }
}
