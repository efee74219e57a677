//! # Analysis Configuration Module
//!
//! Every tuning constant of the tempo and phase engines lives here.
//!
//! ## Presets
//! - `standard()` - defaults tuned for a full match (hundreds of shots)
//! - `sparse()` - lower minimum counts for short matches or single games
//!
//! ## Usage
//! ```rust
//! use rally_core::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! assert!(config.validate().is_ok());
//! let sparse = AnalysisConfig::sparse();
//! assert!(sparse.tempo.min_combo_n < config.tempo.min_combo_n);
//! ```

mod highlight_config;
mod phase_config;
mod quality_config;
mod tempo_config;

pub use highlight_config::HighlightConfig;
pub use phase_config::PhaseConfig;
pub use quality_config::QualityBinConfig;
pub use tempo_config::TempoConfig;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Full configuration for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub tempo: TempoConfig,
    #[serde(default)]
    pub quality: QualityBinConfig,
    #[serde(default)]
    pub highlights: HighlightConfig,
    #[serde(default)]
    pub phase: PhaseConfig,
}

impl AnalysisConfig {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Short matches: combos rarely reach 30 samples, so trust smaller groups.
    pub fn sparse() -> Self {
        let mut cfg = Self::default();
        cfg.tempo.min_combo_n = 8;
        cfg.tempo.min_opponent_n = 12;
        cfg.highlights.pattern_min_n = 8;
        cfg
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.tempo.fps = fps;
        self
    }

    /// Reject configurations the engines cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.tempo;
        if !t.fps.is_finite() || t.fps <= 0.0 {
            return Err(AnalysisError::InvalidFps(t.fps));
        }
        if !t.lower_cap.is_finite() || !t.upper_cap.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "response-time caps must be finite".to_string(),
            ));
        }
        if t.lower_cap > t.upper_cap {
            return Err(AnalysisError::InvalidConfig(format!(
                "lower_cap {} exceeds upper_cap {}",
                t.lower_cap, t.upper_cap
            )));
        }

        let q = &self.quality;
        if !(q.low_below <= q.high_above) {
            return Err(AnalysisError::InvalidConfig(format!(
                "quality split low_below {} exceeds high_above {}",
                q.low_below, q.high_above
            )));
        }

        if self.phase.min_phase_length == 0 {
            return Err(AnalysisError::InvalidConfig(
                "min_phase_length must be at least 1".to_string(),
            ));
        }
        if !(self.phase.turning_point_threshold >= 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "turning_point_threshold must be >= 0".to_string(),
            ));
        }

        let h = &self.highlights;
        if !(h.standout_z >= 0.0) || !(h.pattern_rate >= 0.0) || !(h.pattern_delta >= 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "highlight thresholds must be >= 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ========== Tests ==========
