//! # Threshold & Classification Engine
//!
//! Stage order is fixed: every sample is extracted and every baseline family
//! is built from the complete sample set before any classification runs.
//!
//! ```text
//! rallies ─► response ─► baseline (frozen) ─► classify ─► summary
//! ```

pub mod baseline;
pub mod classify;
pub mod response;
pub mod summary;

pub use baseline::{
    build_baselines, BaselineFamily, BaselineKey, BaselineRow, BaselineSet, FALLBACK_ORDER,
};
pub use classify::{
    baseline_z_score, classify, classify_sample, classify_samples, select_threshold,
    ClassifiedResponse, TempoLabel, Threshold,
};
pub use response::{extract_rally_samples, extract_response_samples, ResponseTimeSample};
pub use summary::{
    combo_fast_slow, combo_patterns, detect_highlights, serve_receive, summarize_rallies,
    ComboFastSlow, ComboPattern, HighlightEvent, HighlightReason, RallyTempoSummary,
    ServeReceiveSummary,
};

use crate::config::AnalysisConfig;
use crate::models::RallyShots;

/// Full output of the tempo engine for one match.
#[derive(Debug, Clone)]
pub struct TempoAnalysis {
    pub samples: Vec<ResponseTimeSample>,
    pub baselines: BaselineSet,
    pub responses: Vec<ClassifiedResponse>,
}

impl TempoAnalysis {
    /// Extract, build, classify.
    pub fn run(rallies: &[RallyShots<'_>], config: &AnalysisConfig) -> Self {
        let samples = extract_response_samples(rallies, config);
        let baselines = build_baselines(&samples, &config.tempo);
        let responses = classify_samples(&samples, &baselines);
        Self {
            samples,
            baselines,
            responses,
        }
    }

    pub fn rally_summaries(&self) -> Vec<RallyTempoSummary> {
        summarize_rallies(&self.responses, &self.baselines)
    }

    pub fn highlights(&self, config: &AnalysisConfig) -> Vec<HighlightEvent> {
        detect_highlights(
            &self.samples,
            &self.responses,
            &self.baselines,
            &config.highlights,
        )
    }

    pub fn combo_patterns(&self, config: &AnalysisConfig) -> Vec<ComboPattern> {
        combo_patterns(&self.responses, &self.baselines, &config.highlights)
    }

    pub fn combo_fast_slow(&self, config: &AnalysisConfig) -> Vec<ComboFastSlow> {
        combo_fast_slow(&self.responses, &config.highlights)
    }

    pub fn serve_receive(&self) -> Vec<ServeReceiveSummary> {
        serve_receive(&self.responses, &self.baselines)
    }

    /// Share of responses per threshold source, in fallback order.
    pub fn source_counts(&self) -> Vec<(BaselineFamily, usize)> {
        FALLBACK_ORDER
            .iter()
            .map(|&family| {
                let n = self
                    .responses
                    .iter()
                    .filter(|r| r.threshold_source == Some(family))
                    .count();
                (family, n)
            })
            .collect()
    }
}
