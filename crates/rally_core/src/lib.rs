//! # rally_core - Rally Tempo & Phase Analysis Engine
//!
//! Batch analysis of one racket-sport match given as an ordered list of
//! shot events.
//!
//! ## Features
//! - Response-time labels (fast / normal / slow) from a six-level baseline
//!   fallback, with the chosen source kept on every label
//! - Robust z-scores, highlights, combo patterns and serve-receive summaries
//! - Tactical phase segmentation with minimum-length merging; serves are
//!   never merged
//! - Deterministic output and a schema-versioned JSON API
//!
//! ## Usage
//! ```rust
//! use rally_core::{analyze_match, AnalysisConfig, KeywordBucketer, Player, ShotEvent};
//!
//! let shot = |stroke: u32, frame: i64, player: Player, label: &str| ShotEvent {
//!     rally_id: "1_1".to_string(),
//!     game_number: 1,
//!     rally_number: 1,
//!     stroke_number: stroke,
//!     frame_number: frame,
//!     player,
//!     stroke_category: label.to_string(),
//!     is_serve: stroke == 1,
//!     effectiveness: None,
//!     rally_winner: None,
//!     outcome: None,
//! };
//! let shots = vec![
//!     shot(1, 0, Player::A, "serve_short"),
//!     shot(2, 27, Player::B, "backhand_lift"),
//!     shot(3, 60, Player::A, "forehand_smash"),
//! ];
//!
//! let analysis = analyze_match(&shots, &AnalysisConfig::default(), &KeywordBucketer).unwrap();
//! assert_eq!(analysis.responses.len(), 2);
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;

pub use analysis::phase::{
    segment_match, CategoryTable, ControlBand, KeywordBucketer, PhaseSegment, RallyPhases,
    ShotBucketer, TacticalCategory,
};
pub use analysis::tempo::{
    BaselineFamily, ClassifiedResponse, TempoAnalysis, TempoLabel, FALLBACK_ORDER,
};
pub use api::analyze_match_json;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use models::{Player, QualityBin, RallyOutcome, ShotEvent, ShotOutcome};
pub use pipeline::{analyze_match, MatchAnalysis};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the JSON request and `MatchAnalysis` layout
pub const SCHEMA_VERSION: u8 = 1;
