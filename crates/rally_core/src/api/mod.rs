//! JSON entry points for hosts that exchange strings rather than Rust types.

pub mod json_api;

pub use json_api::{analyze_match_json, AnalysisRequest};
