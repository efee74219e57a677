use serde::Deserialize;
use std::collections::BTreeMap;

use crate::analysis::phase::{CategoryTable, KeywordBucketer, ShotBucketer};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::models::ShotEvent;
use crate::pipeline::analyze_match;
use crate::SCHEMA_VERSION;

pub mod error_codes {
    pub const INVALID_JSON: &str = "E_JSON";
    pub const UNSUPPORTED_SCHEMA: &str = "E_SCHEMA";
}

fn err_code(code: &str, message: impl std::fmt::Display) -> String {
    format!("{code}: {message}")
}

fn analysis_err(err: AnalysisError) -> String {
    err_code(err.code(), err)
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub schema_version: u8,
    pub shots: Vec<ShotEvent>,
    #[serde(default)]
    pub config: Option<AnalysisConfig>,
    /// `{"attacking_shots": [..], ..}`; keyword heuristic when absent
    #[serde(default)]
    pub shot_categories: Option<BTreeMap<String, Vec<String>>>,
}

/// Analyze one match from a JSON request and return the `MatchAnalysis` JSON.
///
/// Errors are `"CODE: message"` strings.
pub fn analyze_match_json(request_json: &str) -> Result<String, String> {
    let request: AnalysisRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code(error_codes::INVALID_JSON, format!("Invalid JSON request: {}", e)))?;

    if request.schema_version != SCHEMA_VERSION {
        return Err(err_code(
            error_codes::UNSUPPORTED_SCHEMA,
            format!("Unsupported schema version: {}", request.schema_version),
        ));
    }

    let config = request.config.unwrap_or_default();
    let table = match request.shot_categories {
        Some(lists) => Some(CategoryTable::from_lists(lists).map_err(analysis_err)?),
        None => None,
    };
    let bucketer: &dyn ShotBucketer = match &table {
        Some(t) => t,
        None => &KeywordBucketer,
    };

    let analysis = analyze_match(&request.shots, &config, bucketer).map_err(analysis_err)?;
    serde_json::to_string(&analysis).map_err(|e| analysis_err(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(extra: serde_json::Value) -> String {
        let mut req = json!({
            "schema_version": 1,
            "shots": [
                {"rally_id": "1_1", "game_number": 1, "rally_number": 1, "stroke_number": 1,
                 "frame_number": 0, "player": "A", "stroke_category": "serve_short", "is_serve": true},
                {"rally_id": "1_1", "game_number": 1, "rally_number": 1, "stroke_number": 2,
                 "frame_number": 24, "player": "P1", "stroke_category": "backhand_lift",
                 "effectiveness": 62.0},
                {"rally_id": "1_1", "game_number": 1, "rally_number": 1, "stroke_number": 3,
                 "frame_number": 51, "player": "A", "stroke_category": "forehand_smash"}
            ]
        });
        if let (Some(obj), Some(more)) = (req.as_object_mut(), extra.as_object()) {
            for (k, v) in more {
                obj.insert(k.clone(), v.clone());
            }
        }
        req.to_string()
    }

    #[test]
    fn test_basic_request() {
        let out = analyze_match_json(&request(json!({}))).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["schema_version"], 1);
        assert_eq!(parsed["responses"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["responses"][0]["threshold_source"], "baseline");
        assert_eq!(parsed["responses"][0]["incoming_quality_bin"], serde_json::Value::Null);
        assert_eq!(parsed["phases"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_schema_version_checked() {
        let err = analyze_match_json(&request(json!({"schema_version": 2}))).unwrap_err();
        assert!(err.starts_with("E_SCHEMA:"), "{}", err);
    }

    #[test]
    fn test_bad_json_and_bad_config() {
        let err = analyze_match_json("{").unwrap_err();
        assert!(err.starts_with("E_JSON:"));

        let err =
            analyze_match_json(&request(json!({"config": {"tempo": {"fps": 0.0}}}))).unwrap_err();
        assert!(err.starts_with("E_FPS:"), "{}", err);

        let err = analyze_match_json(&request(json!({"shot_categories": {}}))).unwrap_err();
        assert!(err.starts_with("E_CONFIG:"), "{}", err);
    }

    #[test]
    fn test_category_table_drives_phases() {
        let out = analyze_match_json(&request(json!({
            "shot_categories": {"pressure_shots": ["forehand_smash"]}
        })))
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let a_phases = &parsed["phases"][0]["phases"];
        assert_eq!(a_phases[1]["category"], "pressure");
        assert_eq!(a_phases[1]["label"], "Pressure");
    }

    #[test]
    fn test_deterministic_output() {
        let req = request(json!({}));
        assert_eq!(
            analyze_match_json(&req).unwrap(),
            analyze_match_json(&req).unwrap()
        );
    }
}
