use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid fps: {0} (must be finite and > 0)")]
    InvalidFps(f64),

    #[error("Non-monotonic stroke number in rally {rally_id}: {found} follows {previous}")]
    NonMonotonicStroke {
        rally_id: String,
        previous: u32,
        found: u32,
    },

    #[error("Shot with empty rally id at stroke {stroke_number}")]
    EmptyRallyId { stroke_number: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Whether the caller's data (not the engine) is at fault.
    pub fn is_input_error(&self) -> bool {
        match self {
            AnalysisError::InvalidConfig(_) => true,
            AnalysisError::InvalidFps(_) => true,
            AnalysisError::NonMonotonicStroke { .. } => true,
            AnalysisError::EmptyRallyId { .. } => true,
            AnalysisError::Serialization(_) => false,
        }
    }

    /// Stable error code used by the JSON API.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidConfig(_) => "E_CONFIG",
            AnalysisError::InvalidFps(_) => "E_FPS",
            AnalysisError::NonMonotonicStroke { .. } => "E_STROKE_ORDER",
            AnalysisError::EmptyRallyId { .. } => "E_RALLY_ID",
            AnalysisError::Serialization(_) => "E_SERDE",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
