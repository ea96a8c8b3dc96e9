use thiserror::Error;

/// Errors produced by a scoring run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("neighborhood {neighborhood_id} has no usable data for any weighted dimension")]
    InsufficientData { neighborhood_id: String },

    #[error("corpus contains no neighborhoods")]
    EmptyCorpus,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("scoring run was cancelled")]
    Cancelled,
}

impl EngineError {
    /// Stable name reported in diagnostics and error responses
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidProfile(_) => "InvalidProfileError",
            EngineError::InsufficientData { .. } => "InsufficientDataError",
            EngineError::EmptyCorpus => "EmptyCorpusError",
            EngineError::Configuration(_) => "ConfigurationError",
            EngineError::Cancelled => "CancelledError",
        }
    }
}
