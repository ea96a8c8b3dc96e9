use crate::models::domain::{Diagnostic, MatchResult};
use serde::{Deserialize, Serialize};

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchNeighborhoodsResponse {
    pub results: Vec<MatchResult>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "generatedAt")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub neighborhoods: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Corpus reload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub neighborhoods: usize,
    pub peers: usize,
}
