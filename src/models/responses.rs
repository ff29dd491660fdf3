use serde::{Deserialize, Serialize};
use crate::core::clarify::ClarifyingQuestion;
use crate::models::domain::{AttributeSet, MatchCandidate};

/// Response for find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    #[serde(rename = "reportId")]
    pub report_id: String,
    pub matches: Vec<MatchCandidate>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "clarifyingQuestion")]
    pub clarifying_question: Option<ClarifyingQuestion>,
}

/// Response for the extraction endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub attributes: AttributeSet,
}

/// Attributes of a report after a clarification was applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifyResponse {
    #[serde(rename = "reportId")]
    pub report_id: String,
    pub attributes: AttributeSet,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
