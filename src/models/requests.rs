use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::clarify::ClarifyField;

/// Request to find matches for a stored report
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "report_id", rename = "reportId")]
    pub report_id: String,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to explain how two reports score against each other
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExplainMatchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "report_id", rename = "reportId")]
    pub report_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "candidate_id", rename = "candidateId")]
    pub candidate_id: String,
}

/// Request to run attribute extraction on free text
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtractRequest {
    #[validate(length(max = 10000))]
    pub text: String,
}

/// Reporter's answer to a clarifying question
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClarifyRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "report_id", rename = "reportId")]
    pub report_id: String,
    pub field: ClarifyField,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}
