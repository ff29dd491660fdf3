// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AttributeSet, MatchCandidate, Report, ReportKind, ReportStatus, ScoreBreakdown, ScoringWeights,
    UNKNOWN_CATEGORY,
};
pub use requests::{ClarifyRequest, ExplainMatchRequest, ExtractRequest, FindMatchesRequest};
pub use responses::{ClarifyResponse, ErrorResponse, ExtractResponse, FindMatchesResponse, HealthResponse};
