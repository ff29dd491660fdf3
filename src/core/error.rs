use thiserror::Error;

/// Errors raised by the matching engine
///
/// Sparse or unparseable report text is never an error; it degrades to an
/// empty attribute set and a low score.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid report: missing required field '{0}'")]
    InvalidReport(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Candidate pool unavailable: {0}")]
    CandidatePoolUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
