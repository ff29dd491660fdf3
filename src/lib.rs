//! Lost & found matching engine
//!
//! Extracts structured attributes (category, colors, brand, identifiers,
//! marks) from free-text lost and found reports, scores report pairs with a
//! fixed weighted similarity and returns ranked candidate matches with
//! human-readable reasons.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Extractor, MatchConfig, MatchError, Matcher, Scorer};
pub use models::{AttributeSet, MatchCandidate, Report, ReportKind, ReportStatus, ScoringWeights};
