use std::cmp::Ordering;

use crate::models::{MatchCandidate, Report};

/// Check if a report may be proposed as a match for the source report
///
/// Only open reports of the opposite kind qualify; a report never matches
/// itself.
#[inline]
pub fn is_eligible_candidate(source: &Report, candidate: &Report) -> bool {
    // Lost only matches Found and vice versa
    if candidate.kind != source.kind.opposite() {
        return false;
    }

    // Claimed, settled, disputed and closed reports are not re-proposed
    if !candidate.is_open() {
        return false;
    }

    candidate.id != source.id
}

/// Check a score against the minimum threshold (inclusive)
#[inline]
pub fn meets_threshold(score: f64, min_score_threshold: f64) -> bool {
    score >= min_score_threshold
}

/// Ranking order: score descending, then newest candidate first, then
/// candidate id ascending so equal inputs always produce the same order.
pub fn rank_order(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.candidate_created_at.cmp(&a.candidate_created_at))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}
