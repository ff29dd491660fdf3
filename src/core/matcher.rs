use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::error::MatchError;
use crate::core::extractor::{ExtractionConfig, Extractor};
use crate::core::filters::{is_eligible_candidate, meets_threshold, rank_order};
use crate::core::scoring::{explain_match, Scorer};
use crate::models::{AttributeSet, MatchCandidate, Report, ScoringWeights};

/// Source of attribute sets for reports
///
/// The extractor computes them on every call; a cache can serve them from
/// memory instead.
pub trait AttributeProvider {
    fn attributes(&self, report: &Report) -> Arc<AttributeSet>;
}

impl AttributeProvider for Extractor {
    fn attributes(&self, report: &Report) -> Arc<AttributeSet> {
        Arc::new(self.extract(&report.match_text()))
    }
}

/// Engine configuration: vocabularies, rules, weights and result limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default = "default_min_score_threshold")]
    pub min_score_threshold: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_min_score_threshold() -> f64 { 0.35 }
fn default_max_results() -> usize { 10 }

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            weights: ScoringWeights::default(),
            min_score_threshold: default_min_score_threshold(),
            max_results: default_max_results(),
        }
    }
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matches: Vec<MatchCandidate>,
    pub total_candidates: usize,
    pub eligible_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Source validation
/// 2. Kind and status filtering
/// 3. Attribute extraction (or cache lookup)
/// 4. Pairwise scoring, threshold filtering and ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    extractor: Arc<Extractor>,
    scorer: Scorer,
    min_score_threshold: f64,
    max_results: usize,
}

impl Matcher {
    pub fn new(config: &MatchConfig) -> Result<Self, MatchError> {
        if !(0.0..=1.0).contains(&config.min_score_threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "min_score_threshold must be within [0, 1], got {}",
                config.min_score_threshold
            )));
        }
        if config.max_results == 0 {
            return Err(MatchError::InvalidConfig(
                "max_results must be at least 1".to_string(),
            ));
        }

        let extractor = Arc::new(Extractor::new(&config.extraction)?);
        let scorer = Scorer::new(config.weights, Arc::clone(&extractor))?;

        Ok(Self {
            extractor,
            scorer,
            min_score_threshold: config.min_score_threshold,
            max_results: config.max_results,
        })
    }

    pub fn with_defaults() -> Self {
        Self::new(&MatchConfig::default()).expect("default match configuration is valid")
    }

    pub fn extractor(&self) -> &Arc<Extractor> {
        &self.extractor
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn min_score_threshold(&self) -> f64 {
        self.min_score_threshold
    }

    /// Find matches for a report among a candidate pool
    ///
    /// # Arguments
    /// * `source` - The newly submitted (or re-checked) report
    /// * `candidates` - Candidate pool; same-kind and non-open reports are skipped
    ///
    /// # Returns
    /// MatchResult with at most `max_results` matches, best first
    pub fn find_matches(
        &self,
        source: &Report,
        candidates: Vec<Report>,
    ) -> Result<MatchResult, MatchError> {
        self.find_matches_with(source, candidates, self.extractor.as_ref(), self.max_results)
    }

    /// Same as [`Matcher::find_matches`] with an explicit attribute source and
    /// result limit
    pub fn find_matches_with<P>(
        &self,
        source: &Report,
        candidates: Vec<Report>,
        provider: &P,
        limit: usize,
    ) -> Result<MatchResult, MatchError>
    where
        P: AttributeProvider + ?Sized,
    {
        if let Some(field) = source.missing_field() {
            return Err(MatchError::InvalidReport(field.to_string()));
        }

        let total_candidates = candidates.len();
        let source_attrs = provider.attributes(source);
        let source_text = source.match_text();

        let eligible: Vec<Report> = candidates
            .into_iter()
            .filter(|candidate| is_eligible_candidate(source, candidate))
            .collect();
        let eligible_candidates = eligible.len();

        let mut scored: Vec<MatchCandidate> = eligible
            .iter()
            .filter_map(|candidate| {
                let scored = self.score_with(source, &source_attrs, &source_text, candidate, provider);
                tracing::trace!(
                    "Scored {} -> {}: {:.3}",
                    source.id,
                    candidate.id,
                    scored.score
                );
                meets_threshold(scored.score, self.min_score_threshold).then_some(scored)
            })
            .collect();

        scored.sort_by(rank_order);
        scored.truncate(limit);

        tracing::debug!(
            "Report {} ({}): {} matches from {} eligible of {} candidates",
            source.id,
            source.kind,
            scored.len(),
            eligible_candidates,
            total_candidates
        );

        Ok(MatchResult {
            matches: scored,
            total_candidates,
            eligible_candidates,
        })
    }

    /// Score a single pair regardless of eligibility or threshold
    pub fn score_pair<P>(&self, source: &Report, candidate: &Report, provider: &P) -> MatchCandidate
    where
        P: AttributeProvider + ?Sized,
    {
        let source_attrs = provider.attributes(source);
        self.score_with(source, &source_attrs, &source.match_text(), candidate, provider)
    }

    fn score_with<P>(
        &self,
        source: &Report,
        source_attrs: &AttributeSet,
        source_text: &str,
        candidate: &Report,
        provider: &P,
    ) -> MatchCandidate
    where
        P: AttributeProvider + ?Sized,
    {
        let candidate_attrs = provider.attributes(candidate);
        let (score, breakdown) = self.scorer.score(
            source_attrs,
            source_text,
            &candidate_attrs,
            &candidate.match_text(),
        );

        MatchCandidate {
            source_id: source.id.clone(),
            candidate_id: candidate.id.clone(),
            candidate_kind: candidate.kind,
            candidate_created_at: candidate.created_at,
            score,
            breakdown,
            reasons: explain_match(source_attrs, &candidate_attrs, &breakdown),
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportKind, ReportStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn create_report(id: &str, kind: ReportKind, description: &str, age_hours: i64) -> Report {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Report {
            id: id.to_string(),
            kind,
            title: None,
            description: description.to_string(),
            location_text: None,
            owner_id: format!("owner-{}", id),
            status: ReportStatus::Open,
            created_at: base - Duration::hours(age_hours),
        }
    }

    #[test]
    fn test_find_matches_basic() {
        let matcher = Matcher::with_defaults();
        let source = create_report(
            "found-1",
            ReportKind::Found,
            "black leather wallet brand Gucci serial AB1234",
            0,
        );

        let candidates = vec![
            create_report("lost-1", ReportKind::Lost, "lost my black wallet, Gucci, serial AB1234", 2),
            create_report("lost-2", ReportKind::Lost, "found red backpack", 1),
        ];

        let result = matcher.find_matches(&source, candidates).unwrap();

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].candidate_id, "lost-1");
        assert_eq!(result.matches[0].score, 1.0);
        assert_eq!(result.total_candidates, 2);
    }

    #[test]
    fn test_same_kind_and_closed_excluded() {
        let matcher = Matcher::with_defaults();
        let source = create_report("lost-1", ReportKind::Lost, "black gucci wallet AB1234", 0);

        let mut closed = create_report("found-2", ReportKind::Found, "black gucci wallet AB1234", 1);
        closed.status = ReportStatus::Settled;

        let candidates = vec![
            create_report("lost-9", ReportKind::Lost, "black gucci wallet AB1234", 1),
            closed,
            create_report("found-3", ReportKind::Found, "black gucci wallet AB1234", 1),
        ];

        let result = matcher.find_matches(&source, candidates).unwrap();

        assert_eq!(result.eligible_candidates, 1);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].candidate_id, "found-3");
    }

    #[test]
    fn test_respects_limit() {
        let matcher = Matcher::with_defaults();
        let source = create_report("s", ReportKind::Lost, "blue samsung phone", 0);

        let candidates: Vec<Report> = (0..25)
            .map(|i| create_report(&format!("f{:02}", i), ReportKind::Found, "blue samsung phone", i))
            .collect();

        let result = matcher.find_matches(&source, candidates.clone()).unwrap();
        assert_eq!(result.matches.len(), 10);

        let result = matcher
            .find_matches_with(&source, candidates, matcher.extractor().as_ref(), 3)
            .unwrap();
        assert_eq!(result.matches.len(), 3);
        // Equal scores: freshest first
        assert_eq!(result.matches[0].candidate_id, "f00");
        assert_eq!(result.matches[2].candidate_id, "f02");
    }

    #[test]
    fn test_invalid_source_rejected() {
        let matcher = Matcher::with_defaults();
        let source = create_report("s", ReportKind::Lost, "   ", 0);

        let err = matcher.find_matches(&source, vec![]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidReport(ref field) if field == "description"));
    }

    #[test]
    fn test_garbage_candidate_degrades_quietly() {
        let matcher = Matcher::with_defaults();
        let source = create_report("s", ReportKind::Lost, "black samsung phone", 0);
        let candidates = vec![create_report("f", ReportKind::Found, "%%%% ???", 0)];

        let result = matcher.find_matches(&source, candidates).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.eligible_candidates, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MatchConfig { max_results: 0, ..MatchConfig::default() };
        assert!(Matcher::new(&config).is_err());

        let config = MatchConfig { min_score_threshold: 1.5, ..MatchConfig::default() };
        assert!(Matcher::new(&config).is_err());

        let config = MatchConfig {
            weights: ScoringWeights { text: 0.5, ..ScoringWeights::default() },
            ..MatchConfig::default()
        };
        assert!(Matcher::new(&config).is_err());
    }
}
