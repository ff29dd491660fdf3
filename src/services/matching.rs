use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{
    apply_clarification, choose_clarifying_question, AttributeProvider, ClarifyField, ClarifyingQuestion,
    MatchError, MatchResult, Matcher,
};
use crate::models::{AttributeSet, MatchCandidate, Report};
use crate::services::cache::AttributeCache;
use crate::services::store::{ReportStore, StoreError};

/// Matches plus the follow-up question to show the reporter
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub source_id: String,
    pub result: MatchResult,
    pub clarifying_question: Option<ClarifyingQuestion>,
}

/// Number of top matches considered when choosing a clarifying question
const CLARIFY_TOP_N: usize = 5;

/// Ties the report store, attribute cache and matcher together
///
/// Fetches the source report and its candidate pool, warms attributes
/// through the cache and runs the matcher. A cache miss reuses attributes
/// the store already holds; only reports with none are extracted, and those
/// extractions are written back.
pub struct MatchingService {
    store: Arc<dyn ReportStore>,
    cache: Arc<AttributeCache>,
    matcher: Arc<Matcher>,
    max_results_cap: usize,
}

impl MatchingService {
    pub fn new(
        store: Arc<dyn ReportStore>,
        cache: Arc<AttributeCache>,
        matcher: Arc<Matcher>,
        max_results_cap: usize,
    ) -> Self {
        Self {
            store,
            cache,
            matcher,
            max_results_cap: max_results_cap.max(1),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn cache(&self) -> &AttributeCache {
        &self.cache
    }

    /// Run extraction on arbitrary text
    pub fn extract(&self, text: &str) -> AttributeSet {
        self.matcher.extractor().extract(text)
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }

    /// Find matches for a stored report
    pub async fn find_matches_for(
        &self,
        report_id: &str,
        limit: Option<usize>,
    ) -> Result<MatchOutcome, MatchError> {
        let source = self.load_report(report_id).await?;
        self.find_matches(&source, limit).await
    }

    /// Find matches for a report against the store's open opposite-kind pool
    pub async fn find_matches(
        &self,
        source: &Report,
        limit: Option<usize>,
    ) -> Result<MatchOutcome, MatchError> {
        if let Some(field) = source.missing_field() {
            return Err(MatchError::InvalidReport(field.to_string()));
        }

        let candidates = self
            .store
            .get_open_candidates(source.kind.opposite())
            .await
            .map_err(|e| {
                tracing::error!("Failed to load candidate pool for {}: {}", source.id, e);
                MatchError::CandidatePoolUnavailable(e.to_string())
            })?;

        tracing::debug!("Loaded {} candidates for report {}", candidates.len(), source.id);

        let mut to_warm: Vec<&Report> = Vec::with_capacity(candidates.len() + 1);
        to_warm.push(source);
        to_warm.extend(candidates.iter());
        self.warm_attributes(&to_warm).await;

        let source_attrs = self.cache.attributes(source);
        let pool_attrs: HashMap<String, Arc<AttributeSet>> = candidates
            .iter()
            .map(|c| (c.id.clone(), self.cache.attributes(c)))
            .collect();

        let limit = limit
            .unwrap_or_else(|| self.matcher.max_results())
            .clamp(1, self.max_results_cap);

        let result = self
            .matcher
            .find_matches_with(source, candidates, self.cache.as_ref(), limit)?;

        let top: Vec<&AttributeSet> = result
            .matches
            .iter()
            .take(CLARIFY_TOP_N)
            .filter_map(|m| pool_attrs.get(&m.candidate_id).map(Arc::as_ref))
            .collect();
        let clarifying_question = choose_clarifying_question(&source_attrs, &top);

        tracing::info!(
            "Returning {} matches for report {} (from {} candidates)",
            result.matches.len(),
            source.id,
            result.total_candidates
        );

        Ok(MatchOutcome {
            source_id: source.id.clone(),
            result,
            clarifying_question,
        })
    }

    /// Score two stored reports against each other, with reasons
    pub async fn explain(&self, report_id: &str, candidate_id: &str) -> Result<MatchCandidate, MatchError> {
        let source = self.load_report(report_id).await?;
        let candidate = self.load_report(candidate_id).await?;

        if let Some(field) = source.missing_field() {
            return Err(MatchError::InvalidReport(field.to_string()));
        }

        self.warm_attributes(&[&source, &candidate]).await;

        Ok(self.matcher.score_pair(&source, &candidate, self.cache.as_ref()))
    }

    /// Apply the reporter's answer to a clarifying question and persist it
    ///
    /// Returns the amended attributes; the next match run for the report
    /// scores with them.
    pub async fn clarify(
        &self,
        report_id: &str,
        field: ClarifyField,
        answer: &str,
    ) -> Result<AttributeSet, MatchError> {
        if answer.trim().is_empty() {
            return Err(MatchError::InvalidReport("answer".to_string()));
        }

        let report = self.load_report(report_id).await?;
        if let Some(missing) = report.missing_field() {
            return Err(MatchError::InvalidReport(missing.to_string()));
        }

        self.warm_attributes(&[&report]).await;
        let mut attrs = AttributeSet::clone(&self.cache.attributes(&report));
        apply_clarification(self.matcher.extractor(), &mut attrs, field, answer);

        self.store
            .save_attributes(&report.id, &attrs)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(id) => MatchError::ReportNotFound(id),
                other => {
                    tracing::error!("Failed to save clarified attributes for {}: {}", report.id, other);
                    MatchError::CandidatePoolUnavailable(other.to_string())
                }
            })?;
        self.cache.insert(&report, Arc::new(attrs.clone()));

        tracing::info!("Applied {:?} clarification to report {}", field, report.id);

        Ok(attrs)
    }

    async fn load_report(&self, report_id: &str) -> Result<Report, MatchError> {
        self.store.get_report(report_id).await.map_err(|e| match e {
            StoreError::NotFound(id) => MatchError::ReportNotFound(id),
            other => {
                tracing::error!("Failed to load report {}: {}", report_id, other);
                MatchError::CandidatePoolUnavailable(other.to_string())
            }
        })
    }

    /// Make sure every report has attributes in the cache
    ///
    /// Misses are looked up in the store in one batch. Whatever is still
    /// missing is extracted and written through; store failures on either
    /// side only cost a warning.
    async fn warm_attributes(&self, reports: &[&Report]) {
        let missing: Vec<&Report> = reports
            .iter()
            .copied()
            .filter(|r| self.cache.get(r).is_none())
            .collect();
        if missing.is_empty() {
            return;
        }

        let ids: Vec<String> = missing.iter().map(|r| r.id.clone()).collect();
        let mut saved = self.store.load_attributes(&ids).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load saved attributes: {}", e);
            HashMap::new()
        });

        let mut reused = 0;
        for report in missing {
            if let Some(attrs) = saved.remove(&report.id) {
                self.cache.insert(report, Arc::new(attrs));
                reused += 1;
                continue;
            }

            let (attrs, fresh) = self.cache.get_or_extract(report);
            if fresh {
                if let Err(e) = self.store.save_attributes(&report.id, &attrs).await {
                    tracing::warn!("Failed to save attributes for report {}: {}", report.id, e);
                }
            }
        }

        tracing::debug!("Warmed {} reports, {} from saved attributes", ids.len(), reused);
    }
}
