use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{AttributeProvider, Extractor};
use crate::models::{AttributeSet, Report};

/// In-memory attribute cache
///
/// Entries are keyed by report id plus a hash of the report's match text,
/// so an edited description is a guaranteed miss and never serves stale
/// attributes. Write-through to the report store is done by the caller
/// whenever [`AttributeCache::get_or_extract`] reports a fresh extraction.
pub struct AttributeCache {
    entries: moka::sync::Cache<String, Arc<AttributeSet>>,
    extractor: Arc<Extractor>,
}

impl AttributeCache {
    /// Create a new cache bounded by entry count and time-to-live
    pub fn new(extractor: Arc<Extractor>, capacity: u64, ttl_secs: u64) -> Self {
        let entries = moka::sync::Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { entries, extractor }
    }

    /// Cached attributes for a report, extracting on a miss
    ///
    /// The flag is true when the attributes were freshly extracted.
    pub fn get_or_extract(&self, report: &Report) -> (Arc<AttributeSet>, bool) {
        let text = report.match_text();
        let key = CacheKey::attributes(&report.id, &text);

        if let Some(attrs) = self.entries.get(&key) {
            tracing::trace!("Attribute cache hit: {}", key);
            return (attrs, false);
        }

        let attrs = Arc::new(self.extractor.extract(&text));
        self.entries.insert(key.clone(), Arc::clone(&attrs));
        tracing::trace!("Attribute cache set: {}", key);

        (attrs, true)
    }

    /// Cached attributes for a report's current text, without extracting
    pub fn get(&self, report: &Report) -> Option<Arc<AttributeSet>> {
        self.entries.get(&CacheKey::attributes(&report.id, &report.match_text()))
    }

    /// Cache attributes obtained elsewhere, e.g. loaded from the store or
    /// amended by a clarification
    pub fn insert(&self, report: &Report, attrs: Arc<AttributeSet>) {
        let key = CacheKey::attributes(&report.id, &report.match_text());
        self.entries.insert(key, attrs);
    }

    /// Drop the cached entry for a report's current text
    pub fn invalidate(&self, report: &Report) {
        let key = CacheKey::attributes(&report.id, &report.match_text());
        self.entries.invalidate(&key);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            entries: self.entries.entry_count(),
        }
    }
}

impl AttributeProvider for AttributeCache {
    fn attributes(&self, report: &Report) -> Arc<AttributeSet> {
        self.get_or_extract(report).0
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a report's extracted attributes
    pub fn attributes(report_id: &str, text: &str) -> String {
        format!("attrs:{}:{}", report_id, Self::content_hash(text))
    }

    /// Hex SHA-256 of the text the attributes were extracted from
    pub fn content_hash(text: &str) -> String {
        format!("{:x}", Sha256::digest(text.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportKind, ReportStatus};
    use chrono::Utc;

    fn create_report(description: &str) -> Report {
        Report {
            id: "r1".to_string(),
            kind: ReportKind::Found,
            title: None,
            description: description.to_string(),
            location_text: None,
            owner_id: "owner".to_string(),
            status: ReportStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_cache_key_builder() {
        let key = CacheKey::attributes("r1", "black wallet");
        assert!(key.starts_with("attrs:r1:"));
        assert_eq!(key.len(), "attrs:r1:".len() + 64);
        assert_eq!(key, CacheKey::attributes("r1", "black wallet"));
        assert_ne!(key, CacheKey::attributes("r1", "black wallet!"));
    }

    #[test]
    fn test_second_lookup_hits() {
        let cache = AttributeCache::new(Arc::new(Extractor::with_defaults()), 100, 60);
        let report = create_report("black gucci wallet");

        let (first, fresh) = cache.get_or_extract(&report);
        assert!(fresh);
        let (second, fresh) = cache.get_or_extract(&report);
        assert!(!fresh);
        assert_eq!(first, second);
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_edited_description_misses() {
        let cache = AttributeCache::new(Arc::new(Extractor::with_defaults()), 100, 60);

        let (before, _) = cache.get_or_extract(&create_report("black gucci wallet"));
        let (after, fresh) = cache.get_or_extract(&create_report("red prada wallet"));

        assert!(fresh);
        assert_eq!(before.brand.as_deref(), Some("gucci"));
        assert_eq!(after.brand.as_deref(), Some("prada"));
    }

    #[test]
    fn test_inserted_attributes_win_over_extraction() {
        let cache = AttributeCache::new(Arc::new(Extractor::with_defaults()), 100, 60);
        let report = create_report("black wallet");
        assert!(cache.get(&report).is_none());

        let saved = AttributeSet {
            brand: Some("gucci".to_string()),
            ..Extractor::with_defaults().extract("black wallet")
        };
        cache.insert(&report, Arc::new(saved.clone()));

        let (attrs, fresh) = cache.get_or_extract(&report);
        assert!(!fresh);
        assert_eq!(*attrs, saved);
        assert!(cache.get(&create_report("black wallet, edited")).is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = AttributeCache::new(Arc::new(Extractor::with_defaults()), 100, 60);
        let report = create_report("black gucci wallet");

        cache.get_or_extract(&report);
        cache.invalidate(&report);
        let (_, fresh) = cache.get_or_extract(&report);
        assert!(fresh);
    }
}
