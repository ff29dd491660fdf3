use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{AttributeSet, Report, ReportKind};

/// Errors that can occur when talking to the report store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Report store adapter consumed by the matching service
///
/// Owns report persistence; the matcher only reads reports and writes
/// derived attributes back.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Fetch a single report by id
    async fn get_report(&self, report_id: &str) -> Result<Report, StoreError>;

    /// All currently open reports of the requested kind
    async fn get_open_candidates(&self, kind: ReportKind) -> Result<Vec<Report>, StoreError>;

    /// Persist extracted attributes next to a report
    ///
    /// Optional caching hook: matching stays correct when this is a no-op.
    async fn save_attributes(&self, report_id: &str, attributes: &AttributeSet) -> Result<(), StoreError>;

    /// Previously saved attributes for the given reports
    ///
    /// Reports with nothing saved are left out of the map. Saved attributes
    /// must be dropped whenever a report's text changes.
    async fn load_attributes(&self, report_ids: &[String]) -> Result<HashMap<String, AttributeSet>, StoreError>;

    /// Health check for the backing store
    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// In-process report store for tests and local runs
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: RwLock<BTreeMap<String, Report>>,
    attributes: RwLock<HashMap<String, AttributeSet>>,
    unavailable: AtomicBool,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: impl IntoIterator<Item = Report>) -> Self {
        let map = reports.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            reports: RwLock::new(map),
            ..Self::default()
        }
    }

    /// Insert or replace a report; a replaced report drops its saved attributes
    pub async fn upsert(&self, report: Report) {
        self.attributes.write().await.remove(&report.id);
        self.reports.write().await.insert(report.id.clone(), report);
    }

    pub async fn saved_attributes(&self, report_id: &str) -> Option<AttributeSet> {
        self.attributes.read().await.get(report_id).cloned()
    }

    /// Make every subsequent call fail, to exercise degraded paths
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn get_report(&self, report_id: &str) -> Result<Report, StoreError> {
        self.check_available()?;
        self.reports
            .read()
            .await
            .get(report_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(report_id.to_string()))
    }

    async fn get_open_candidates(&self, kind: ReportKind) -> Result<Vec<Report>, StoreError> {
        self.check_available()?;
        Ok(self
            .reports
            .read()
            .await
            .values()
            .filter(|r| r.kind == kind && r.is_open())
            .cloned()
            .collect())
    }

    async fn save_attributes(&self, report_id: &str, attributes: &AttributeSet) -> Result<(), StoreError> {
        self.check_available()?;
        if !self.reports.read().await.contains_key(report_id) {
            return Err(StoreError::NotFound(report_id.to_string()));
        }
        self.attributes
            .write()
            .await
            .insert(report_id.to_string(), attributes.clone());
        Ok(())
    }

    async fn load_attributes(&self, report_ids: &[String]) -> Result<HashMap<String, AttributeSet>, StoreError> {
        self.check_available()?;
        let saved = self.attributes.read().await;
        Ok(report_ids
            .iter()
            .filter_map(|id| saved.get(id).map(|attrs| (id.clone(), attrs.clone())))
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.unavailable.load(Ordering::SeqCst))
    }
}
