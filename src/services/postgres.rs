use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;

use crate::models::{AttributeSet, Report, ReportKind, ReportStatus};
use crate::services::store::{ReportStore, StoreError};

const REPORT_COLUMNS: &str =
    "id, kind, title, description, location_text, owner_id, status, created_at";

/// PostgreSQL-backed report store
///
/// Reports live in the `reports` table; extracted attributes are written
/// to its `attributes` JSONB column.
pub struct PostgresReportStore {
    pool: PgPool,
}

impl PostgresReportStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL report store");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    fn row_to_report(row: &PgRow) -> Result<Report, StoreError> {
        let kind: String = row.try_get("kind")?;
        let status: String = row.try_get("status")?;

        Ok(Report {
            id: row.try_get("id")?,
            kind: kind.parse::<ReportKind>().map_err(StoreError::InvalidData)?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            location_text: row.try_get("location_text")?,
            owner_id: row.try_get("owner_id")?,
            status: status.parse::<ReportStatus>().map_err(StoreError::InvalidData)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ReportStore for PostgresReportStore {
    async fn get_report(&self, report_id: &str) -> Result<Report, StoreError> {
        let query = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(report_id.to_string()))?;

        Self::row_to_report(&row)
    }

    async fn get_open_candidates(&self, kind: ReportKind) -> Result<Vec<Report>, StoreError> {
        let query = format!(
            "SELECT {} FROM reports WHERE kind = $1 AND status = 'open' ORDER BY created_at DESC",
            REPORT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        let reports = rows
            .iter()
            .map(Self::row_to_report)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} open {} reports", reports.len(), kind);

        Ok(reports)
    }

    async fn save_attributes(&self, report_id: &str, attributes: &AttributeSet) -> Result<(), StoreError> {
        let query = r#"
            UPDATE reports
            SET attributes = $2, attributes_updated_at = NOW()
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(report_id)
            .bind(Json(attributes))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(report_id.to_string()));
        }

        Ok(())
    }

    async fn load_attributes(&self, report_ids: &[String]) -> Result<HashMap<String, AttributeSet>, StoreError> {
        if report_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT id, attributes FROM reports WHERE id = ANY($1) AND attributes IS NOT NULL",
        )
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut loaded = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id")?;
            let Json(attributes): Json<AttributeSet> = row.try_get("attributes")?;
            loaded.insert(id, attributes);
        }

        tracing::debug!("Loaded saved attributes for {}/{} reports", loaded.len(), report_ids.len());

        Ok(loaded)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
