//! SQLite-backed [`JobStore`] implementation.
//!
//! Each document lives as JSON in the `doc` column; the scalar columns
//! exist only for the filters and ordering the store trait promises.
//! `category` equality compares `lower(category)` so mixed-case rows left
//! by older writers still match (tolerant reads).

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use jobless_core::models::{JobRecord, JobReportRecord, ReportStatus, SubscriberRecord};
use jobless_core::store::{DocPosition, JobStore, StoreError};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (and create if missing) the database at `[db].path`.
    pub async fn connect(config: &Config) -> anyhow::Result<SqliteStore> {
        let db_path = &config.db.path;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(SqliteStore::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn decode_doc(row: &sqlx::sqlite::SqliteRow) -> Result<JobRecord, StoreError> {
    let doc: String = row.get("doc");
    serde_json::from_str(&doc).map_err(|e| StoreError::Backend(format!("corrupt job document: {e}")))
}

fn decode_report(row: &sqlx::sqlite::SqliteRow) -> Result<JobReportRecord, StoreError> {
    let status: String = row.get("status");
    let status = ReportStatus::parse(&status)
        .ok_or_else(|| StoreError::Backend(format!("unknown report status: {status}")))?;
    Ok(JobReportRecord {
        id: row.get("id"),
        job_id: row.get("job_id"),
        job_title: row.get("job_title"),
        company: row.get("company"),
        status,
        reported_at: micros_to_utc(row.get("reported_at"))?,
        reviewed_at: row
            .get::<Option<i64>, _>("reviewed_at")
            .map(micros_to_utc)
            .transpose()?,
        reviewed_by: row.get("reviewed_by"),
        action_taken: row.get("action_taken"),
    })
}

fn micros_to_utc(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {micros}")))
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn fetch_recent(
        &self,
        limit: usize,
        after: Option<&DocPosition>,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let rows = match after {
            Some(pos) => {
                sqlx::query(
                    r#"
                    SELECT doc FROM jobs
                    WHERE status != 'draft'
                      AND (posted_at < ? OR (posted_at = ? AND id > ?))
                    ORDER BY posted_at DESC, id ASC
                    LIMIT ?
                    "#,
                )
                .bind(pos.posted_at.timestamp_micros())
                .bind(pos.posted_at.timestamp_micros())
                .bind(&pos.id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT doc FROM jobs
                    WHERE status != 'draft'
                    ORDER BY posted_at DESC, id ASC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_err)?;

        rows.iter().map(decode_doc).collect()
    }

    async fn fetch_recent_unordered(&self, limit: usize) -> Result<Vec<JobRecord>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM jobs WHERE status != 'draft' LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        rows.iter().map(decode_doc).collect()
    }

    async fn fetch_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<JobRecord>, StoreError> {
        // Equality only, no ORDER BY: the query layer sorts its snapshot.
        let rows = sqlx::query(
            "SELECT doc FROM jobs WHERE status != 'draft' AND lower(category) = ? LIMIT ?",
        )
        .bind(category)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        rows.iter().map(decode_doc).collect()
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        let row = sqlx::query("SELECT doc FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.as_ref().map(decode_doc).transpose()
    }

    async fn insert_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        let doc = serde_json::to_string(job)
            .map_err(|e| StoreError::Backend(format!("encode job document: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO jobs (id, category, batch_year, status, posted_at, location, doc)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.category)
        .bind(&job.batch_year)
        .bind(job.status.as_str())
        .bind(job.posted_at.timestamp_micros())
        .bind(&job.location)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn update_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        let doc = serde_json::to_string(job)
            .map_err(|e| StoreError::Backend(format!("encode job document: {e}")))?;
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET category = ?, batch_year = ?, status = ?, posted_at = ?, location = ?, doc = ?
            WHERE id = ?
            "#,
        )
        .bind(&job.category)
        .bind(&job.batch_year)
        .bind(job.status.as_str())
        .bind(job.posted_at.timestamp_micros())
        .bind(&job.location)
        .bind(doc)
        .bind(&job.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("job {}", job.id)));
        }
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_subscriber(&self, sub: &SubscriberRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO subscribers (email, subscribed_at, is_active) VALUES (?, ?, ?)")
            .bind(&sub.email)
            .bind(sub.subscribed_at.timestamp_micros())
            .bind(sub.is_active)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn list_subscriber_emails(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT email FROM subscribers WHERE is_active = 1 ORDER BY email")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(rows.iter().map(|r| r.get("email")).collect())
    }

    async fn insert_report(&self, report: &JobReportRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO expired_job_reports
                (id, job_id, job_title, company, status, reported_at, reviewed_at, reviewed_by, action_taken)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.job_id)
        .bind(&report.job_title)
        .bind(&report.company)
        .bind(report.status.as_str())
        .bind(report.reported_at.timestamp_micros())
        .bind(report.reviewed_at.map(|t| t.timestamp_micros()))
        .bind(&report.reviewed_by)
        .bind(&report.action_taken)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get_report(&self, id: &str) -> Result<Option<JobReportRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM expired_job_reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.as_ref().map(decode_report).transpose()
    }

    async fn list_reports_by_status(
        &self,
        status: ReportStatus,
    ) -> Result<Vec<JobReportRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM expired_job_reports WHERE status = ? ORDER BY reported_at DESC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        rows.iter().map(decode_report).collect()
    }

    async fn resolve_report(
        &self,
        id: &str,
        status: ReportStatus,
        reviewed_by: Option<&str>,
        action_taken: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<JobReportRecord, StoreError> {
        // Transition guard lives in the WHERE clause: pending rows only.
        let result = sqlx::query(
            r#"
            UPDATE expired_job_reports
            SET status = ?, reviewed_at = ?, reviewed_by = ?, action_taken = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(reviewed_at.timestamp_micros())
        .bind(reviewed_by)
        .bind(action_taken)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return match self.get_report(id).await? {
                Some(existing) => Err(StoreError::Conflict(format!(
                    "report {} already {}",
                    id,
                    existing.status.as_str()
                ))),
                None => Err(StoreError::NotFound(format!("report {id}"))),
            };
        }

        self.get_report(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("report {id}")))
    }
}
