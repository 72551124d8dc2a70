//! Storage abstraction for JoBless.
//!
//! The [`JobStore`] trait is the document-store boundary: equality filters
//! on indexed fields, descending order on `posted_at`, and cursor-after
//! pagination. It deliberately does NOT offer substring search or compound
//! (category, posted_at) ordering; the query layer works around both the
//! way the hosted document store forces it to (over-fetch plus in-memory
//! sort/filter, see [`crate::query`]).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{JobRecord, JobReportRecord, ReportStatus, SubscriberRecord};

/// Typed store failure.
///
/// `IndexNotReady` exists for backends that build indexes asynchronously;
/// callers classify it as a retryable condition. Backends that only surface
/// opaque errors report `Backend`, and the query layer falls back to
/// substring matching on the message (see [`crate::query::classify_store_error`]).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a required index is still building")]
    IndexNotReady,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Backend(String),
}

/// Position of a document in the `posted_at`-descending ordering.
///
/// Ties on `posted_at` are broken by ascending id, so the pair identifies a
/// unique resume point for cursor-after queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPosition {
    pub posted_at: DateTime<Utc>,
    pub id: String,
}

impl DocPosition {
    pub fn of(job: &JobRecord) -> DocPosition {
        DocPosition {
            posted_at: job.posted_at,
            id: job.id.clone(),
        }
    }

    /// True when `job` sorts strictly after this position in the
    /// `posted_at` desc, id asc ordering.
    pub fn precedes(&self, job: &JobRecord) -> bool {
        job.posted_at < self.posted_at || (job.posted_at == self.posted_at && job.id > self.id)
    }
}

/// Abstract document store for jobs, subscribers, and expired-job reports.
///
/// Read methods never return `Draft` jobs. Category equality is compared
/// against the lowercased stored value so mixed-case legacy data still
/// matches (tolerant reads, normalized writes).
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Non-draft jobs ordered by `posted_at` descending (id ascending on
    /// ties), resuming strictly after `after` when given.
    async fn fetch_recent(
        &self,
        limit: usize,
        after: Option<&DocPosition>,
    ) -> Result<Vec<JobRecord>, StoreError>;

    /// Degraded scan: non-draft jobs in no guaranteed order. Used as the
    /// resilient fallback when the ordered query fails.
    async fn fetch_recent_unordered(&self, limit: usize) -> Result<Vec<JobRecord>, StoreError>;

    /// Equality filter on category (caller passes the lowercased value).
    /// No server-side ordering: the store has no compound
    /// (category, posted_at) index.
    async fn fetch_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<JobRecord>, StoreError>;

    async fn get_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError>;

    async fn insert_job(&self, job: &JobRecord) -> Result<(), StoreError>;

    /// Full-record replacement; `NotFound` when the id does not exist.
    async fn update_job(&self, job: &JobRecord) -> Result<(), StoreError>;

    /// Returns true when a record was deleted.
    async fn delete_job(&self, id: &str) -> Result<bool, StoreError>;

    /// `Conflict` when the email is already subscribed.
    async fn insert_subscriber(&self, sub: &SubscriberRecord) -> Result<(), StoreError>;

    /// Emails of active subscribers only.
    async fn list_subscriber_emails(&self) -> Result<Vec<String>, StoreError>;

    async fn insert_report(&self, report: &JobReportRecord) -> Result<(), StoreError>;

    async fn get_report(&self, id: &str) -> Result<Option<JobReportRecord>, StoreError>;

    async fn list_reports_by_status(
        &self,
        status: ReportStatus,
    ) -> Result<Vec<JobReportRecord>, StoreError>;

    /// Transition a report out of `Pending`, exactly once. Resolving a
    /// report that is not pending is a `Conflict`; an unknown id is
    /// `NotFound`. Returns the updated record.
    async fn resolve_report(
        &self,
        id: &str,
        status: ReportStatus,
        reviewed_by: Option<&str>,
        action_taken: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<JobReportRecord, StoreError>;
}
