//! In-memory [`JobStore`] implementation for tests.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! `fetch_by_category` and `fetch_recent_unordered` intentionally return
//! records in map iteration order, with no ordering guarantee, matching the
//! trait contract that the query layer must sort for itself.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{JobRecord, JobReportRecord, JobStatus, ReportStatus, SubscriberRecord};

use super::{DocPosition, JobStore, StoreError};

/// In-memory store for unit and integration tests.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
    subscribers: RwLock<HashMap<String, SubscriberRecord>>,
    reports: RwLock<HashMap<String, JobReportRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed helper: insert many jobs at once.
    pub fn with_jobs(jobs: Vec<JobRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.jobs.write().unwrap();
            for job in jobs {
                map.insert(job.id.clone(), job);
            }
        }
        store
    }

    fn visible_jobs(&self) -> Vec<JobRecord> {
        self.jobs
            .read()
            .unwrap()
            .values()
            .filter(|j| j.status != JobStatus::Draft)
            .cloned()
            .collect()
    }
}

fn sort_recent_first(jobs: &mut [JobRecord]) {
    jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn fetch_recent(
        &self,
        limit: usize,
        after: Option<&DocPosition>,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let mut jobs = self.visible_jobs();
        sort_recent_first(&mut jobs);
        if let Some(pos) = after {
            jobs.retain(|j| pos.precedes(j));
        }
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn fetch_recent_unordered(&self, limit: usize) -> Result<Vec<JobRecord>, StoreError> {
        let mut jobs = self.visible_jobs();
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn fetch_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let mut jobs: Vec<JobRecord> = self
            .visible_jobs()
            .into_iter()
            .filter(|j| j.category_lower() == category)
            .collect();
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.read().unwrap().get(id).cloned())
    }

    async fn insert_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        self.jobs
            .write()
            .unwrap()
            .insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn update_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().unwrap();
        if !jobs.contains_key(&job.id) {
            return Err(StoreError::NotFound(format!("job {}", job.id)));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.jobs.write().unwrap().remove(id).is_some())
    }

    async fn insert_subscriber(&self, sub: &SubscriberRecord) -> Result<(), StoreError> {
        let mut subs = self.subscribers.write().unwrap();
        if subs.contains_key(&sub.email) {
            return Err(StoreError::Conflict(format!(
                "subscriber {} already exists",
                sub.email
            )));
        }
        subs.insert(sub.email.clone(), sub.clone());
        Ok(())
    }

    async fn list_subscriber_emails(&self) -> Result<Vec<String>, StoreError> {
        let mut emails: Vec<String> = self
            .subscribers
            .read()
            .unwrap()
            .values()
            .filter(|s| s.is_active)
            .map(|s| s.email.clone())
            .collect();
        emails.sort();
        Ok(emails)
    }

    async fn insert_report(&self, report: &JobReportRecord) -> Result<(), StoreError> {
        self.reports
            .write()
            .unwrap()
            .insert(report.id.clone(), report.clone());
        Ok(())
    }

    async fn get_report(&self, id: &str) -> Result<Option<JobReportRecord>, StoreError> {
        Ok(self.reports.read().unwrap().get(id).cloned())
    }

    async fn list_reports_by_status(
        &self,
        status: ReportStatus,
    ) -> Result<Vec<JobReportRecord>, StoreError> {
        let mut reports: Vec<JobReportRecord> = self
            .reports
            .read()
            .unwrap()
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        Ok(reports)
    }

    async fn resolve_report(
        &self,
        id: &str,
        status: ReportStatus,
        reviewed_by: Option<&str>,
        action_taken: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<JobReportRecord, StoreError> {
        let mut reports = self.reports.write().unwrap();
        let report = reports
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("report {}", id)))?;
        if report.status != ReportStatus::Pending {
            return Err(StoreError::Conflict(format!(
                "report {} already {}",
                id,
                report.status.as_str()
            )));
        }
        report.status = status;
        report.reviewed_at = Some(reviewed_at);
        report.reviewed_by = reviewed_by.map(String::from);
        report.action_taken = action_taken.map(String::from);
        Ok(report.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewJobInput;

    fn make_job(title: &str, days_ago: i64) -> JobRecord {
        let mut job = NewJobInput {
            title: title.into(),
            company: "Acme".into(),
            ..Default::default()
        }
        .into_record(Utc::now());
        job.posted_at = Utc::now() - chrono::Duration::days(days_ago);
        job
    }

    #[tokio::test]
    async fn test_fetch_recent_orders_newest_first() {
        let store =
            InMemoryStore::with_jobs(vec![make_job("old", 5), make_job("new", 1), make_job("mid", 3)]);
        let jobs = store.fetch_recent(10, None).await.unwrap();
        let titles: Vec<&str> = jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_fetch_recent_cursor_after_resumes() {
        let store = InMemoryStore::with_jobs(vec![
            make_job("a", 1),
            make_job("b", 2),
            make_job("c", 3),
        ]);
        let first = store.fetch_recent(2, None).await.unwrap();
        assert_eq!(first.len(), 2);
        let pos = DocPosition::of(&first[1]);
        let rest = store.fetch_recent(2, Some(&pos)).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "c");
    }

    #[tokio::test]
    async fn test_drafts_invisible_to_reads() {
        let mut draft = make_job("draft", 0);
        draft.status = JobStatus::Draft;
        let store = InMemoryStore::with_jobs(vec![draft, make_job("live", 1)]);
        let jobs = store.fetch_recent(10, None).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "live");
    }

    #[tokio::test]
    async fn test_category_filter_tolerates_mixed_case_rows() {
        let mut job = make_job("legacy", 1);
        job.category = "Fresher".into(); // written before normalization existed
        let store = InMemoryStore::with_jobs(vec![job]);
        let jobs = store.fetch_by_category("fresher", 10).await.unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_subscriber_conflicts() {
        let store = InMemoryStore::new();
        let sub = SubscriberRecord::new("a@example.com", Utc::now());
        store.insert_subscriber(&sub).await.unwrap();
        let err = store.insert_subscriber(&sub).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_report_resolves_exactly_once() {
        let store = InMemoryStore::new();
        let job = make_job("gone", 1);
        let report = JobReportRecord::pending_for(&job, Utc::now());
        store.insert_report(&report).await.unwrap();

        let resolved = store
            .resolve_report(
                &report.id,
                ReportStatus::Reviewed,
                Some("admin"),
                Some("reposted"),
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, ReportStatus::Reviewed);
        assert_eq!(resolved.reviewed_by.as_deref(), Some("admin"));

        let err = store
            .resolve_report(&report.id, ReportStatus::Deleted, None, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
