//! Core data models for the JoBless job board.
//!
//! These types mirror the documents persisted in the store: job postings,
//! subscriber records, and expired-job reports. Free-text admin input is
//! normalized into structured records here, so every write path (HTTP and
//! CLI import) applies the same rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of a job posting.
///
/// `Draft` jobs are invisible to all public read modes; `Expired` jobs stay
/// listed until moderation removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Draft,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Draft => "draft",
            JobStatus::Expired => "expired",
        }
    }

    /// Tolerant parse: unknown or mixed-case values fall back to `Active`.
    pub fn parse(s: &str) -> JobStatus {
        match s.trim().to_lowercase().as_str() {
            "draft" => JobStatus::Draft,
            "expired" => JobStatus::Expired,
            _ => JobStatus::Active,
        }
    }
}

/// A job posting document.
///
/// `category` is stored lowercase by every write path, but reads must
/// tolerate mixed-case values left behind by older writers; comparisons
/// are always against the lowercased value. `experience_level` is free text
/// ("Entry Level", "2-5 years", ...), not a closed enum; classification is
/// heuristic (see [`crate::filter`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub company: String,
    /// Free text, not normalized ("Bengaluru, Karnataka", "Remote", ...).
    pub location: String,
    /// full-time / part-time / contract / internship / freelance.
    pub job_type: String,
    /// fresher / wfh / internship / experienced, lowercase on write.
    pub category: String,
    /// Only meaningful when `category == "fresher"` (e.g. "2025").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub perks: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    /// Set at creation, immutable thereafter. Future-dated values are
    /// tolerated (they sort ahead of current postings, never error).
    pub posted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_link: Option<String>,
    /// Either a remote URL or an inline data URL; never fetched by the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default = "default_status")]
    pub status: JobStatus,
}

fn default_status() -> JobStatus {
    JobStatus::Active
}

impl JobRecord {
    /// The category compared the way all read paths compare it.
    pub fn category_lower(&self) -> String {
        self.category.trim().to_lowercase()
    }
}

/// Raw admin input for a new job posting, as it arrives from the posting
/// form or the bulk importer: list-like fields are still free text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewJobInput {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub batch_year: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub description: String,
    /// One requirement per line.
    #[serde(default)]
    pub requirements: Option<String>,
    /// One responsibility per line.
    #[serde(default)]
    pub responsibilities: Option<String>,
    /// One perk per line.
    #[serde(default)]
    pub perks: Option<String>,
    /// Comma-separated.
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub application_link: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl NewJobInput {
    /// Normalize raw input into a stored record: assign an id, lowercase the
    /// category, split the textarea fields, default `posted_at` to now.
    pub fn into_record(self, now: DateTime<Utc>) -> JobRecord {
        JobRecord {
            id: Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            location: self.location.trim().to_string(),
            job_type: self.job_type.trim().to_lowercase(),
            category: self.category.trim().to_lowercase(),
            batch_year: none_if_blank(self.batch_year),
            salary: none_if_blank(self.salary),
            description: self.description.trim().to_string(),
            requirements: split_lines(self.requirements.as_deref().unwrap_or("")),
            responsibilities: split_lines(self.responsibilities.as_deref().unwrap_or("")),
            perks: split_lines(self.perks.as_deref().unwrap_or("")),
            skills: split_commas(self.skills.as_deref().unwrap_or("")),
            experience_level: none_if_blank(self.experience_level),
            posted_at: self.posted_at.unwrap_or(now),
            deadline: self.deadline,
            application_link: none_if_blank(self.application_link),
            logo_url: none_if_blank(self.logo_url),
            status: self
                .status
                .as_deref()
                .map(JobStatus::parse)
                .unwrap_or(JobStatus::Active),
        }
    }
}

fn none_if_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Split textarea input on line breaks, trimming entries and discarding
/// blanks. Order is preserved; duplicates are not deduplicated.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Split a comma-separated field (skills), trimming entries and discarding
/// blanks. Order is preserved; duplicates are not deduplicated.
pub fn split_commas(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A newsletter subscriber. `email` is the unique key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberRecord {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
}

impl SubscriberRecord {
    pub fn new(email: &str, now: DateTime<Utc>) -> SubscriberRecord {
        SubscriberRecord {
            email: email.trim().to_lowercase(),
            subscribed_at: now,
            is_active: true,
        }
    }
}

/// Moderation state of an expired-job report. Transitions out of `Pending`
/// happen exactly once; `Reviewed` and `Deleted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Deleted,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<ReportStatus> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(ReportStatus::Pending),
            "reviewed" => Some(ReportStatus::Reviewed),
            "deleted" => Some(ReportStatus::Deleted),
            _ => None,
        }
    }
}

/// An end-user report that a listing has expired.
///
/// `job_id` is a weak reference: the job may be deleted later and the
/// report remains readable. Title and company are denormalized snapshots
/// taken at report time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReportRecord {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub status: ReportStatus,
    pub reported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
}

impl JobReportRecord {
    /// Snapshot a pending report against a job at report time.
    pub fn pending_for(job: &JobRecord, now: DateTime<Utc>) -> JobReportRecord {
        JobReportRecord {
            id: Uuid::new_v4().to_string(),
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            company: job.company.clone(),
            status: ReportStatus::Pending,
            reported_at: now,
            reviewed_at: None,
            reviewed_by: None,
            action_taken: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_drops_blanks_keeps_order_and_duplicates() {
        let out = split_lines("  B.Tech degree \n\n2+ years of Rust\nB.Tech degree\n   \n");
        assert_eq!(
            out,
            vec!["B.Tech degree", "2+ years of Rust", "B.Tech degree"]
        );
    }

    #[test]
    fn test_split_commas_trims() {
        let out = split_commas("Rust, SQL ,, tokio,");
        assert_eq!(out, vec!["Rust", "SQL", "tokio"]);
    }

    #[test]
    fn test_new_job_input_normalizes_category_lowercase() {
        let input = NewJobInput {
            title: " Backend Engineer ".into(),
            company: "Acme".into(),
            category: "  Fresher ".into(),
            skills: Some("Rust, SQL".into()),
            ..Default::default()
        };
        let now = Utc::now();
        let record = input.into_record(now);
        assert_eq!(record.title, "Backend Engineer");
        assert_eq!(record.category, "fresher");
        assert_eq!(record.skills, vec!["Rust", "SQL"]);
        assert_eq!(record.posted_at, now);
        assert_eq!(record.status, JobStatus::Active);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_category_lower_tolerates_mixed_case_reads() {
        let mut record = NewJobInput {
            title: "x".into(),
            company: "y".into(),
            ..Default::default()
        }
        .into_record(Utc::now());
        // A mixed-case value written by an older client.
        record.category = "Fresher".into();
        assert_eq!(record.category_lower(), "fresher");
    }

    #[test]
    fn test_future_posted_at_is_accepted() {
        let input = NewJobInput {
            title: "x".into(),
            company: "y".into(),
            posted_at: Some(Utc::now() + chrono::Duration::days(30)),
            ..Default::default()
        };
        let record = input.into_record(Utc::now());
        assert!(record.posted_at > Utc::now());
    }

    #[test]
    fn test_report_snapshot_denormalizes_title_and_company() {
        let job = NewJobInput {
            title: "Data Analyst".into(),
            company: "Initech".into(),
            ..Default::default()
        }
        .into_record(Utc::now());
        let report = JobReportRecord::pending_for(&job, Utc::now());
        assert_eq!(report.job_id, job.id);
        assert_eq!(report.job_title, "Data Analyst");
        assert_eq!(report.company, "Initech");
        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.reviewed_at.is_none());
    }
}
