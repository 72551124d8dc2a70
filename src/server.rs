//! JoBless HTTP API.
//!
//! Public read endpoints (job feed, job detail, subscribe, expired-job
//! report) plus the admin area (create/update/delete listings, moderation
//! queue). The admin routes carry no authentication, matching the original
//! deployment: the admin area is gated only by obscurity.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/jobs` | Paged job feed with search/filter params |
//! | `GET`  | `/jobs/{id}` | Full job document |
//! | `POST` | `/jobs` | Create a listing (admin) |
//! | `PATCH` | `/jobs/{id}` | Update a listing (admin) |
//! | `DELETE` | `/jobs/{id}` | Remove a listing (admin) |
//! | `POST` | `/subscribe` | Join the mailing list |
//! | `POST` | `/jobs/{id}/report` | Report a listing as expired |
//! | `GET`  | `/reports` | Moderation queue (admin) |
//! | `POST` | `/reports/{id}/review` | Resolve a report (admin) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Failed requests return
//! `{ "error": { "code": "bad_request", "message": "..." } }` with codes
//! `bad_request` (400), `not_found` (404), `conflict` (409),
//! `index_building` (503), `internal` (500).
//!
//! Read failures on `/jobs` are different: the feed endpoint always answers
//! 200 with a well-formed page, carrying the classified error in the body
//! so the client can render the retry affordance next to its empty list.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the public site is a
//! static frontend served from elsewhere.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::cursor;
use crate::notify;
use crate::sqlite_store::SqliteStore;
use jobless_core::filter::{filter_jobs, ExperienceFilter};
use jobless_core::models::{
    split_commas, split_lines, JobRecord, JobReportRecord, JobStatus, ReportStatus,
    SubscriberRecord,
};
use jobless_core::query::{self, JobPage, QueryError};
use jobless_core::store::{JobStore, StoreError};

/// Shared application state. The store handle is injected at construction;
/// there is no lazily-initialized global client.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn JobStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn JobStore>) -> AppState {
        AppState { config, store }
    }
}

/// Start the HTTP API on `[server].bind`. Runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn JobStore> = Arc::new(SqliteStore::connect(config).await?);
    let state = AppState::new(Arc::new(config.clone()), store);

    let bind_addr = config.server.bind.clone();
    let app = router(state);

    tracing::info!("jobless API listening on http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/jobs", get(handle_list_jobs).post(handle_create_job))
        .route(
            "/jobs/{id}",
            patch(handle_update_job)
                .get(handle_get_job)
                .delete(handle_delete_job),
        )
        .route("/jobs/{id}/report", post(handle_report_job))
        .route("/subscribe", post(handle_subscribe))
        .route("/reports", get(handle_list_reports))
        .route("/reports/{id}/review", post(handle_review_report))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"conflict"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn conflict(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::CONFLICT,
        code: "conflict".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map write-path store failures onto the HTTP error contract.
fn store_error(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict(msg) => conflict(msg),
        StoreError::NotFound(msg) => not_found(msg),
        StoreError::IndexNotReady => AppError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "index_building".to_string(),
            message: "A required index is still building. Try again shortly.".to_string(),
        },
        StoreError::Backend(msg) => internal(msg),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /jobs ============

#[derive(Debug, Deserialize)]
struct JobsQuery {
    category: Option<String>,
    location: Option<String>,
    batch: Option<String>,
    cursor: Option<String>,
    limit: Option<usize>,
    /// Free-text search applied client-side over the fetched page.
    q: Option<String>,
    /// all / entry / mid / senior; unknown values behave as `all`.
    experience: Option<String>,
}

/// The scoping parameter of a feed request. Scopes are mutually exclusive;
/// precedence when several are sent: batch > category > location > all.
#[derive(Debug, PartialEq)]
enum Scope {
    All,
    Category(String),
    Location(String),
    BatchYear(String),
}

fn scope_of(q: &JobsQuery) -> Scope {
    fn pick(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
    if let Some(batch) = pick(&q.batch) {
        Scope::BatchYear(batch.to_string())
    } else if let Some(category) = pick(&q.category) {
        Scope::Category(category.to_string())
    } else if let Some(location) = pick(&q.location) {
        Scope::Location(location.to_string())
    } else {
        Scope::All
    }
}

#[derive(Serialize)]
struct JobsResponse {
    jobs: Vec<JobRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
    has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
}

async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(q): Query<JobsQuery>,
) -> Result<Json<JobsResponse>, AppError> {
    let mut params = state.config.query.params();
    params.page_size = q
        .limit
        .unwrap_or(state.config.query.page_size)
        .clamp(1, 50);

    let cursor = q
        .cursor
        .as_deref()
        .map(cursor::decode)
        .transpose()
        .map_err(|e| bad_request(e.to_string()))?;

    let store = state.store.as_ref();
    let page: JobPage = match scope_of(&q) {
        Scope::All => query::list_all(store, &params, cursor.as_ref()).await,
        Scope::Category(c) => query::list_by_category(store, &params, &c, cursor.as_ref()).await,
        Scope::Location(l) => query::list_by_location(store, &params, &l, cursor.as_ref()).await,
        Scope::BatchYear(b) => query::list_by_batch_year(store, &params, &b, cursor.as_ref()).await,
    };

    let search = q.q.as_deref().unwrap_or("");
    let experience = q
        .experience
        .as_deref()
        .and_then(ExperienceFilter::parse)
        .unwrap_or(ExperienceFilter::All);
    let jobs = filter_jobs(&page.records, search, experience);

    // `has_more` tracks the unfiltered page: the visible set may be empty
    // while more pages exist. A failed page leaves the sequence open so the
    // client can offer a retry.
    let has_more = match &page.error {
        Some(_) => true,
        None => page.next_cursor.is_some(),
    };

    Ok(Json(JobsResponse {
        jobs,
        next_cursor: page.next_cursor.as_ref().map(cursor::encode),
        has_more,
        error: page.error.map(|e| match e {
            QueryError::IndexNotReady => ErrorDetail {
                code: "index_building".to_string(),
                message: "The job index is still building. Try again shortly.".to_string(),
            },
            QueryError::Failed(msg) => ErrorDetail {
                code: "query_failed".to_string(),
                message: msg,
            },
        }),
    }))
}

// ============ GET /jobs/{id} ============

async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, AppError> {
    let job = state
        .store
        .get_job(&id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(format!("job not found: {id}")))?;
    Ok(Json(job))
}

// ============ POST /jobs ============

async fn handle_create_job(
    State(state): State<AppState>,
    Json(input): Json<jobless_core::models::NewJobInput>,
) -> Result<(StatusCode, Json<JobRecord>), AppError> {
    if input.title.trim().is_empty() {
        return Err(bad_request("title is required"));
    }
    if input.company.trim().is_empty() {
        return Err(bad_request("company is required"));
    }
    if input.description.trim().is_empty() {
        return Err(bad_request("description is required"));
    }

    let job = input.into_record(Utc::now());
    state.store.insert_job(&job).await.map_err(store_error)?;
    tracing::info!(job = %job.id, title = %job.title, "job created");

    if job.status == JobStatus::Active {
        notify::spawn_job_posted(state.config.clone(), state.store.clone(), job.clone());
    }

    Ok((StatusCode::CREATED, Json(job)))
}

// ============ PATCH /jobs/{id} ============

/// Partial update. List-like fields arrive as raw textarea text and are
/// re-split; `posted_at` is immutable and deliberately absent here.
#[derive(Debug, Default, Deserialize)]
struct PatchJobInput {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    job_type: Option<String>,
    category: Option<String>,
    batch_year: Option<String>,
    salary: Option<String>,
    description: Option<String>,
    requirements: Option<String>,
    responsibilities: Option<String>,
    perks: Option<String>,
    skills: Option<String>,
    experience_level: Option<String>,
    deadline: Option<DateTime<Utc>>,
    application_link: Option<String>,
    logo_url: Option<String>,
    status: Option<String>,
}

fn apply_patch(mut job: JobRecord, patch: PatchJobInput) -> JobRecord {
    if let Some(v) = patch.title {
        job.title = v.trim().to_string();
    }
    if let Some(v) = patch.company {
        job.company = v.trim().to_string();
    }
    if let Some(v) = patch.location {
        job.location = v.trim().to_string();
    }
    if let Some(v) = patch.job_type {
        job.job_type = v.trim().to_lowercase();
    }
    if let Some(v) = patch.category {
        job.category = v.trim().to_lowercase();
    }
    if let Some(v) = patch.batch_year {
        job.batch_year = Some(v.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(v) = patch.salary {
        job.salary = Some(v.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(v) = patch.description {
        job.description = v.trim().to_string();
    }
    if let Some(v) = patch.requirements {
        job.requirements = split_lines(&v);
    }
    if let Some(v) = patch.responsibilities {
        job.responsibilities = split_lines(&v);
    }
    if let Some(v) = patch.perks {
        job.perks = split_lines(&v);
    }
    if let Some(v) = patch.skills {
        job.skills = split_commas(&v);
    }
    if let Some(v) = patch.experience_level {
        job.experience_level = Some(v.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(v) = patch.deadline {
        job.deadline = Some(v);
    }
    if let Some(v) = patch.application_link {
        job.application_link = Some(v.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(v) = patch.logo_url {
        job.logo_url = Some(v.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(v) = patch.status {
        job.status = JobStatus::parse(&v);
    }
    job
}

async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PatchJobInput>,
) -> Result<Json<JobRecord>, AppError> {
    let existing = state
        .store
        .get_job(&id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(format!("job not found: {id}")))?;

    let updated = apply_patch(existing, patch);
    state.store.update_job(&updated).await.map_err(store_error)?;
    tracing::info!(job = %updated.id, "job updated");
    Ok(Json(updated))
}

// ============ DELETE /jobs/{id} ============

async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.store.delete_job(&id).await.map_err(store_error)?;
    if !deleted {
        return Err(not_found(format!("job not found: {id}")));
    }
    tracing::info!(job = %id, "job deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ============ POST /subscribe ============

#[derive(Deserialize)]
struct SubscribeInput {
    email: String,
}

async fn handle_subscribe(
    State(state): State<AppState>,
    Json(input): Json<SubscribeInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let email = input.email.trim();
    if email.len() < 3 || !email.contains('@') {
        return Err(bad_request("a valid email is required"));
    }

    let sub = SubscriberRecord::new(email, Utc::now());
    state
        .store
        .insert_subscriber(&sub)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => conflict("this email is already subscribed"),
            other => store_error(other),
        })?;

    tracing::info!(email = %sub.email, "subscriber added");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "subscribed": true })),
    ))
}

// ============ POST /jobs/{id}/report ============

async fn handle_report_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JobReportRecord>), AppError> {
    let job = state
        .store
        .get_job(&id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(format!("job not found: {id}")))?;

    let report = JobReportRecord::pending_for(&job, Utc::now());
    state
        .store
        .insert_report(&report)
        .await
        .map_err(store_error)?;
    tracing::info!(job = %id, report = %report.id, "expired-job report filed");
    Ok((StatusCode::CREATED, Json(report)))
}

// ============ GET /reports ============

#[derive(Deserialize)]
struct ReportsQuery {
    status: Option<String>,
}

async fn handle_list_reports(
    State(state): State<AppState>,
    Query(q): Query<ReportsQuery>,
) -> Result<Json<Vec<JobReportRecord>>, AppError> {
    let status = match q.status.as_deref() {
        None => ReportStatus::Pending,
        Some(raw) => ReportStatus::parse(raw)
            .ok_or_else(|| bad_request(format!("unknown report status: {raw}")))?,
    };
    let reports = state
        .store
        .list_reports_by_status(status)
        .await
        .map_err(store_error)?;
    Ok(Json(reports))
}

// ============ POST /reports/{id}/review ============

#[derive(Deserialize)]
struct ReviewInput {
    /// "reviewed" keeps the listing, "deleted" also removes the job.
    action: String,
    reviewed_by: Option<String>,
    action_taken: Option<String>,
}

async fn handle_review_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<JobReportRecord>, AppError> {
    let status = match input.action.trim().to_lowercase().as_str() {
        "reviewed" => ReportStatus::Reviewed,
        "deleted" => ReportStatus::Deleted,
        other => {
            return Err(bad_request(format!(
                "unknown action: '{other}'. Use reviewed or deleted."
            )))
        }
    };

    let resolved = state
        .store
        .resolve_report(
            &id,
            status,
            input.reviewed_by.as_deref(),
            input.action_taken.as_deref(),
            Utc::now(),
        )
        .await
        .map_err(store_error)?;

    if status == ReportStatus::Deleted {
        // The report keeps its snapshot; the job itself goes away.
        if let Err(e) = state.store.delete_job(&resolved.job_id).await {
            tracing::warn!(job = %resolved.job_id, error = %e, "job removal after review failed");
        }
    }

    tracing::info!(report = %id, action = %input.action, "report resolved");
    Ok(Json(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jobs_query(
        batch: Option<&str>,
        category: Option<&str>,
        location: Option<&str>,
    ) -> JobsQuery {
        JobsQuery {
            category: category.map(String::from),
            location: location.map(String::from),
            batch: batch.map(String::from),
            cursor: None,
            limit: None,
            q: None,
            experience: None,
        }
    }

    #[test]
    fn test_scope_precedence_batch_over_category_over_location() {
        let q = jobs_query(Some("2025"), Some("fresher"), Some("Pune"));
        assert_eq!(scope_of(&q), Scope::BatchYear("2025".into()));

        let q = jobs_query(None, Some("fresher"), Some("Pune"));
        assert_eq!(scope_of(&q), Scope::Category("fresher".into()));

        let q = jobs_query(None, None, Some("Pune"));
        assert_eq!(scope_of(&q), Scope::Location("Pune".into()));

        let q = jobs_query(None, None, None);
        assert_eq!(scope_of(&q), Scope::All);
    }

    #[test]
    fn test_blank_scope_params_fall_through() {
        let q = jobs_query(Some("  "), Some(""), None);
        assert_eq!(scope_of(&q), Scope::All);
    }

    #[test]
    fn test_apply_patch_respects_immutable_posted_at_and_resplits_lists() {
        let job = jobless_core::models::NewJobInput {
            title: "Old".into(),
            company: "Acme".into(),
            description: "d".into(),
            ..Default::default()
        }
        .into_record(Utc::now());
        let before = job.posted_at;

        let patched = apply_patch(
            job,
            PatchJobInput {
                title: Some("New".into()),
                category: Some("WFH".into()),
                requirements: Some("one\ntwo\n\n".into()),
                skills: Some("Rust, Go".into()),
                ..Default::default()
            },
        );
        assert_eq!(patched.title, "New");
        assert_eq!(patched.category, "wfh");
        assert_eq!(patched.requirements, vec!["one", "two"]);
        assert_eq!(patched.skills, vec!["Rust", "Go"]);
        assert_eq!(patched.posted_at, before);
    }
}
