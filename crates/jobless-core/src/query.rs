//! Read-path query layer: the four retrieval modes.
//!
//! Each mode translates a retrieval request (scope + cursor + page size)
//! into store queries and normalizes the outcome into a [`JobPage`]. The
//! store cannot do substring matching or compound (category, posted_at)
//! ordering, so three of the four modes over-fetch a bounded batch and
//! sort/filter in memory:
//!
//! | Mode | Store query | In-memory work | Cursor |
//! |------|-------------|----------------|--------|
//! | [`list_all`] | ordered, cursor-after | none | true server cursor |
//! | [`list_by_category`] | category equality, bounded | sort desc | offset into snapshot |
//! | [`list_by_location`] | ordered, cursor-after, ×factor | substring filter, early stop | server cursor at last scanned doc |
//! | [`list_by_batch_year`] | category "fresher", bounded | exact match + sort desc | offset into snapshot |
//!
//! Offset cursors are offsets into a re-fetched, re-sorted snapshot, not
//! server cursors; pages past the over-fetch bound are unreachable. That
//! ceiling is configurable via [`QueryParams`] and is an accepted
//! limitation, not a defect to paper over.
//!
//! Failures never escape: every mode catches store errors, classifies them
//! through [`classify_store_error`], and returns a well-formed empty page
//! carrying the error tag. Retries are always user-initiated.

use crate::models::JobRecord;
use crate::store::{DocPosition, JobStore, StoreError};

/// Tuning for the read path, decoupled from application config.
#[derive(Debug, Clone)]
pub struct QueryParams {
    /// Records per page.
    pub page_size: usize,
    /// Over-fetch bound for the by-category snapshot.
    pub category_overfetch: usize,
    /// Over-fetch bound for the by-batch-year snapshot.
    pub batch_overfetch: usize,
    /// Multiplier over `page_size` for the location scan batch.
    pub location_overfetch_factor: usize,
    /// Batch bound for the degraded unordered location fallback.
    pub fallback_scan_limit: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        QueryParams {
            page_size: 9,
            category_overfetch: 50,
            batch_overfetch: 100,
            location_overfetch_factor: 3,
            fallback_scan_limit: 100,
        }
    }
}

/// Continuation token for a query scope.
///
/// `Doc` is a true server cursor (resume strictly after this position).
/// `Offset` is an index into a re-fetched, re-sorted in-memory snapshot,
/// kept as a distinct variant so nothing can mistake it for server-side
/// cursoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Doc(DocPosition),
    Offset(usize),
}

/// Classified query failure, surfaced to the caller inside the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The store cannot serve the query until an index finishes building.
    /// Retryable on explicit user action ("try again shortly").
    IndexNotReady,
    /// Any other retrieval failure; terminal for this request.
    Failed(String),
}

/// One page of results. Always well-formed: on failure `records` is empty,
/// `next_cursor` is `None`, and `error` carries the classification.
#[derive(Debug, Clone)]
pub struct JobPage {
    pub records: Vec<JobRecord>,
    pub next_cursor: Option<PageCursor>,
    pub error: Option<QueryError>,
}

impl JobPage {
    fn failed(error: QueryError) -> JobPage {
        JobPage {
            records: Vec::new(),
            next_cursor: None,
            error: Some(error),
        }
    }

    fn ok(records: Vec<JobRecord>, next_cursor: Option<PageCursor>) -> JobPage {
        JobPage {
            records,
            next_cursor,
            error: None,
        }
    }
}

/// The single place store failures are classified.
///
/// Structured kinds win; the substring fallback ("index" anywhere in the
/// message) only covers backends that surface opaque errors. Swap the
/// fallback here if the store client ever grows a proper error code.
pub fn classify_store_error(err: &StoreError) -> QueryError {
    match err {
        StoreError::IndexNotReady => QueryError::IndexNotReady,
        other => {
            let msg = other.to_string();
            if msg.to_lowercase().contains("index") {
                QueryError::IndexNotReady
            } else {
                QueryError::Failed(msg)
            }
        }
    }
}

fn doc_cursor_of(cursor: Option<&PageCursor>) -> Option<&DocPosition> {
    match cursor {
        Some(PageCursor::Doc(pos)) => Some(pos),
        // An offset cursor from another scope means the caller forgot to
        // reset; start from the top rather than guessing a position.
        _ => None,
    }
}

fn offset_of(cursor: Option<&PageCursor>) -> usize {
    match cursor {
        Some(PageCursor::Offset(n)) => *n,
        _ => 0,
    }
}

/// All jobs, newest first, true server-side cursoring.
pub async fn list_all<S: JobStore + ?Sized>(
    store: &S,
    params: &QueryParams,
    cursor: Option<&PageCursor>,
) -> JobPage {
    match store
        .fetch_recent(params.page_size, doc_cursor_of(cursor))
        .await
    {
        Ok(records) => {
            let next = if records.len() == params.page_size {
                records.last().map(|j| PageCursor::Doc(DocPosition::of(j)))
            } else {
                None
            };
            JobPage::ok(records, next)
        }
        Err(e) => JobPage::failed(classify_store_error(&e)),
    }
}

/// Jobs in one category, newest first.
///
/// The store only does the equality filter; ordering and paging happen over
/// an in-memory snapshot bounded by `category_overfetch`. Matches beyond the
/// bound are unreachable from later pages.
pub async fn list_by_category<S: JobStore + ?Sized>(
    store: &S,
    params: &QueryParams,
    category: &str,
    cursor: Option<&PageCursor>,
) -> JobPage {
    let category = category.trim().to_lowercase();
    match store
        .fetch_by_category(&category, params.category_overfetch)
        .await
    {
        Ok(mut batch) => {
            batch.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then(a.id.cmp(&b.id)));
            page_from_snapshot(batch, offset_of(cursor), params.page_size)
        }
        Err(e) => JobPage::failed(classify_store_error(&e)),
    }
}

/// Jobs whose free-text location contains `location`, case-insensitively.
///
/// Primary path: scan an ordered batch of `page_size × factor` documents
/// (cursor-after), keep substring matches, stop early at a full page. The
/// cursor is the position of the last *scanned* document, so the next page
/// resumes where the scan stopped.
///
/// Degraded path: if the primary query fails, re-scan up to
/// `fallback_scan_limit` documents unordered and filter once; pagination is
/// sacrificed (`next_cursor` is always `None`).
pub async fn list_by_location<S: JobStore + ?Sized>(
    store: &S,
    params: &QueryParams,
    location: &str,
    cursor: Option<&PageCursor>,
) -> JobPage {
    let needle = location.trim().to_lowercase();
    let batch_size = params.page_size * params.location_overfetch_factor.max(1);

    let primary_err = match store.fetch_recent(batch_size, doc_cursor_of(cursor)).await {
        Ok(batch) => {
            let mut records = Vec::new();
            let mut last_scanned: Option<DocPosition> = None;
            for job in &batch {
                last_scanned = Some(DocPosition::of(job));
                if job.location.to_lowercase().contains(&needle) {
                    records.push(job.clone());
                    if records.len() == params.page_size {
                        break;
                    }
                }
            }
            let next = if records.len() == params.page_size {
                last_scanned.map(PageCursor::Doc)
            } else {
                None
            };
            return JobPage::ok(records, next);
        }
        Err(e) => e,
    };

    // Degraded path: one unordered bounded scan, no further pages.
    match store
        .fetch_recent_unordered(params.fallback_scan_limit)
        .await
    {
        Ok(batch) => {
            let records: Vec<JobRecord> = batch
                .into_iter()
                .filter(|j| j.location.to_lowercase().contains(&needle))
                .collect();
            JobPage::ok(records, None)
        }
        // Both paths down: classify the primary failure, it is the root
        // condition the user can act on.
        Err(_) => JobPage::failed(classify_store_error(&primary_err)),
    }
}

/// Fresher jobs for one batch year, newest first. Same snapshot/offset
/// strategy as [`list_by_category`], bounded by `batch_overfetch`.
pub async fn list_by_batch_year<S: JobStore + ?Sized>(
    store: &S,
    params: &QueryParams,
    batch_year: &str,
    cursor: Option<&PageCursor>,
) -> JobPage {
    let batch_year = batch_year.trim();
    match store
        .fetch_by_category("fresher", params.batch_overfetch)
        .await
    {
        Ok(batch) => {
            let mut matches: Vec<JobRecord> = batch
                .into_iter()
                .filter(|j| j.batch_year.as_deref() == Some(batch_year))
                .collect();
            matches.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then(a.id.cmp(&b.id)));
            page_from_snapshot(matches, offset_of(cursor), params.page_size)
        }
        Err(e) => JobPage::failed(classify_store_error(&e)),
    }
}

/// Slice one page out of a sorted in-memory snapshot at `offset`.
fn page_from_snapshot(snapshot: Vec<JobRecord>, offset: usize, page_size: usize) -> JobPage {
    let records: Vec<JobRecord> = snapshot.into_iter().skip(offset).take(page_size).collect();
    let next = if records.len() == page_size {
        Some(PageCursor::Offset(offset + records.len()))
    } else {
        None
    };
    JobPage::ok(records, next)
}
