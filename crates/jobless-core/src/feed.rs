//! Feed bookkeeping: threading a cursor across "load more" requests.
//!
//! [`JobFeed`] owns the per-scope continuation state. Changing any scoping
//! parameter discards the cursor and accumulated records and starts a fresh
//! sequence: the query layer re-queries the store on scope changes, it
//! never filters the old result set incrementally.
//!
//! Callers may fire a new request before the previous one resolves (rapid
//! typing in a search box). Responses are applied through tickets handed
//! out by [`JobFeed::begin_request`]: a stale, slower response arriving
//! after a newer one is dropped, never applied over it (last response
//! wins).

use crate::models::JobRecord;
use crate::query::{JobPage, PageCursor};

/// The scoping parameter of a feed. Two scopes are the same sequence only
/// if they are equal; any change is a full reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Category(String),
    Location(String),
    BatchYear(String),
}

/// Accumulated pagination state for one scope.
#[derive(Debug)]
pub struct JobFeed {
    scope: FeedScope,
    records: Vec<JobRecord>,
    cursor: Option<PageCursor>,
    has_more: bool,
    next_ticket: u64,
    applied_ticket: u64,
}

impl JobFeed {
    pub fn new(scope: FeedScope) -> JobFeed {
        JobFeed {
            scope,
            records: Vec::new(),
            cursor: None,
            has_more: true,
            next_ticket: 0,
            applied_ticket: 0,
        }
    }

    /// Switch scope. A changed scope resets everything, including in-flight
    /// tickets; an unchanged scope is a no-op.
    pub fn set_scope(&mut self, scope: FeedScope) {
        if scope != self.scope {
            *self = JobFeed::new(scope);
        }
    }

    /// Hand out a ticket for a request that is about to be issued. Tickets
    /// are monotonically increasing within a scope.
    pub fn begin_request(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Apply a resolved page. Returns false (and changes nothing) when a
    /// newer response has already been applied.
    ///
    /// `requested_page_size` is the page size the request asked for:
    /// `has_more` turns false permanently (for this scope) once the
    /// underlying, unfiltered query returns a short page. Error pages are
    /// empty but do NOT end the sequence; the user may retry.
    pub fn apply(&mut self, ticket: u64, page: &JobPage, requested_page_size: usize) -> bool {
        if ticket <= self.applied_ticket {
            return false;
        }
        self.applied_ticket = ticket;
        self.records.extend(page.records.iter().cloned());
        if page.error.is_none() {
            self.cursor = page.next_cursor.clone();
            if page.records.len() < requested_page_size {
                self.has_more = false;
            }
        }
        true
    }

    pub fn scope(&self) -> &FeedScope {
        &self.scope
    }

    /// Everything accumulated so far, in arrival order. The visible set
    /// after client-side filtering may be smaller; that never affects
    /// `has_more`.
    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    /// Cursor to pass to the next query-layer call for this scope.
    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewJobInput;
    use crate::query::QueryError;
    use chrono::Utc;

    fn page(titles: &[&str], next: Option<PageCursor>) -> JobPage {
        JobPage {
            records: titles
                .iter()
                .map(|t| {
                    NewJobInput {
                        title: (*t).into(),
                        company: "Acme".into(),
                        ..Default::default()
                    }
                    .into_record(Utc::now())
                })
                .collect(),
            next_cursor: next,
            error: None,
        }
    }

    #[test]
    fn test_load_more_appends_and_tracks_cursor() {
        let mut feed = JobFeed::new(FeedScope::All);
        assert!(feed.has_more());

        let t1 = feed.begin_request();
        assert!(feed.apply(t1, &page(&["a", "b"], Some(PageCursor::Offset(2))), 2));
        assert_eq!(feed.records().len(), 2);
        assert_eq!(feed.cursor(), Some(&PageCursor::Offset(2)));
        assert!(feed.has_more());

        let t2 = feed.begin_request();
        assert!(feed.apply(t2, &page(&["c"], None), 2));
        assert_eq!(feed.records().len(), 3);
        assert!(!feed.has_more(), "short page ends the sequence");
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut feed = JobFeed::new(FeedScope::All);
        let slow = feed.begin_request();
        let fast = feed.begin_request();

        assert!(feed.apply(fast, &page(&["fresh"], None), 9));
        // The older request resolves afterwards; it must not win.
        assert!(!feed.apply(slow, &page(&["stale"], None), 9));
        assert_eq!(feed.records().len(), 1);
        assert_eq!(feed.records()[0].title, "fresh");
    }

    #[test]
    fn test_scope_change_resets_everything() {
        let mut feed = JobFeed::new(FeedScope::Category("fresher".into()));
        let t = feed.begin_request();
        feed.apply(t, &page(&["a"], None), 9);
        assert!(!feed.has_more());

        feed.set_scope(FeedScope::Category("wfh".into()));
        assert!(feed.records().is_empty());
        assert!(feed.cursor().is_none());
        assert!(feed.has_more(), "new scope starts fresh");
    }

    #[test]
    fn test_same_scope_is_not_a_reset() {
        let mut feed = JobFeed::new(FeedScope::All);
        let t = feed.begin_request();
        feed.apply(t, &page(&["a"], Some(PageCursor::Offset(1))), 1);
        feed.set_scope(FeedScope::All);
        assert_eq!(feed.records().len(), 1);
        assert_eq!(feed.cursor(), Some(&PageCursor::Offset(1)));
    }

    #[test]
    fn test_error_page_does_not_end_sequence() {
        let mut feed = JobFeed::new(FeedScope::All);
        let t = feed.begin_request();
        let failed = JobPage {
            records: Vec::new(),
            next_cursor: None,
            error: Some(QueryError::IndexNotReady),
        };
        assert!(feed.apply(t, &failed, 9));
        assert!(feed.records().is_empty());
        // The user can retry; the feed is not terminally exhausted.
        assert!(feed.has_more());
    }

    #[test]
    fn test_has_more_ignores_filtered_visibility() {
        // A full unfiltered page keeps has_more true even if the caller's
        // client-side filter would hide every record on it.
        let mut feed = JobFeed::new(FeedScope::All);
        let t = feed.begin_request();
        feed.apply(t, &page(&["a", "b", "c"], Some(PageCursor::Offset(3))), 3);
        assert!(feed.has_more());
    }
}
