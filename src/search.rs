//! Job search from the terminal.
//!
//! Runs the same read path as the HTTP feed: one query-layer mode picked by
//! the scope flags, then the client-side filter over the fetched page. Used
//! for ops spot-checks against a live database.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::cursor;
use crate::sqlite_store::SqliteStore;
use jobless_core::filter::{filter_jobs, ExperienceFilter};
use jobless_core::query::{self, JobPage, QueryError};

#[allow(clippy::too_many_arguments)]
pub async fn run_search(
    config: &Config,
    search_text: &str,
    category: Option<String>,
    location: Option<String>,
    batch: Option<String>,
    experience: &str,
    limit: Option<usize>,
    cursor_token: Option<String>,
) -> Result<()> {
    let experience = match ExperienceFilter::parse(experience) {
        Some(e) => e,
        None => bail!(
            "Unknown experience level: {}. Use all, entry, mid, or senior.",
            experience
        ),
    };

    let mut params = config.query.params();
    if let Some(limit) = limit {
        if limit == 0 {
            bail!("--limit must be >= 1");
        }
        params.page_size = limit;
    }

    let cursor = cursor_token.as_deref().map(cursor::decode).transpose()?;

    let store = SqliteStore::connect(config).await?;

    let page: JobPage = if let Some(batch) = batch.as_deref().filter(|s| !s.trim().is_empty()) {
        query::list_by_batch_year(&store, &params, batch, cursor.as_ref()).await
    } else if let Some(cat) = category.as_deref().filter(|s| !s.trim().is_empty()) {
        query::list_by_category(&store, &params, cat, cursor.as_ref()).await
    } else if let Some(loc) = location.as_deref().filter(|s| !s.trim().is_empty()) {
        query::list_by_location(&store, &params, loc, cursor.as_ref()).await
    } else {
        query::list_all(&store, &params, cursor.as_ref()).await
    };

    match &page.error {
        Some(QueryError::IndexNotReady) => {
            println!("The job index is still building. Try again shortly.");
            store.close().await;
            return Ok(());
        }
        Some(QueryError::Failed(msg)) => {
            store.close().await;
            eprintln!("Error: failed to load jobs: {}", msg);
            std::process::exit(1);
        }
        None => {}
    }

    let jobs = filter_jobs(&page.records, search_text, experience);

    if jobs.is_empty() {
        println!("No jobs found.");
        if !search_text.trim().is_empty() || experience != ExperienceFilter::All {
            println!("Try clearing the search text or experience filter.");
        }
        store.close().await;
        return Ok(());
    }

    for (i, job) in jobs.iter().enumerate() {
        println!(
            "{}. {} — {} ({})",
            i + 1,
            job.title,
            job.company,
            job.location
        );
        println!("    category: {} | type: {}", job.category, job.job_type);
        if let Some(level) = &job.experience_level {
            println!("    experience: {}", level);
        }
        println!("    posted: {}", job.posted_at.format("%Y-%m-%d"));
        println!("    id: {}", job.id);
        println!();
    }

    if let Some(next) = &page.next_cursor {
        println!("next page: --cursor {}", cursor::encode(next));
    }

    store.close().await;
    Ok(())
}
