//! Bulk job import from a JSON file.
//!
//! The ops-side counterpart of the admin posting form: reads a JSON array
//! of raw postings (textarea-shaped fields) and runs each through the same
//! write normalization as `POST /jobs`. Notifications are not fired for
//! imported jobs.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;
use jobless_core::models::NewJobInput;
use jobless_core::store::JobStore;

pub async fn run_import(config: &Config, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let inputs: Vec<NewJobInput> =
        serde_json::from_str(&content).with_context(|| "Failed to parse import file as a JSON array of jobs")?;

    let store = SqliteStore::connect(config).await?;

    let mut imported = 0u64;
    let mut skipped = 0u64;

    for input in inputs {
        if input.title.trim().is_empty() || input.company.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let job = input.into_record(Utc::now());
        store
            .insert_job(&job)
            .await
            .map_err(|e| anyhow::anyhow!("inserting '{}': {}", job.title, e))?;
        imported += 1;
    }

    store.close().await;

    println!("import {}", file.display());
    println!("  imported jobs: {}", imported);
    if skipped > 0 {
        println!("  skipped (missing title/company): {}", skipped);
    }
    println!("  ok");
    Ok(())
}
