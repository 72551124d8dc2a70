use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    apply_schema(store.pool()).await?;
    store.close().await;
    Ok(())
}

/// Create all tables and indexes. Idempotent.
///
/// The `jobs` table keeps the document-store character: scalar columns only
/// for the fields the query layer filters or orders on, the full document
/// as JSON in `doc`. There is deliberately no compound (category, posted_at)
/// index; category reads re-sort a bounded snapshot in memory.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            category TEXT NOT NULL DEFAULT '',
            batch_year TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            posted_at INTEGER NOT NULL,
            location TEXT NOT NULL DEFAULT '',
            doc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscribers (
            email TEXT PRIMARY KEY,
            subscribed_at INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expired_job_reports (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            job_title TEXT NOT NULL,
            company TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            reported_at INTEGER NOT NULL,
            reviewed_at INTEGER,
            reviewed_by TEXT,
            action_taken TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_posted_at ON jobs(posted_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_category ON jobs(category)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reports_status ON expired_job_reports(status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
