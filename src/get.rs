//! Job retrieval by id.
//!
//! Prints the full job document. Used by the `jobless get` CLI command;
//! the HTTP equivalent is `GET /jobs/{id}`.

use anyhow::Result;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;
use jobless_core::store::JobStore;

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = SqliteStore::connect(config).await?;

    let job = match store.get_job(id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            store.close().await;
            eprintln!("Error: job not found: {}", id);
            std::process::exit(1);
        }
        Err(e) => {
            store.close().await;
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    store.close().await;

    println!("--- Job ---");
    println!("id:         {}", job.id);
    println!("title:      {}", job.title);
    println!("company:    {}", job.company);
    println!("location:   {}", job.location);
    println!("type:       {}", job.job_type);
    println!("category:   {}", job.category);
    if let Some(ref batch) = job.batch_year {
        println!("batch:      {}", batch);
    }
    if let Some(ref salary) = job.salary {
        println!("salary:     {}", salary);
    }
    if let Some(ref level) = job.experience_level {
        println!("experience: {}", level);
    }
    println!("status:     {}", job.status.as_str());
    println!("posted_at:  {}", job.posted_at.format("%Y-%m-%dT%H:%M:%SZ"));
    if let Some(deadline) = job.deadline {
        println!("deadline:   {}", deadline.format("%Y-%m-%dT%H:%M:%SZ"));
    }
    if let Some(ref link) = job.application_link {
        println!("apply:      {}", link);
    }
    println!();

    println!("--- Description ---");
    println!("{}", job.description);
    println!();

    if !job.requirements.is_empty() {
        println!("--- Requirements ---");
        for item in &job.requirements {
            println!("- {}", item);
        }
        println!();
    }

    if !job.responsibilities.is_empty() {
        println!("--- Responsibilities ---");
        for item in &job.responsibilities {
            println!("- {}", item);
        }
        println!();
    }

    if !job.perks.is_empty() {
        println!("--- Perks ---");
        for item in &job.perks {
            println!("- {}", item);
        }
        println!();
    }

    if !job.skills.is_empty() {
        println!("--- Skills ---");
        println!("{}", job.skills.join(", "));
    }

    Ok(())
}
