//! # JoBless CLI (`jobless`)
//!
//! The `jobless` binary runs the job-board backend and its ops commands.
//!
//! ## Usage
//!
//! ```bash
//! jobless --config ./config/jobless.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jobless init` | Create the SQLite database and run schema migrations |
//! | `jobless import <file.json>` | Bulk-load job postings from a JSON array |
//! | `jobless search "<query>"` | Run the read path from the terminal |
//! | `jobless get <id>` | Print one job document in full |
//! | `jobless serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! jobless init --config ./config/jobless.toml
//!
//! # Load seed listings
//! jobless import ./seed/jobs.json
//!
//! # Search freshers jobs in Bengaluru
//! jobless search "rust" --category fresher
//! jobless search --location bengaluru
//!
//! # Page through results
//! jobless search --limit 5
//! jobless search --limit 5 --cursor <token from previous page>
//!
//! # Start the API server
//! jobless serve
//! ```

mod config;
mod cursor;
mod get;
mod import;
mod migrate;
mod notify;
mod search;
mod server;
mod sqlite_store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// JoBless — a job-listing board backend.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/jobless.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "jobless",
    about = "JoBless — job-listing board backend: search, admin CRUD, and posting integrations",
    version,
    long_about = "JoBless serves a public job catalog (fresher, internship, work-from-home, and \
    experienced categories) with search, filtering, and cursor pagination over a document store, \
    plus an admin area for creating and moderating listings and fire-and-forget email/Telegram \
    announcements."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/jobless.toml`. Database, server, query tuning,
    /// and notification settings are read from this file.
    #[arg(long, global = true, default_value = "./config/jobless.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (jobs,
    /// subscribers, expired_job_reports). This command is idempotent —
    /// running it multiple times is safe.
    Init,

    /// Bulk-load job postings from a JSON file.
    ///
    /// The file holds a JSON array of postings in the same shape the admin
    /// form submits: list-like fields (requirements, skills) as raw text.
    /// Each entry goes through the standard write normalization.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Search job listings.
    ///
    /// Picks one retrieval mode from the scope flags (batch > category >
    /// location > all), then applies the free-text search and experience
    /// filter to the fetched page.
    Search {
        /// Free-text search (title, company, description, location,
        /// category, type, skills).
        #[arg(default_value = "")]
        query: String,

        /// Scope to one category: fresher, wfh, internship, experienced.
        #[arg(long)]
        category: Option<String>,

        /// Scope by location substring (case-insensitive).
        #[arg(long)]
        location: Option<String>,

        /// Scope fresher listings to one batch year (e.g. 2025).
        #[arg(long)]
        batch: Option<String>,

        /// Experience filter: all, entry, mid, or senior.
        #[arg(long, default_value = "all")]
        experience: String,

        /// Page size override.
        #[arg(long)]
        limit: Option<usize>,

        /// Continuation token printed by the previous page.
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Print one job document by id.
    Get {
        /// Job id.
        id: String,
    },

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// public feed, admin CRUD, subscribe, and report endpoints.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            import::run_import(&cfg, &file).await?;
        }
        Commands::Search {
            query,
            category,
            location,
            batch,
            experience,
            limit,
            cursor,
        } => {
            search::run_search(
                &cfg,
                &query,
                category,
                location,
                batch,
                &experience,
                limit,
                cursor,
            )
            .await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
