//! # JoBless Core
//!
//! Shared logic for the JoBless job board: data models, the document-store
//! abstraction, the read-path query layer (retrieval modes, over-fetch and
//! cursor emulation), the client-side filter/search engine, and feed
//! pagination bookkeeping.
//!
//! This crate contains no tokio, sqlx, HTTP, or other I/O dependencies.
//! Everything here is driven through the [`store::JobStore`] trait, so the
//! same query and filter code runs against SQLite in production and the
//! in-memory store in tests.

pub mod feed;
pub mod filter;
pub mod models;
pub mod query;
pub mod store;
