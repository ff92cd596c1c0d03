//! # horario-feed
//!
//! Collaborator ports for the horario engine and a concurrent fetch layer.
//!
//! This crate provides:
//! - `ScheduleFeed` / `DirectoryFeed` async ports
//! - `JsonFileFeed`, an adapter reading a directory of JSON files
//! - `fetch_weekly_data`: one task per worker, settle-all semantics
//! - `RequestTracker` / `WeeklyDataLoader`: last-request-wins freshness
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use horario_feed::{fetch_weekly_data, JsonFileFeed};
//!
//! let feed = Arc::new(JsonFileFeed::new("data"));
//! let report = fetch_weekly_data(feed, &worker_ids, range, DailyOptions::default()).await;
//! if let Some(warning) = report.warning() {
//!     eprintln!("{warning}");
//! }
//! let context = report.context();
//! ```

pub mod fetch;
pub mod json_file;
pub mod ports;
pub mod tracker;

pub use fetch::{fetch_weekly_data, FetchFailure, FetchReport};
pub use json_file::JsonFileFeed;
pub use ports::{DirectoryFeed, EntryKind, ScheduleFeed};
pub use tracker::{RequestTicket, RequestTracker, WeeklyDataLoader};

use thiserror::Error;

/// Feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed feed data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Fetch task failed: {0}")]
    Task(String),
}
