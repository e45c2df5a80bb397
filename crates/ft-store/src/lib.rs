//! Storage layer for the focus tracker.
//!
//! Usage is persisted as one JSON file per calendar date under
//! `<data_dir>/usage/YYYY-MM-DD.json`:
//!
//! ```json
//! {
//!   "date": "2025-01-29",
//!   "records": [
//!     {
//!       "app_name": "Google Chrome",
//!       "exe_path": "/usr/bin/chrome",
//!       "total_time": 90,
//!       "app_type": "browser",
//!       "children": { "github.com": { "title": "GitHub", "total_time": 60, "domain": "github.com" } }
//!     }
//!   ],
//!   "saved_at": "2025-01-29T18:04:11.120331"
//! }
//! ```
//!
//! Reads go through a [`FileCache`] that trusts its copy for a few seconds
//! unless the file's modification time changes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod cache;
mod usage;

pub use cache::FileCache;
pub use usage::{
    AppTotal, DAILY_TOP_N, DailySummary, DayFile, DayTotal, UsageStore, WEEKLY_TOP_N,
    WeeklySummary, week_start_of,
};

/// Storage errors.
///
/// Only writes and deletes fail; reads of missing or damaged files are
/// treated as empty.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not create the directory holding a file.
    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Could not encode a value as JSON.
    #[error("failed to serialize {}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Could not take the lock guarding a file.
    #[error("failed to lock {}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Could not write a file.
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Could not delete a file.
    #[error("failed to delete {}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
