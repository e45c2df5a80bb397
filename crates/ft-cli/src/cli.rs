//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};

/// Foreground application usage tracker.
///
/// Samples which application and sub-window (browser site, chat contact,
/// editor file) has focus every second and keeps daily totals.
#[derive(Debug, Parser)]
#[command(name = "ft", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track the foreground application until interrupted.
    Run,

    /// Show a daily or weekly usage report.
    #[command(group(ArgGroup::new("period").args(["day", "last_day", "week", "last_week"])))]
    Report {
        /// Report on the reference day (default).
        #[arg(long)]
        day: bool,

        /// Report on the day before the reference day.
        #[arg(long)]
        last_day: bool,

        /// Report on the week containing the reference day.
        #[arg(long)]
        week: bool,

        /// Report on the week before.
        #[arg(long)]
        last_week: bool,

        /// Reference day as YYYY-MM-DD (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List dates that have recorded usage.
    Dates {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete a day's recorded usage.
    Delete {
        /// Day to delete as YYYY-MM-DD.
        date: NaiveDate,
    },

    /// Show how a process and window title would be classified.
    Classify {
        /// Process name, e.g. chrome.exe.
        #[arg(long)]
        process: String,

        /// Window title.
        #[arg(long, default_value = "")]
        title: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
