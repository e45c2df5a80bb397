//! CLI subcommand implementations.

pub mod classify;
pub mod dates;
pub mod delete;
pub mod report;
pub mod run;
