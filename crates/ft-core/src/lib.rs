//! Core domain logic for the focus tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: mapping a process and window title to an app and sub-window
//! - Usage model: the in-memory usage tree and its persisted records
//! - Tracking: the per-tick session state machine

mod app_type;
pub mod classify;
pub mod tracker;
pub mod usage;

pub use app_type::{AppType, UnknownAppType};
pub use classify::{CHAT_MAIN_VIEW, Classification, SubWindow, classify};
pub use tracker::{Observation, UsageTracker};
pub use usage::{ChildEntry, ChildRecord, CurrentApp, Snapshot, UsageEntry, UsageRecord, UsageTree};
