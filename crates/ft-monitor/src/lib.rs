//! The polling side of the focus tracker.
//!
//! [`Monitor::spawn`] starts one tokio task that samples a [`FocusSource`]
//! every tick, feeds the observation through the usage state machine and
//! publishes a [`Snapshot`](ft_core::Snapshot) to its subscriber. The task
//! is the only writer of the day's usage tree and of its file.

use ft_store::StoreError;
use thiserror::Error;
use tokio::task::JoinError;

mod monitor;
pub mod platform;

pub use monitor::{Monitor, MonitorConfig, MonitorHandle};
pub use platform::{FocusSource, Foreground};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("snapshot receiver was already taken")]
    AlreadySubscribed,

    #[error("monitor task is not running")]
    Stopped,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("monitor task failed")]
    Join(#[from] JoinError),
}
