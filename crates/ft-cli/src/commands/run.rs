//! Foreground tracking loop.
//!
//! Starts the monitor on a tokio runtime, logs each change of active app or
//! sub-window, and saves on Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use ft_core::Snapshot;
use ft_monitor::{Monitor, platform};
use ft_store::UsageStore;

use crate::Config;

/// What the user is looking at, as far as logging is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focus {
    pub exe_path: String,
    pub name: String,
    pub sub_window: Option<String>,
}

impl Focus {
    pub fn of(snapshot: &Snapshot) -> Option<Self> {
        snapshot.current_app.as_ref().map(|current| Self {
            exe_path: current.exe_path.clone(),
            name: current.entry.name.clone(),
            sub_window: current.active_sub_window_title.clone(),
        })
    }
}

/// Logs `snapshot` if its focus differs from `last`, then remembers it.
fn log_change(snapshot: &Snapshot, last: &mut Option<Focus>) {
    let focus = Focus::of(snapshot);
    if focus == *last {
        return;
    }
    match &focus {
        Some(focus) => tracing::info!(
            app = %focus.name,
            sub_window = focus.sub_window.as_deref().unwrap_or(""),
            exe_path = %focus.exe_path,
            "focus changed"
        ),
        None => tracing::info!("no foreground app"),
    }
    *last = focus;
}

async fn track(config: &Config) -> Result<()> {
    let store = Arc::new(UsageStore::new(&config.data_dir));
    let mut handle = Monitor::spawn(config.monitor_config(), platform::system_source(), store);
    let mut snapshots = handle.subscribe()?;

    tracing::info!(data_dir = ?config.data_dir, "tracking started, press Ctrl-C to stop");

    let mut last = None;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
            snapshot = snapshots.recv() => match snapshot {
                Some(snapshot) => log_change(&snapshot, &mut last),
                None => break,
            },
        }
    }

    let dropped = handle.dropped_snapshots();
    if dropped > 0 {
        tracing::debug!(dropped, "snapshots dropped while logging");
    }
    handle
        .shutdown()
        .await
        .context("failed to save usage on shutdown")?;
    tracing::info!("usage saved");
    Ok(())
}

/// Runs the tracker until Ctrl-C.
pub fn run(config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime.block_on(track(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use ft_core::{AppType, CurrentApp, UsageEntry};

    fn snapshot(name: &str, sub_window: Option<&str>) -> Snapshot {
        Snapshot {
            current_app: Some(CurrentApp {
                exe_path: format!("/usr/bin/{name}"),
                entry: UsageEntry::new(name.to_string(), AppType::Browser),
                active_sub_window_title: sub_window.map(str::to_string),
            }),
            all_stats: BTreeMap::new(),
        }
    }

    #[test]
    fn test_log_change_tracks_sub_window() {
        let mut last = None;

        log_change(&snapshot("chrome", Some("Rust Book")), &mut last);
        assert_eq!(last.as_ref().unwrap().sub_window.as_deref(), Some("Rust Book"));

        log_change(&snapshot("chrome", Some("GitHub")), &mut last);
        assert_eq!(last.as_ref().unwrap().sub_window.as_deref(), Some("GitHub"));

        log_change(&Snapshot::default(), &mut last);
        assert_eq!(last, None);
    }

    #[test]
    fn test_focus_of_empty_snapshot() {
        assert_eq!(Focus::of(&Snapshot::default()), None);
    }
}
