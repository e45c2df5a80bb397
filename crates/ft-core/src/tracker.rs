//! Per-tick usage accounting.
//!
//! [`UsageTracker`] owns the day's [`UsageTree`] and applies one observation
//! of the foreground window per tick.
//!
//! # Session Rules
//!
//! - Every tick credits `elapsed` to the observed app's `total_time` (and to
//!   its sub-window when it has one).
//! - `session_time` resets to zero only when an entry goes from inactive to
//!   active, then grows by `elapsed` every tick it stays active.
//! - Switching apps deactivates the previous app and its current sub-window.
//! - A tick on a new calendar date clears the whole tree before anything
//!   else and credits nothing. The outgoing day is not flushed here; whatever
//!   was not yet persisted is dropped.

use std::time::Duration;

use chrono::NaiveDate;

use crate::classify::Classification;
use crate::usage::{CurrentApp, Snapshot, UsageEntry, UsageRecord, UsageTree};

/// A classified foreground window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub exe_path: String,
    pub classification: Classification,
}

/// The usage state machine for one running monitor.
#[derive(Debug, Clone)]
pub struct UsageTracker {
    date: NaiveDate,
    tree: UsageTree,
}

impl UsageTracker {
    /// Creates an empty tracker for `date`.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tree: UsageTree::new(),
        }
    }

    /// Creates a tracker seeded with the totals already persisted for `date`.
    #[must_use]
    pub fn restore(date: NaiveDate, records: &[UsageRecord]) -> Self {
        Self {
            date,
            tree: UsageTree::from_records(records),
        }
    }

    /// The calendar date the tree belongs to.
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn tree(&self) -> &UsageTree {
        &self.tree
    }

    /// Applies one tick and returns the snapshot to publish.
    pub fn tick(
        &mut self,
        today: NaiveDate,
        elapsed: Duration,
        observation: Option<&Observation>,
    ) -> Snapshot {
        if today != self.date {
            tracing::info!(from = %self.date, to = %today, "date changed, resetting usage");
            self.tree.clear();
            self.date = today;
            return self.snapshot(None);
        }

        match observation {
            Some(observation) => {
                self.record(observation, elapsed);
                let sub_title = observation
                    .classification
                    .sub_window
                    .as_ref()
                    .filter(|_| observation.classification.app_type.tracks_sub_windows())
                    .map(|sub| sub.title.clone());
                self.snapshot(sub_title)
            }
            None => {
                self.release();
                self.snapshot(None)
            }
        }
    }

    fn record(&mut self, observation: &Observation, elapsed: Duration) {
        let exe_path = observation.exe_path.as_str();
        let classification = &observation.classification;

        if self.tree.current_app.as_deref() != Some(exe_path) {
            self.release();
            self.tree.current_app = Some(exe_path.to_string());
        }

        let entry = self
            .tree
            .entries
            .entry(exe_path.to_string())
            .or_insert_with(|| {
                tracing::debug!(exe_path, name = %classification.name, "tracking new app");
                UsageEntry::new(classification.name.clone(), classification.app_type)
            });

        entry.total_time += elapsed;

        if let Some(sub) = classification
            .sub_window
            .as_ref()
            .filter(|_| classification.app_type.tracks_sub_windows())
        {
            entry.focus_child(sub, elapsed);
        }

        if !entry.is_active {
            entry.session_time = Duration::ZERO;
            entry.is_active = true;
        }
        entry.session_time += elapsed;
    }

    /// Deactivates the current app, if any, without creating entries.
    fn release(&mut self) {
        if let Some(previous) = self.tree.current_app.take() {
            if let Some(entry) = self.tree.entries.get_mut(&previous) {
                entry.deactivate();
            }
        }
    }

    fn snapshot(&self, active_sub_window_title: Option<String>) -> Snapshot {
        let current_app = self.tree.current_app.as_ref().and_then(|exe_path| {
            self.tree.entries.get(exe_path).map(|entry| CurrentApp {
                exe_path: exe_path.clone(),
                entry: entry.clone(),
                active_sub_window_title,
            })
        });

        Snapshot {
            current_app,
            all_stats: self.tree.entries.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{AppType, classify};

    const SECOND: Duration = Duration::from_secs(1);

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn observe(process: &str, title: &str) -> Observation {
        Observation {
            exe_path: format!("/apps/{process}"),
            classification: classify(process, title),
        }
    }

    fn active_count(tracker: &UsageTracker) -> usize {
        tracker
            .tree()
            .entries()
            .values()
            .filter(|e| e.is_active)
            .count()
    }

    #[test]
    fn constant_app_accumulates_exact_deltas() {
        let mut tracker = UsageTracker::new(day(29));
        let obs = observe("calc.exe", "Calculator");
        let deltas = [
            Duration::from_millis(1000),
            Duration::from_millis(998),
            Duration::from_millis(1_013),
            Duration::from_millis(1_001),
        ];

        for delta in deltas {
            tracker.tick(day(29), delta, Some(&obs));
        }

        let entry = tracker.tree().get("/apps/calc.exe").unwrap();
        let expected: Duration = deltas.iter().sum();
        assert_eq!(entry.total_time, expected);
        assert_eq!(entry.session_time, expected);
        assert!(entry.is_active);
    }

    #[test]
    fn switching_apps_resets_sessions_on_activation() {
        let mut tracker = UsageTracker::new(day(29));
        let a = observe("calc.exe", "Calculator");
        let b = observe("paint.exe", "Paint");

        tracker.tick(day(29), SECOND, Some(&a));
        tracker.tick(day(29), SECOND, Some(&a));
        tracker.tick(day(29), SECOND, Some(&b));

        let entry_b = tracker.tree().get("/apps/paint.exe").unwrap();
        assert_eq!(entry_b.session_time, SECOND);
        assert!(!tracker.tree().get("/apps/calc.exe").unwrap().is_active);

        tracker.tick(day(29), SECOND, Some(&a));
        let entry_a = tracker.tree().get("/apps/calc.exe").unwrap();
        assert_eq!(entry_a.session_time, SECOND);
        assert_eq!(entry_a.total_time, SECOND * 3);
        assert_eq!(active_count(&tracker), 1);
    }

    #[test]
    fn sub_window_sessions_follow_key_changes() {
        let mut tracker = UsageTracker::new(day(29));
        let docs = observe("chrome.exe", "Rust Book - Google Chrome");
        let hub = observe("chrome.exe", "GitHub - Google Chrome");

        tracker.tick(day(29), SECOND, Some(&docs));
        tracker.tick(day(29), SECOND, Some(&docs));
        tracker.tick(day(29), SECOND, Some(&hub));

        let chrome = tracker.tree().get("/apps/chrome.exe").unwrap();
        assert_eq!(chrome.total_time, SECOND * 3);
        assert_eq!(chrome.session_time, SECOND * 3);
        assert_eq!(chrome.current_child.as_deref(), Some("github.com"));
        let book = &chrome.children["Rust Book"];
        assert!(!book.is_active);
        assert_eq!(book.session_time, SECOND * 2);
        let hub_child = &chrome.children["github.com"];
        assert!(hub_child.is_active);
        assert_eq!(hub_child.session_time, SECOND);

        tracker.tick(day(29), SECOND, Some(&docs));
        let book = &tracker.tree().get("/apps/chrome.exe").unwrap().children["Rust Book"];
        assert_eq!(book.session_time, SECOND);
        assert_eq!(book.total_time, SECOND * 3);
    }

    #[test]
    fn returning_to_same_sub_window_restarts_its_session() {
        let mut tracker = UsageTracker::new(day(29));
        let chat = observe("wechat.exe", "小明(3)");

        tracker.tick(day(29), SECOND, Some(&chat));
        tracker.tick(day(29), SECOND, Some(&chat));
        tracker.tick(day(29), SECOND, None);
        tracker.tick(day(29), SECOND, Some(&chat));

        let wechat = tracker.tree().get("/apps/wechat.exe").unwrap();
        let contact = &wechat.children["小明"];
        assert!(contact.is_active);
        assert_eq!(contact.session_time, SECOND);
        assert_eq!(contact.total_time, SECOND * 3);
        assert_eq!(wechat.session_time, SECOND);
    }

    #[test]
    fn no_foreground_deactivates_without_creating_entries() {
        let mut tracker = UsageTracker::new(day(29));
        let editor = observe("code.exe", "main.py - myproj - Visual Studio Code");

        tracker.tick(day(29), SECOND, Some(&editor));
        let snapshot = tracker.tick(day(29), SECOND, None);

        assert!(snapshot.current_app.is_none());
        assert_eq!(tracker.tree().len(), 1);
        assert_eq!(tracker.tree().current_app(), None);
        let code = tracker.tree().get("/apps/code.exe").unwrap();
        assert!(!code.is_active);
        assert!(!code.children["main.py (myproj)"].is_active);
        assert_eq!(code.total_time, SECOND);
    }

    #[test]
    fn day_rollover_clears_tree_mid_session() {
        let mut tracker = UsageTracker::new(day(29));
        let obs = observe("calc.exe", "Calculator");
        tracker.tick(day(29), SECOND, Some(&obs));
        tracker.tick(day(29), SECOND, Some(&obs));

        let snapshot = tracker.tick(day(30), SECOND * 5, Some(&obs));

        assert_eq!(tracker.date(), day(30));
        assert!(tracker.tree().is_empty());
        assert_eq!(tracker.tree().current_app(), None);
        assert!(snapshot.current_app.is_none());
        assert!(snapshot.all_stats.is_empty());

        tracker.tick(day(30), SECOND, Some(&obs));
        let entry = tracker.tree().get("/apps/calc.exe").unwrap();
        assert_eq!(entry.total_time, SECOND);
        assert_eq!(entry.session_time, SECOND);
    }

    #[test]
    fn snapshot_carries_current_app_and_sub_title() {
        let mut tracker = UsageTracker::new(day(29));
        let obs = observe("chrome.exe", "Rust Book - Google Chrome");
        let snapshot = tracker.tick(day(29), SECOND, Some(&obs));

        let current = snapshot.current_app.unwrap();
        assert_eq!(current.exe_path, "/apps/chrome.exe");
        assert_eq!(current.entry.name, "Google Chrome");
        assert_eq!(current.entry.app_type, AppType::Browser);
        assert_eq!(current.active_sub_window_title.as_deref(), Some("Rust Book"));
        assert_eq!(snapshot.all_stats.len(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_tracker() {
        let mut tracker = UsageTracker::new(day(29));
        let obs = observe("calc.exe", "Calculator");
        let snapshot = tracker.tick(day(29), SECOND, Some(&obs));
        tracker.tick(day(29), SECOND, Some(&obs));

        assert_eq!(snapshot.all_stats["/apps/calc.exe"].total_time, SECOND);
        assert_eq!(
            tracker.tree().get("/apps/calc.exe").unwrap().total_time,
            SECOND * 2
        );
    }

    #[test]
    fn restore_starts_every_session_inactive() {
        let record = UsageRecord {
            app_name: "Calculator".to_string(),
            exe_path: "/apps/calc.exe".to_string(),
            total_time: 120,
            app_type: AppType::Normal,
            children: std::collections::BTreeMap::new(),
        };
        let mut tracker = UsageTracker::restore(day(29), &[record]);
        assert_eq!(active_count(&tracker), 0);

        tracker.tick(day(29), SECOND, Some(&observe("calc.exe", "Calculator")));
        let entry = tracker.tree().get("/apps/calc.exe").unwrap();
        assert_eq!(entry.total_time, Duration::from_secs(121));
        assert_eq!(entry.session_time, SECOND);
    }

    #[test]
    fn at_most_one_active_entry_across_switches() {
        let mut tracker = UsageTracker::new(day(29));
        let script = [
            Some(observe("calc.exe", "Calculator")),
            Some(observe("chrome.exe", "知乎 - Google Chrome")),
            None,
            Some(observe("code.exe", "a.rs - p - Visual Studio Code")),
            Some(observe("chrome.exe", "YouTube - Google Chrome")),
            Some(observe("calc.exe", "Calculator")),
        ];

        for obs in &script {
            tracker.tick(day(29), SECOND, obs.as_ref());
            assert!(active_count(&tracker) <= 1);
            for entry in tracker.tree().entries().values() {
                assert!(entry.children.values().filter(|c| c.is_active).count() <= 1);
            }
        }
    }
}
