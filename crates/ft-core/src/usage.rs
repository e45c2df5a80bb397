//! Usage data model.
//!
//! The in-memory tree ([`UsageTree`]) carries transient session state and
//! sub-second durations. The persisted form ([`UsageRecord`]) keeps only
//! cumulative whole-second totals.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::AppType;
use crate::classify::SubWindow;

/// Serializes a duration as fractional seconds.
fn as_secs_f64<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Time spent in one sub-window of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildEntry {
    pub title: String,
    #[serde(serialize_with = "as_secs_f64")]
    pub total_time: Duration,
    #[serde(serialize_with = "as_secs_f64")]
    pub session_time: Duration,
    pub is_active: bool,
    pub domain: Option<String>,
}

impl ChildEntry {
    #[must_use]
    pub const fn new(title: String, domain: Option<String>) -> Self {
        Self {
            title,
            total_time: Duration::ZERO,
            session_time: Duration::ZERO,
            is_active: false,
            domain,
        }
    }
}

/// Time spent in one application, keyed by executable path in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageEntry {
    pub name: String,
    pub app_type: AppType,
    #[serde(serialize_with = "as_secs_f64")]
    pub total_time: Duration,
    /// Time since this entry last became active.
    #[serde(serialize_with = "as_secs_f64")]
    pub session_time: Duration,
    pub is_active: bool,
    pub children: BTreeMap<String, ChildEntry>,
    pub current_child: Option<String>,
}

impl UsageEntry {
    #[must_use]
    pub const fn new(name: String, app_type: AppType) -> Self {
        Self {
            name,
            app_type,
            total_time: Duration::ZERO,
            session_time: Duration::ZERO,
            is_active: false,
            children: BTreeMap::new(),
            current_child: None,
        }
    }

    /// Credits `elapsed` to a sub-window and runs child session bookkeeping.
    pub(crate) fn focus_child(&mut self, sub: &SubWindow, elapsed: Duration) {
        if self.current_child.as_deref() != Some(sub.key.as_str()) {
            if let Some(previous) = self.current_child.take() {
                if let Some(child) = self.children.get_mut(&previous) {
                    child.is_active = false;
                }
            }
            self.current_child = Some(sub.key.clone());
        }

        let child = self
            .children
            .entry(sub.key.clone())
            .or_insert_with(|| ChildEntry::new(sub.title.clone(), sub.domain.clone()));
        child.total_time += elapsed;
        if !child.is_active {
            child.session_time = Duration::ZERO;
            child.is_active = true;
        }
        child.session_time += elapsed;
    }

    /// Marks this entry and its current sub-window inactive.
    pub(crate) fn deactivate(&mut self) {
        self.is_active = false;
        if let Some(child) = self
            .current_child
            .as_ref()
            .and_then(|key| self.children.get_mut(key))
        {
            child.is_active = false;
        }
    }

    /// Title of the active sub-window, if any.
    #[must_use]
    pub fn active_child_title(&self) -> Option<&str> {
        self.current_child
            .as_ref()
            .and_then(|key| self.children.get(key))
            .filter(|child| child.is_active)
            .map(|child| child.title.as_str())
    }
}

/// Persisted totals for one sub-window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub total_time: u64,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Persisted totals for one application on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub app_name: String,
    pub exe_path: String,
    /// Whole seconds.
    pub total_time: u64,
    #[serde(default)]
    pub app_type: AppType,
    #[serde(default)]
    pub children: BTreeMap<String, ChildRecord>,
}

/// All usage observed on the current day, keyed by executable path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTree {
    pub(crate) entries: BTreeMap<String, UsageEntry>,
    pub(crate) current_app: Option<String>,
}

impl UsageTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a tree from persisted records.
    ///
    /// Only totals survive; every entry starts inactive with no session time.
    #[must_use]
    pub fn from_records(records: &[UsageRecord]) -> Self {
        let entries = records
            .iter()
            .map(|record| {
                let mut entry = UsageEntry::new(record.app_name.clone(), record.app_type);
                entry.total_time = Duration::from_secs(record.total_time);
                entry.children = record
                    .children
                    .iter()
                    .map(|(key, child)| {
                        let mut restored = ChildEntry::new(child.title.clone(), child.domain.clone());
                        restored.total_time = Duration::from_secs(child.total_time);
                        (key.clone(), restored)
                    })
                    .collect();
                (record.exe_path.clone(), entry)
            })
            .collect();

        Self {
            entries,
            current_app: None,
        }
    }

    /// Flattens the tree into persistable records, truncating to whole seconds.
    #[must_use]
    pub fn to_records(&self) -> Vec<UsageRecord> {
        self.entries
            .iter()
            .map(|(exe_path, entry)| UsageRecord {
                app_name: entry.name.clone(),
                exe_path: exe_path.clone(),
                total_time: entry.total_time.as_secs(),
                app_type: entry.app_type,
                children: entry
                    .children
                    .iter()
                    .map(|(key, child)| {
                        (
                            key.clone(),
                            ChildRecord {
                                title: child.title.clone(),
                                total_time: child.total_time.as_secs(),
                                domain: child.domain.clone(),
                            },
                        )
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn entries(&self) -> &BTreeMap<String, UsageEntry> {
        &self.entries
    }

    pub fn get(&self, exe_path: &str) -> Option<&UsageEntry> {
        self.entries.get(exe_path)
    }

    /// Executable path of the active application.
    pub fn current_app(&self) -> Option<&str> {
        self.current_app.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry and the active pointer.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_app = None;
    }
}

/// The active application as published in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentApp {
    pub exe_path: String,
    #[serde(flatten)]
    pub entry: UsageEntry,
    pub active_sub_window_title: Option<String>,
}

/// State published after every tick.
///
/// Owns a full copy of the tree so subscribers never share memory with the
/// monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub current_app: Option<CurrentApp>,
    pub all_stats: BTreeMap<String, UsageEntry>,
}
