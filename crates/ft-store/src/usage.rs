//! Per-day usage files and the summaries computed from them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use ft_core::{AppType, UsageRecord, UsageTree};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::StoreError;
use crate::cache::{DEFAULT_TTL, FileCache};

pub const DAILY_TOP_N: usize = 5;
pub const WEEKLY_TOP_N: usize = 10;

/// On-disk contents of one day's usage file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFile {
    pub date: NaiveDate,
    #[serde(default)]
    pub records: Vec<UsageRecord>,
    #[serde(default)]
    pub saved_at: Option<NaiveDateTime>,
}

/// Seconds spent in one application over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppTotal {
    pub exe_path: String,
    pub name: String,
    pub app_type: AppType,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_time: u64,
    pub app_count: usize,
    pub top_apps: Vec<AppTotal>,
    /// Every record of the day, longest first.
    pub records: Vec<UsageRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub total_time: u64,
    pub app_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_time: u64,
    /// Days with at least one record.
    pub active_days: usize,
    /// Average over active days only.
    pub avg_daily_time: u64,
    /// Active days only.
    pub daily_totals: BTreeMap<NaiveDate, DayTotal>,
    pub top_apps: Vec<AppTotal>,
}

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Usage files under `<data_dir>/usage`, read through a shared cache.
#[derive(Debug)]
pub struct UsageStore {
    usage_dir: PathBuf,
    cache: FileCache<DayFile>,
}

impl UsageStore {
    pub fn new(data_dir: &Path) -> Self {
        Self::with_cache_ttl(data_dir, DEFAULT_TTL)
    }

    pub fn with_cache_ttl(data_dir: &Path, ttl: Duration) -> Self {
        Self {
            usage_dir: data_dir.join("usage"),
            cache: FileCache::with_ttl(ttl),
        }
    }

    pub fn usage_dir(&self) -> &Path {
        &self.usage_dir
    }

    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.usage_dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Persists the tree as `date`'s records, replacing the file.
    pub fn save(&self, date: NaiveDate, tree: &UsageTree) -> Result<(), StoreError> {
        self.save_records(date, tree.to_records())
    }

    pub fn save_records(&self, date: NaiveDate, records: Vec<UsageRecord>) -> Result<(), StoreError> {
        let path = self.day_path(date);
        let count = records.len();
        let file = DayFile {
            date,
            records,
            saved_at: Some(Local::now().naive_local()),
        };
        self.cache.write(&path, &file)?;
        tracing::debug!(%date, records = count, "saved usage");
        Ok(())
    }

    /// Records for `date`; empty when the file is missing or unreadable.
    pub fn load(&self, date: NaiveDate) -> Vec<UsageRecord> {
        self.cache
            .read(&self.day_path(date))
            .map(|file| file.records)
            .unwrap_or_default()
    }

    /// Dates that have a usage file, oldest first.
    pub fn dates_with_usage(&self) -> BTreeSet<NaiveDate> {
        let pattern = format!(
            "{}/*.json",
            glob::Pattern::escape(&self.usage_dir.to_string_lossy())
        );
        let Ok(paths) = glob::glob(&pattern) else {
            return BTreeSet::new();
        };

        paths
            .filter_map(Result::ok)
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
            })
            .collect()
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        let mut records = self.load(date);
        records.sort_by(|a, b| b.total_time.cmp(&a.total_time));

        let top_apps = records
            .iter()
            .take(DAILY_TOP_N)
            .map(|record| AppTotal {
                exe_path: record.exe_path.clone(),
                name: record.app_name.clone(),
                app_type: record.app_type,
                time: record.total_time,
            })
            .collect();

        DailySummary {
            date,
            total_time: records.iter().map(|record| record.total_time).sum(),
            app_count: records.len(),
            top_apps,
            records,
        }
    }

    /// Aggregates the seven days starting at `week_start`.
    pub fn weekly_summary(&self, week_start: NaiveDate) -> WeeklySummary {
        let days: Vec<NaiveDate> = (0..7)
            .map(|offset| week_start + chrono::Duration::days(offset))
            .collect();
        let loaded: Vec<(NaiveDate, Vec<UsageRecord>)> = days
            .par_iter()
            .map(|&date| (date, self.load(date)))
            .collect();

        let mut daily_totals = BTreeMap::new();
        let mut apps: Vec<AppTotal> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (date, records) in &loaded {
            if records.is_empty() {
                continue;
            }
            daily_totals.insert(
                *date,
                DayTotal {
                    total_time: records.iter().map(|record| record.total_time).sum(),
                    app_count: records.len(),
                },
            );

            for record in records {
                if let Some(&i) = index.get(&record.exe_path) {
                    let app = &mut apps[i];
                    app.time += record.total_time;
                    app.name.clone_from(&record.app_name);
                    app.app_type = record.app_type;
                } else {
                    index.insert(record.exe_path.clone(), apps.len());
                    apps.push(AppTotal {
                        exe_path: record.exe_path.clone(),
                        name: record.app_name.clone(),
                        app_type: record.app_type,
                        time: record.total_time,
                    });
                }
            }
        }

        let total_time: u64 = daily_totals.values().map(|day| day.total_time).sum();
        let active_days = daily_totals.len();
        let avg_daily_time = if active_days == 0 {
            0
        } else {
            total_time / active_days as u64
        };

        apps.sort_by(|a, b| b.time.cmp(&a.time));
        apps.truncate(WEEKLY_TOP_N);

        WeeklySummary {
            week_start,
            week_end: days[6],
            total_time,
            active_days,
            avg_daily_time,
            daily_totals,
            top_apps: apps,
        }
    }

    /// Removes `date`'s file. Returns whether one existed.
    pub fn delete(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let removed = self.cache.remove(&self.day_path(date))?;
        if removed {
            tracing::info!(%date, "deleted usage");
        }
        Ok(removed)
    }

    /// Forgets every cached day file.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
