//! Report command for usage summaries.
//!
//! This module implements `ft report` with various period options
//! (--day, --last-day, --week, --last-week), an optional reference date and
//! output formats (human-readable, JSON).

use std::collections::BTreeMap;
use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use ft_core::UsageRecord;
use ft_store::{AppTotal, DailySummary, DayTotal, UsageStore, WeeklySummary, week_start_of};
use serde::Serialize;

/// Sub-windows listed under each app in a daily report.
const CHILDREN_SHOWN: usize = 3;

const NAME_WIDTH: usize = 28;

/// Report period type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    LastDay,
    Week,
    LastWeek,
}

/// Period type for JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Day,
    Week,
}

#[derive(Debug)]
pub enum Summary {
    Day(DailySummary),
    Week(WeeklySummary),
}

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub summary: Summary,
}

impl ReportData {
    fn period_type(&self) -> PeriodType {
        match self.summary {
            Summary::Day(_) => PeriodType::Day,
            Summary::Week(_) => PeriodType::Week,
        }
    }

    fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match &self.summary {
            Summary::Day(day) => (day.date, day.date),
            Summary::Week(week) => (week.week_start, week.week_end),
        }
    }
}

// ========== Period Date Calculation ==========

/// First day of the period relative to `reference`. Weeks start on Monday.
pub fn period_start(period: Period, reference: NaiveDate) -> NaiveDate {
    match period {
        Period::Day => reference,
        Period::LastDay => reference - chrono::Duration::days(1),
        Period::Week => week_start_of(reference),
        Period::LastWeek => week_start_of(reference) - chrono::Duration::days(7),
    }
}

// ========== Duration Formatting ==========

/// Formats seconds as a duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if >= 1 minute, "Xs" otherwise.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        return format!("{secs}s");
    }
    let total_minutes = secs / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

// ========== Progress Bar ==========

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: u64, max: u64) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Shortens `name` to `width` characters, marking the cut with an ellipsis.
fn fit(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut short: String = name.chars().take(width - 1).collect();
    short.push('…');
    short
}

fn write_row(output: &mut String, name: &str, secs: u64, max: u64) {
    let name = fit(name, NAME_WIDTH);
    let duration = format_duration(secs);
    let bar = progress_bar(secs, max);
    writeln!(output, "{name:<NAME_WIDTH$} {duration:>7}  {bar}").unwrap();
}

// ========== Report Generation ==========

/// Loads the summary for `period` around `reference`.
pub fn generate_report_data(
    store: &UsageStore,
    period: Period,
    reference: NaiveDate,
    generated_at: DateTime<Utc>,
) -> ReportData {
    let start = period_start(period, reference);
    let summary = match period {
        Period::Day | Period::LastDay => Summary::Day(store.daily_summary(start)),
        Period::Week | Period::LastWeek => Summary::Week(store.weekly_summary(start)),
    };

    ReportData {
        generated_at,
        timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
        summary,
    }
}

/// Formats the period description for the report header.
fn format_period_description(data: &ReportData) -> String {
    let (start, _) = data.bounds();
    match data.period_type() {
        // "Week of Jan 27, 2025"
        PeriodType::Week => format!("Week of {}", start.format("%b %-d, %Y")),
        // "Wednesday, Jan 29, 2025"
        PeriodType::Day => format!("{}", start.format("%A, %b %-d, %Y")),
    }
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    let period_desc = format_period_description(data);
    writeln!(output, "USAGE REPORT: {period_desc}").unwrap();

    let total_time = match &data.summary {
        Summary::Day(day) => day.total_time,
        Summary::Week(week) => week.total_time,
    };
    let is_empty = match &data.summary {
        Summary::Day(day) => day.records.is_empty(),
        Summary::Week(week) => week.daily_totals.is_empty(),
    };
    if is_empty {
        let period_word = match data.period_type() {
            PeriodType::Week => "week",
            PeriodType::Day => "day",
        };
        writeln!(output).unwrap();
        writeln!(output, "No usage recorded this {period_word}.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'ft run' to start tracking.").unwrap();
        return output;
    }

    match &data.summary {
        Summary::Day(day) => format_day(&mut output, day),
        Summary::Week(week) => format_week(&mut output, week),
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Total tracked:  {}", format_duration(total_time)).unwrap();
    match &data.summary {
        Summary::Day(day) => {
            writeln!(output, "Apps used:      {}", day.app_count).unwrap();
        }
        Summary::Week(week) => {
            writeln!(output, "Active days:    {} of 7", week.active_days).unwrap();
            writeln!(output, "Daily average:  {}", format_duration(week.avg_daily_time)).unwrap();
        }
    }

    output
}

fn format_day(output: &mut String, day: &DailySummary) {
    writeln!(output).unwrap();
    writeln!(output, "TOP APPS").unwrap();
    writeln!(output, "────────").unwrap();

    let max = day.top_apps.first().map_or(0, |app| app.time);
    for app in &day.top_apps {
        write_row(output, &app.name, app.time, max);
        if let Some(record) = day.records.iter().find(|r| r.exe_path == app.exe_path) {
            write_children(output, record);
        }
    }

    let remaining = day.app_count.saturating_sub(day.top_apps.len());
    if remaining > 0 {
        writeln!(output, "... and {remaining} more").unwrap();
    }
}

fn write_children(output: &mut String, record: &UsageRecord) {
    let mut children: Vec<_> = record.children.values().collect();
    children.sort_by_key(|child| std::cmp::Reverse(child.total_time));

    for child in children.iter().take(CHILDREN_SHOWN) {
        let title = fit(&child.title, NAME_WIDTH - 2);
        let duration = format_duration(child.total_time);
        writeln!(output, "  {title:<width$} {duration:>7}", width = NAME_WIDTH - 2).unwrap();
    }
}

fn format_week(output: &mut String, week: &WeeklySummary) {
    writeln!(output).unwrap();
    writeln!(output, "BY DAY").unwrap();
    writeln!(output, "──────").unwrap();

    let max_day = week
        .daily_totals
        .values()
        .map(|day| day.total_time)
        .max()
        .unwrap_or(0);
    for offset in 0..7 {
        let date = week.week_start + chrono::Duration::days(offset);
        let total = week.daily_totals.get(&date).map_or(0, |day| day.total_time);
        write_row(output, &date.format("%a %b %-d").to_string(), total, max_day);
    }

    writeln!(output).unwrap();
    writeln!(output, "TOP APPS").unwrap();
    writeln!(output, "────────").unwrap();

    let max_app = week.top_apps.first().map_or(0, |app| app.time);
    for app in &week.top_apps {
        write_row(output, &app.name, app.time, max_app);
    }
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub timezone: String,
    pub period: JsonPeriod,
    pub total_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_days: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_daily_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<&'a BTreeMap<NaiveDate, DayTotal>>,
    pub top_apps: &'a [AppTotal],
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
    #[serde(rename = "type")]
    pub period_type: PeriodType,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let (start, end) = data.bounds();
    let period = JsonPeriod {
        start: start.format("%Y-%m-%d").to_string(),
        end: end.format("%Y-%m-%d").to_string(),
        period_type: data.period_type(),
    };

    let report = match &data.summary {
        Summary::Day(day) => JsonReport {
            generated_at: data.generated_at.to_rfc3339(),
            timezone: data.timezone.clone(),
            period,
            total_time: day.total_time,
            app_count: Some(day.app_count),
            active_days: None,
            avg_daily_time: None,
            days: None,
            top_apps: &day.top_apps,
        },
        Summary::Week(week) => JsonReport {
            generated_at: data.generated_at.to_rfc3339(),
            timezone: data.timezone.clone(),
            period,
            total_time: week.total_time,
            app_count: None,
            active_days: Some(week.active_days),
            avg_daily_time: Some(week.avg_daily_time),
            days: Some(&week.daily_totals),
            top_apps: &week.top_apps,
        },
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run(store: &UsageStore, period: Period, date: Option<NaiveDate>, json: bool) -> Result<()> {
    let reference = date.unwrap_or_else(|| Local::now().date_naive());
    let data = generate_report_data(store, period, reference, Utc::now());

    if json {
        let output = format_report_json(&data)?;
        println!("{output}");
    } else {
        let output = format_report(&data);
        print!("{output}");
    }

    Ok(())
}
