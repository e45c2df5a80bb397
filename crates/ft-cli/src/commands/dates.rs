//! Lists the days that have recorded usage.

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use ft_store::UsageStore;

use super::report::format_duration;

/// Formats one line per day, oldest first.
pub fn format_dates(days: &[(NaiveDate, u64)]) -> String {
    let mut output = String::new();
    if days.is_empty() {
        writeln!(output, "No usage recorded yet.").unwrap();
        return output;
    }
    for (date, total) in days {
        let duration = format_duration(*total);
        writeln!(output, "{}  {duration:>7}", date.format("%Y-%m-%d %a")).unwrap();
    }
    output
}

pub fn run(store: &UsageStore, json: bool) -> Result<()> {
    let dates = store.dates_with_usage();

    if json {
        println!("{}", serde_json::to_string_pretty(&dates)?);
        return Ok(());
    }

    let days: Vec<(NaiveDate, u64)> = dates
        .into_iter()
        .map(|date| (date, store.daily_summary(date).total_time))
        .collect();
    print!("{}", format_dates(&days));
    Ok(())
}
