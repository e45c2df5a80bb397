//! Deletes one day's usage file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ft_store::UsageStore;

pub fn run(store: &UsageStore, date: NaiveDate) -> Result<()> {
    let removed = store
        .delete(date)
        .with_context(|| format!("failed to delete usage for {date}"))?;

    if removed {
        println!("Deleted usage for {date}.");
    } else {
        println!("No usage recorded for {date}.");
    }
    Ok(())
}
