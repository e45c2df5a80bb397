//! End-to-end tests driving the `ft` binary against a temporary data dir.
//!
//! Usage is seeded through the store and read back through `report`,
//! `dates` and `delete`.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Output};

use chrono::NaiveDate;
use ft_core::{AppType, ChildRecord, UsageRecord};
use ft_store::UsageStore;
use tempfile::TempDir;

fn ft_binary() -> String {
    env!("CARGO_BIN_EXE_ft").to_string()
}

/// Runs `ft` with HOME and the data dir pointed into `temp`.
fn ft(temp: &Path, args: &[&str]) -> Output {
    Command::new(ft_binary())
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env("FT_DATA_DIR", temp.join("data"))
        .args(args)
        .output()
        .expect("failed to run ft")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "ft should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn record(name: &str, exe_path: &str, secs: u64) -> UsageRecord {
    UsageRecord {
        app_name: name.to_string(),
        exe_path: exe_path.to_string(),
        total_time: secs,
        app_type: AppType::Normal,
        children: BTreeMap::new(),
    }
}

fn seed(temp: &Path) {
    let store = UsageStore::new(&temp.join("data"));

    let mut chrome = record("Google Chrome", "/usr/bin/chrome", 3600);
    chrome.app_type = AppType::Browser;
    chrome.children.insert(
        "github.com".to_string(),
        ChildRecord {
            title: "GitHub".to_string(),
            total_time: 1200,
            domain: Some("github.com".to_string()),
        },
    );
    store
        .save_records(
            date("2025-01-27"),
            vec![chrome, record("Terminal", "/usr/bin/term", 600)],
        )
        .unwrap();
    store
        .save_records(date("2025-01-29"), vec![record("Terminal", "/usr/bin/term", 900)])
        .unwrap();
}

#[test]
fn test_daily_report_json() {
    let temp = TempDir::new().unwrap();
    seed(temp.path());

    let output = ft(temp.path(), &["report", "--day", "--date", "2025-01-27", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(json["period"]["type"], "day");
    assert_eq!(json["total_time"], 4200);
    assert_eq!(json["app_count"], 2);
    assert_eq!(json["top_apps"][0]["name"], "Google Chrome");
    assert_eq!(json["top_apps"][0]["app_type"], "browser");
}

#[test]
fn test_weekly_report_json() {
    let temp = TempDir::new().unwrap();
    seed(temp.path());

    let output = ft(temp.path(), &["report", "--week", "--date", "2025-01-29", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(json["period"]["start"], "2025-01-27");
    assert_eq!(json["period"]["end"], "2025-02-02");
    assert_eq!(json["total_time"], 5100);
    assert_eq!(json["active_days"], 2);
    assert_eq!(json["avg_daily_time"], 2550);
    assert_eq!(json["top_apps"][0]["name"], "Google Chrome");
    assert_eq!(json["top_apps"][1]["time"], 1500);
}

#[test]
fn test_human_report_lists_sub_windows() {
    let temp = TempDir::new().unwrap();
    seed(temp.path());

    let output = stdout(&ft(temp.path(), &["report", "--date", "2025-01-27"]));

    assert!(output.starts_with("USAGE REPORT: Monday, Jan 27, 2025"));
    assert!(output.contains("Google Chrome"));
    assert!(output.contains("  GitHub"));
    assert!(output.contains("Total tracked:  1h 10m"));
}

#[test]
fn test_report_on_empty_day() {
    let temp = TempDir::new().unwrap();

    let output = stdout(&ft(temp.path(), &["report", "--last-day", "--date", "2025-01-29"]));

    assert!(output.starts_with("USAGE REPORT: Tuesday, Jan 28, 2025"));
    assert!(output.contains("No usage recorded this day."));
}

#[test]
fn test_dates_then_delete() {
    let temp = TempDir::new().unwrap();
    seed(temp.path());

    let listed: Vec<String> =
        serde_json::from_str(&stdout(&ft(temp.path(), &["dates", "--json"]))).unwrap();
    assert_eq!(listed, vec!["2025-01-27", "2025-01-29"]);

    let deleted = stdout(&ft(temp.path(), &["delete", "2025-01-27"]));
    assert_eq!(deleted.trim(), "Deleted usage for 2025-01-27.");

    let again = stdout(&ft(temp.path(), &["delete", "2025-01-27"]));
    assert_eq!(again.trim(), "No usage recorded for 2025-01-27.");

    let listed: Vec<String> =
        serde_json::from_str(&stdout(&ft(temp.path(), &["dates", "--json"]))).unwrap();
    assert_eq!(listed, vec!["2025-01-29"]);
}

#[test]
fn test_config_file_sets_data_dir() {
    let temp = TempDir::new().unwrap();
    let other = temp.path().join("elsewhere");
    let store = UsageStore::new(&other);
    store
        .save_records(date("2025-03-01"), vec![record("Terminal", "/usr/bin/term", 5)])
        .unwrap();

    let config_path = temp.path().join("ft.toml");
    std::fs::write(&config_path, format!("data_dir = {:?}\n", other.display().to_string())).unwrap();

    let output = Command::new(ft_binary())
        .env("HOME", temp.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("FT_DATA_DIR")
        .args(["--config", config_path.to_str().unwrap(), "dates", "--json"])
        .output()
        .unwrap();
    let listed: Vec<String> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(listed, vec!["2025-03-01"]);
}

#[test]
fn test_classify_json() {
    let temp = TempDir::new().unwrap();

    let output = ft(
        temp.path(),
        &[
            "classify",
            "--process",
            "chrome.exe",
            "--title",
            "Rust Book - Google Chrome",
            "--json",
        ],
    );
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(json["app_type"], "browser");
    assert_eq!(json["name"], "Google Chrome");
    assert_eq!(json["sub_window"]["key"], "Rust Book");
    assert!(json["sub_window"]["domain"].is_null());
}

#[test]
fn test_invalid_date_is_rejected() {
    let temp = TempDir::new().unwrap();
    let output = ft(temp.path(), &["delete", "not-a-date"]);
    assert!(!output.status.success());
}
