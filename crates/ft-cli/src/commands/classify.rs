//! Window classification command.
//!
//! Shows how the tracker would attribute a process and window title without
//! running the monitor.

use std::fmt::Write;

use anyhow::Result;
use ft_core::{Classification, classify};

/// Formats a classification as aligned `field: value` lines.
pub fn format_classification(classification: &Classification) -> String {
    let mut output = String::new();
    writeln!(output, "Type:        {}", classification.app_type).unwrap();
    writeln!(output, "Name:        {}", classification.name).unwrap();
    match &classification.sub_window {
        Some(sub) => {
            writeln!(output, "Sub-window:  {}", sub.title).unwrap();
            writeln!(output, "Key:         {}", sub.key).unwrap();
            if let Some(domain) = &sub.domain {
                writeln!(output, "Domain:      {domain}").unwrap();
            }
        }
        None => {
            writeln!(output, "Sub-window:  (none)").unwrap();
        }
    }
    output
}

pub fn run(process: &str, title: &str, json: bool) -> Result<()> {
    let classification = classify(process, title);
    tracing::debug!(process, title, ?classification, "classified window");

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        print!("{}", format_classification(&classification));
    }
    Ok(())
}
