//! Logs command - view and manage the run history

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use mysql_sync_core::services::logging::now_ms;

use super::get_logging_service;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent events
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failures
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear old events
    Clear {
        /// Delete events older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Milliseconds in `days`, clamped instead of overflowing
fn age_ms(days: u64) -> i64 {
    i64::try_from(days)
        .unwrap_or(i64::MAX)
        .saturating_mul(DAY_MS)
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{Local, TimeZone};
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = get_logging_service()?;

    match command {
        LogsCommands::List { limit, errors, json } => {
            let entries = if errors {
                service.get_errors(limit)?
            } else {
                service.get_recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Event", "Stage", "Context", "Error"]);

            for entry in &entries {
                let context = [
                    entry.event.database.as_deref(),
                    entry.event.artifact.as_deref(),
                ]
                .iter()
                .filter_map(|&s| s)
                .collect::<Vec<_>>()
                .join(", ");

                let error = entry
                    .event
                    .error_message
                    .as_deref()
                    .map(|m| m.red().to_string())
                    .unwrap_or_default();

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.event.event.clone(),
                    entry
                        .event
                        .stage
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                    context,
                    error,
                ]);
            }

            println!("{}", table);
            println!("{}", service.path().display().to_string().dimmed());
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let cutoff_ms = now_ms().saturating_sub(age_ms(older_than_days));

            if !force && !json {
                use dialoguer::Confirm;
                if !Confirm::new()
                    .with_prompt(format!(
                        "Delete log entries older than {} days?",
                        older_than_days
                    ))
                    .default(false)
                    .interact()?
                {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = service.delete_before(cutoff_ms)?;
            let _ = service.log_event("logs_cleared");
            let remaining = service.count()?;

            if json {
                println!(
                    "{}",
                    serde_json::json!({"deleted": deleted, "remaining": remaining})
                );
            } else {
                println!(
                    "Deleted {} log entries ({} remaining)",
                    deleted, remaining
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_ms() {
        assert_eq!(age_ms(0), 0);
        assert_eq!(age_ms(30), 30 * DAY_MS);
        assert_eq!(age_ms(u64::MAX), i64::MAX);
        assert!(now_ms().saturating_sub(age_ms(u64::MAX)) < 0);
    }
}
