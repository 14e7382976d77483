//! Backups command - manage local dumps

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use mysql_sync_core::LogEvent;

use super::{get_context, get_logger, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum BackupsCommands {
    /// List local dumps, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all but the newest dumps
    Prune {
        /// Number of dumps to keep (defaults to keep_backups)
        #[arg(long, short)]
        keep: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a local dump into the local database, replacing its contents
    Restore {
        /// Dump file name, as shown by `backups list`
        name: String,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(config_path: &Path, command: BackupsCommands) -> Result<()> {
    let ctx = get_context(config_path)?;

    match command {
        BackupsCommands::List { json } => {
            let backups = ctx.backup_service.list()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&backups)?);
                return Ok(());
            }

            if backups.is_empty() {
                println!(
                    "No backups found in {}.",
                    ctx.backup_service.backup_dir().display()
                );
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Name", "Created", "Size"]);

            for backup in &backups {
                table.add_row(vec![
                    backup.name.clone(),
                    backup.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    backup.size_display(),
                ]);
            }

            println!("{}", table);
        }
        BackupsCommands::Prune { keep, json } => {
            let keep = keep.unwrap_or(ctx.config.keep_backups);
            let report = ctx.backup_service.prune(keep)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            for name in &report.removed {
                println!("Removed old backup: {}", name);
            }
            for warning in &report.warnings {
                output::warning(&format!(
                    "Failed to remove old backup {}: {}",
                    warning.file, warning.message
                ));
            }
            println!(
                "Kept {} backup(s), removed {}",
                report.kept.len(),
                report.removed.len()
            );
        }
        BackupsCommands::Restore { name, force, json } => {
            let database = ctx.config.local.database.clone();
            if !force && !json {
                use dialoguer::Confirm;
                if !Confirm::new()
                    .with_prompt(format!(
                        "Replace local database '{}' with '{}'?",
                        database, name
                    ))
                    .default(false)
                    .interact()?
                {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let logger = get_logger();
            match ctx.backup_service.restore(&name) {
                Ok(backup) => {
                    log_event(
                        &logger,
                        LogEvent::new("backup_restored")
                            .with_database(&database)
                            .with_artifact(&backup.name),
                    );
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({"restored": backup.name, "database": database})
                        );
                    } else {
                        println!(
                            "{} {} into {}",
                            "Restored".green(),
                            backup.name,
                            database.bold()
                        );
                    }
                }
                Err(e) => {
                    log_event(
                        &logger,
                        LogEvent::new("backup_restore_failed")
                            .with_database(&database)
                            .with_artifact(&name)
                            .with_error(e.to_string()),
                    );
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
