//! Sync command - mirror the remote database locally

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mysql_sync_core::services::SyncObserver;
use mysql_sync_core::{LogEvent, SyncOptions, SyncStage};

use super::{get_context, get_logger, log_event};
use crate::output;

/// Spinner that follows the pipeline stages
struct StageSpinner {
    bar: Option<ProgressBar>,
}

impl StageSpinner {
    fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self { bar }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl SyncObserver for StageSpinner {
    fn stage_changed(&self, stage: SyncStage) {
        let Some(bar) = &self.bar else {
            return;
        };
        let message = match stage {
            SyncStage::Connecting => "Connecting to remote server...",
            SyncStage::Dumping => "Creating dump on remote server...",
            SyncStage::Transferring => "Downloading dump...",
            SyncStage::Restoring => "Restoring local database...",
            SyncStage::Pruning => "Cleaning up old backups...",
            _ => return,
        };
        bar.set_message(message);
    }
}

pub fn run(config_path: &Path, keep: Option<usize>, skip_restore: bool, json: bool) -> Result<()> {
    if keep == Some(0) {
        anyhow::bail!("--keep must be at least 1");
    }

    let ctx = get_context(config_path)?;
    let logger = get_logger();
    let database = ctx.config.remote.database.clone();

    if !json {
        output::info("Starting database synchronization...");
    }
    log_event(&logger, LogEvent::new("sync_started").with_database(&database));

    let options = SyncOptions {
        skip_restore,
        keep_backups: keep,
    };
    let spinner = StageSpinner::new(!json && output::interactive());
    let result = ctx.sync_service.run(&options, &spinner);
    spinner.finish();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            let mut event = LogEvent::new("sync_failed")
                .with_database(&database)
                .with_error(e.to_string())
                .with_error_details(format!("{:?}", e));
            if let Some(stage) = e.failed_stage() {
                event = event.with_stage(stage);
            }
            log_event(&logger, event);
            return Err(e.into());
        }
    };

    for warning in &report.prune.warnings {
        log_event(
            &logger,
            LogEvent::new("prune_warning")
                .with_artifact(&warning.file)
                .with_error(&warning.message),
        );
    }
    log_event(
        &logger,
        LogEvent::new("sync_completed")
            .with_database(&database)
            .with_artifact(&report.artifact)
            .with_stage(report.final_stage),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Dump:".green(), report.artifact);
    println!("  Remote: {}", report.remote.path);
    println!(
        "  Local:  {} ({} bytes)",
        report.local.path.display(),
        report.local.size_bytes
    );
    match &report.restored_database {
        Some(db) => println!("  Restored into local database {}", db.bold()),
        None => println!("  Restore skipped"),
    }
    for name in &report.prune.removed {
        println!("  Removed old backup: {}", name);
    }
    for warning in &report.prune.warnings {
        output::warning(&format!(
            "  Failed to remove old backup {}: {}",
            warning.file, warning.message
        ));
    }
    if let Some(warning) = &report.close_warning {
        output::warning(&format!("  Remote session did not close cleanly: {}", warning));
    }
    println!();
    output::success("Database synchronization completed successfully!");

    Ok(())
}
