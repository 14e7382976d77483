//! CLI command implementations

pub mod backups;
pub mod config;
pub mod logs;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mysql_sync_core::config::SyncConfig;
use mysql_sync_core::{LogEvent, LoggingService, SyncContext};

/// Directory holding the run history
///
/// `MYSQL_SYNC_DATA_DIR` overrides the platform data directory.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MYSQL_SYNC_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mysql-sync")
    }
}

pub fn get_logging_service() -> Result<LoggingService> {
    let path = get_data_dir().join("events.jsonl");
    LoggingService::new(&path, env!("CARGO_PKG_VERSION"))
        .with_context(|| format!("Failed to open event log {}", path.display()))
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    get_logging_service().ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Load and validate the config file
pub fn get_config(config_path: &Path) -> Result<SyncConfig> {
    Ok(SyncConfig::load(config_path)?)
}

/// Load config and wire up the services
pub fn get_context(config_path: &Path) -> Result<SyncContext> {
    Ok(SyncContext::new(get_config(config_path)?))
}
