//! Result and error types for the core library

use std::path::PathBuf;

use thiserror::Error;

use super::stage::SyncStage;

/// Core library error type
///
/// The pipeline variants (`Connection`, `Dump`, `Transfer`, `Restore`) are
/// fatal for a run. Prune problems never show up here: they are collected
/// as [`PruneWarning`](crate::services::PruneWarning)s instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to remote server: {0}")]
    Connection(String),

    #[error("Failed to create remote dump: {0}")]
    Dump(String),

    #[error("Failed to download dump: {0}")]
    Transfer(String),

    #[error("Failed to restore local database: {0}")]
    Restore(String),

    #[error("Another sync is already running (lock held on {})", .0.display())]
    Locked(PathBuf),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a dump error
    pub fn dump(msg: impl Into<String>) -> Self {
        Self::Dump(msg.into())
    }

    /// Create a transfer error
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    /// Create a restore error
    pub fn restore(msg: impl Into<String>) -> Self {
        Self::Restore(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// The pipeline stage this error aborted, if it came from one
    pub fn failed_stage(&self) -> Option<SyncStage> {
        match self {
            Error::Connection(_) => Some(SyncStage::Connecting),
            Error::Dump(_) => Some(SyncStage::Dumping),
            Error::Transfer(_) => Some(SyncStage::Transferring),
            Error::Restore(_) => Some(SyncStage::Restoring),
            _ => None,
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_stage_mapping() {
        assert_eq!(
            Error::connection("refused").failed_stage(),
            Some(SyncStage::Connecting)
        );
        assert_eq!(Error::dump("exit 2").failed_stage(), Some(SyncStage::Dumping));
        assert_eq!(
            Error::transfer("short read").failed_stage(),
            Some(SyncStage::Transferring)
        );
        assert_eq!(
            Error::restore("access denied").failed_stage(),
            Some(SyncStage::Restoring)
        );
        assert_eq!(Error::config("missing key").failed_stage(), None);
    }

    #[test]
    fn test_messages_are_single_line_diagnostics() {
        let err = Error::dump("mysqldump: Got error: 1045");
        assert_eq!(
            err.to_string(),
            "Failed to create remote dump: mysqldump: Got error: 1045"
        );
    }
}
