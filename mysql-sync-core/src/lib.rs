//! mysql-sync core - mirror a remote MySQL database onto the local machine
//!
//! Hexagonal layout:
//!
//! - **domain**: artifacts, commands, the run state machine, errors
//! - **ports**: traits for the remote host and local programs
//! - **services**: pipeline stages and their orchestration
//! - **adapters**: OpenSSH and child-process implementations of the ports

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::sync::Arc;

use adapters::{OpenSshConnector, ProcessRunner};
use config::SyncConfig;
use ports::{LocalRunner, RemoteConnector};
use services::{BackupService, LocalRestorer, SyncService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{BackupMetadata, DumpArtifact, SyncStage};
pub use services::{LogEvent, LoggingService, SyncOptions, SyncReport};

/// Main context for mysql-sync operations
///
/// Holds the loaded configuration and the services wired to it.
pub struct SyncContext {
    pub config: Arc<SyncConfig>,
    pub sync_service: SyncService,
    pub backup_service: BackupService,
}

impl SyncContext {
    /// Wire the services with the OpenSSH and local-process adapters
    pub fn new(config: SyncConfig) -> Self {
        Self::with_adapters(
            config,
            Arc::new(OpenSshConnector::new()),
            Arc::new(ProcessRunner::new()),
        )
    }

    /// Wire the services with caller-supplied adapters
    pub fn with_adapters(
        config: SyncConfig,
        connector: Arc<dyn RemoteConnector>,
        runner: Arc<dyn LocalRunner>,
    ) -> Self {
        let config = Arc::new(config);
        let sync_service = SyncService::new(Arc::clone(&config), connector, Arc::clone(&runner));
        let backup_service = BackupService::new(
            config.local.backup_dir.clone(),
            LocalRestorer::new(&config.local, runner),
        );

        Self {
            config,
            sync_service,
            backup_service,
        }
    }
}
