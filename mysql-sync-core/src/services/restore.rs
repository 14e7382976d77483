//! Local restore stage
//!
//! Destructive: the dump carries DROP/CREATE statements, so the local
//! database is replaced by the remote one.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::mysql;
use crate::config::{Credentials, LocalConfig};
use crate::domain::result::{Error, Result};
use crate::ports::LocalRunner;

/// Feeds a dump file into the local `mysql` client
pub struct LocalRestorer {
    database: String,
    credentials: Credentials,
    host: Option<String>,
    port: Option<u16>,
    runner: Arc<dyn LocalRunner>,
}

impl LocalRestorer {
    pub fn new(local: &LocalConfig, runner: Arc<dyn LocalRunner>) -> Self {
        Self {
            database: local.database.clone(),
            credentials: local.mysql.clone(),
            host: local.mysql_host.clone(),
            port: local.mysql_port,
            runner,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Import `dump_path` and wait for the client to exit
    pub fn restore(&self, dump_path: &Path) -> Result<()> {
        info!(database = %self.database, dump = %dump_path.display(), "restoring dump to local database");

        // Private (0600) option file, deleted when it goes out of scope
        let mut option_file = tempfile::Builder::new()
            .prefix("mysql-sync-")
            .suffix(".cnf")
            .tempfile()
            .map_err(|e| Error::restore(format!("cannot create option file: {}", e)))?;
        let content = mysql::client_option_file(&self.credentials, self.host.as_deref(), self.port);
        option_file
            .write_all(content.as_bytes())
            .and_then(|_| option_file.flush())
            .map_err(|e| Error::restore(format!("cannot write option file: {}", e)))?;

        let command = mysql::restore_command(&self.database, option_file.path());
        let output = self
            .runner
            .run_with_input_file(&command, dump_path)
            .map_err(|e| Error::restore(format!("cannot run {}: {}", command.program, e)))?;

        if !output.success() {
            return Err(Error::restore(format!("mysql {}", output.failure_summary())));
        }

        info!(database = %self.database, "local database restored");
        Ok(())
    }
}
