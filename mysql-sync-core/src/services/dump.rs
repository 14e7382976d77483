//! Remote dump stage

use serde::Serialize;
use tracing::{debug, info, warn};

use super::mysql;
use crate::config::{Credentials, RemoteConfig, TransferVerification};
use crate::domain::result::{Error, Result};
use crate::domain::DumpArtifact;
use crate::ports::RemoteSession;

/// A finished dump sitting in the remote scratch directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteDump {
    pub path: String,
    pub size_bytes: u64,
    /// Hex SHA-256, only measured for checksum verification
    pub sha256: Option<String>,
}

/// Runs mysqldump on the remote host
pub struct RemoteDumper {
    database: String,
    credentials: Credentials,
    scratch_dir: String,
    verification: TransferVerification,
}

impl RemoteDumper {
    pub fn new(remote: &RemoteConfig, verification: TransferVerification) -> Self {
        Self {
            database: remote.database.clone(),
            credentials: remote.mysql.clone(),
            scratch_dir: remote.scratch_dir.clone(),
            verification,
        }
    }

    /// Dump the database into the scratch directory and measure the result
    pub fn dump(&self, session: &mut dyn RemoteSession, artifact: &DumpArtifact) -> Result<RemoteDump> {
        let path = artifact.remote_path(&self.scratch_dir);
        info!(database = %self.database, path = %path, "creating remote dump");

        let command = mysql::dump_command(&self.database, &path);
        let option_file = mysql::client_option_file(&self.credentials, None, None);
        let output = session
            .exec(&command, Some(option_file.as_bytes()))
            .map_err(|e| Error::dump(e.to_string()))?;
        if !output.success() {
            // The shell creates the output file before mysqldump starts
            if let Err(e) = session.remove(&path) {
                warn!("could not remove partial remote dump {}: {}", path, e);
            }
            return Err(Error::dump(format!(
                "mysqldump {}",
                output.failure_summary()
            )));
        }

        let size_bytes = self.remote_size(session, &path)?;
        let sha256 = match self.verification {
            TransferVerification::Checksum => Some(self.remote_checksum(session, &path)?),
            _ => None,
        };
        debug!(size_bytes, "remote dump measured");

        Ok(RemoteDump {
            path,
            size_bytes,
            sha256,
        })
    }

    fn remote_size(&self, session: &mut dyn RemoteSession, path: &str) -> Result<u64> {
        let output = session
            .exec(&mysql::size_command(path), None)
            .map_err(|e| Error::dump(e.to_string()))?;
        if !output.success() {
            return Err(Error::dump(format!(
                "cannot measure {}: {}",
                path,
                output.failure_summary()
            )));
        }
        output
            .stdout_text()
            .parse()
            .map_err(|_| Error::dump(format!("unexpected size output: {:?}", output.stdout_text())))
    }

    fn remote_checksum(&self, session: &mut dyn RemoteSession, path: &str) -> Result<String> {
        let output = session
            .exec(&mysql::checksum_command(path), None)
            .map_err(|e| Error::dump(e.to_string()))?;
        if !output.success() {
            return Err(Error::dump(format!(
                "cannot checksum {}: {}",
                path,
                output.failure_summary()
            )));
        }
        // "<hex>  <path>"
        let text = output.stdout_text();
        match text.split_whitespace().next() {
            Some(digest) if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(digest.to_ascii_lowercase())
            }
            _ => Err(Error::dump(format!("unexpected sha256sum output: {:?}", text))),
        }
    }
}
