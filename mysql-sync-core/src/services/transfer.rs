//! Transfer stage - download the dump, verify it, delete the remote copy

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::dump::RemoteDump;
use crate::config::TransferVerification;
use crate::domain::result::{Error, Result};
use crate::domain::DumpArtifact;
use crate::ports::RemoteSession;

/// A verified dump in the local backup directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalDump {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Hex SHA-256 of a local file
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Copies dumps from the remote scratch directory to the backup directory
pub struct Transferer {
    backup_dir: PathBuf,
    verification: TransferVerification,
}

impl Transferer {
    pub fn new(backup_dir: PathBuf, verification: TransferVerification) -> Self {
        Self {
            backup_dir,
            verification,
        }
    }

    /// Download `remote`, then delete it from the remote host
    ///
    /// The download lands in a `.part` file and only gets its final name once
    /// it passes verification. On mismatch the remote file is left in place.
    pub fn transfer(
        &self,
        session: &mut dyn RemoteSession,
        remote: &RemoteDump,
        artifact: &DumpArtifact,
    ) -> Result<LocalDump> {
        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            Error::transfer(format!(
                "cannot create backup directory {}: {}",
                self.backup_dir.display(),
                e
            ))
        })?;

        let partial = artifact.partial_path(&self.backup_dir);
        let local = artifact.local_path(&self.backup_dir);
        info!(from = %remote.path, to = %local.display(), "downloading dump");

        if let Err(e) = session.download(&remote.path, &partial) {
            discard(&partial);
            return Err(Error::transfer(format!("{}: {}", remote.path, e)));
        }

        let size_bytes = match self.verify(&partial, remote) {
            Ok(size) => size,
            Err(e) => {
                discard(&partial);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&partial, &local) {
            discard(&partial);
            return Err(Error::transfer(format!(
                "cannot move download into {}: {}",
                local.display(),
                e
            )));
        }

        info!(path = %remote.path, "removing remote dump file");
        session.remove(&remote.path).map_err(|e| {
            Error::transfer(format!(
                "downloaded to {} but could not remove remote {}: {}",
                local.display(),
                remote.path,
                e
            ))
        })?;

        Ok(LocalDump {
            path: local,
            size_bytes,
        })
    }

    fn verify(&self, downloaded: &Path, remote: &RemoteDump) -> Result<u64> {
        let size = fs::metadata(downloaded)
            .map_err(|e| Error::transfer(format!("downloaded file missing: {}", e)))?
            .len();

        if self.verification == TransferVerification::None {
            return Ok(size);
        }

        if size != remote.size_bytes {
            return Err(Error::transfer(format!(
                "size mismatch: remote {} bytes, local {} bytes; remote file kept at {}",
                remote.size_bytes, size, remote.path
            )));
        }

        if self.verification == TransferVerification::Checksum {
            let expected = remote.sha256.as_deref().ok_or_else(|| {
                Error::transfer(format!("no remote checksum for {}", remote.path))
            })?;
            let actual = file_sha256(downloaded)
                .map_err(|e| Error::transfer(format!("cannot checksum download: {}", e)))?;
            if actual != expected {
                return Err(Error::transfer(format!(
                    "checksum mismatch: remote {}, local {}; remote file kept at {}",
                    expected, actual, remote.path
                )));
            }
        }

        Ok(size)
    }
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("could not remove partial download {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.sql");
        fs::write(&path, "abc").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
