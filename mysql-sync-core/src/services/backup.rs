//! Backup service - local backup management
//!
//! Lists the dumps kept in the backup directory, re-imports one on demand
//! and runs the retention policy outside of a sync.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use super::lock::SyncLock;
use super::restore::LocalRestorer;
use super::retention::{PruneReport, RetentionPruner};
use crate::domain::result::{Error, Result};
use crate::domain::{BackupMetadata, DumpArtifact};

/// Backup service for the local backup directory
pub struct BackupService {
    backup_dir: PathBuf,
    restorer: LocalRestorer,
}

impl BackupService {
    pub fn new(backup_dir: PathBuf, restorer: LocalRestorer) -> Self {
        Self {
            backup_dir,
            restorer,
        }
    }

    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// List all backups, newest first
    pub fn list(&self) -> Result<Vec<BackupMetadata>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(artifact) = DumpArtifact::parse(&name) else {
                continue;
            };

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            backups.push(BackupMetadata::new(name, artifact.created_at(), metadata.len()));
        }

        backups.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(backups)
    }

    /// Look up one backup by file name
    pub fn get(&self, name: &str) -> Result<BackupMetadata> {
        let artifact = DumpArtifact::parse(name).ok_or_else(|| Error::not_found(name))?;
        let path = artifact.local_path(&self.backup_dir);
        let metadata = fs::metadata(&path).map_err(|_| Error::not_found(name))?;
        if !metadata.is_file() {
            return Err(Error::not_found(name));
        }
        Ok(BackupMetadata::new(name, artifact.created_at(), metadata.len()))
    }

    /// Import an existing backup into the local database
    ///
    /// Holds the run lock so a sync cannot write the directory meanwhile.
    pub fn restore(&self, name: &str) -> Result<BackupMetadata> {
        let _lock = SyncLock::acquire(&self.backup_dir)?;
        let backup = self.get(name)?;
        self.restorer.restore(&self.backup_dir.join(&backup.name))?;
        info!(backup = %backup.name, database = self.restorer.database(), "backup restored");
        Ok(backup)
    }

    /// Apply the retention policy now
    pub fn prune(&self, keep: usize) -> Result<PruneReport> {
        if keep == 0 {
            return Err(Error::config("keep must be at least 1"));
        }
        let _lock = SyncLock::acquire(&self.backup_dir)?;
        Ok(RetentionPruner::new(self.backup_dir.clone(), keep).prune())
    }
}
