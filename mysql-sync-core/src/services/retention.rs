//! Retention pruning of local backups
//!
//! Best effort: every problem becomes a [`PruneWarning`] and the loop moves
//! on to the next file. Nothing here can fail a run.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::DumpArtifact;

/// A non-fatal problem met while pruning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneWarning {
    pub file: String,
    pub message: String,
}

/// Outcome of one pruning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Backups left in place, oldest first
    pub kept: Vec<String>,
    /// Backups deleted, oldest first
    pub removed: Vec<String>,
    pub warnings: Vec<PruneWarning>,
}

/// Keeps the newest `keep` backups in a directory
pub struct RetentionPruner {
    backup_dir: PathBuf,
    keep: usize,
}

impl RetentionPruner {
    pub fn new(backup_dir: PathBuf, keep: usize) -> Self {
        Self { backup_dir, keep }
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Delete all but the newest `keep` backups
    ///
    /// Only `dump_<timestamp>.sql` names count as backups; their names sort
    /// chronologically, so name order is age order.
    pub fn prune(&self) -> PruneReport {
        let mut report = PruneReport::default();

        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
            Err(e) => {
                warn!("cannot list {}: {}", self.backup_dir.display(), e);
                report.warnings.push(PruneWarning {
                    file: self.backup_dir.display().to_string(),
                    message: e.to_string(),
                });
                return report;
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if DumpArtifact::parse(&name).is_some() {
                        names.push(name);
                    }
                }
                Err(e) => report.warnings.push(PruneWarning {
                    file: self.backup_dir.display().to_string(),
                    message: e.to_string(),
                }),
            }
        }
        names.sort();

        let cutoff = names.len().saturating_sub(self.keep);
        let kept = names.split_off(cutoff);

        for name in names {
            let path = self.backup_dir.join(&name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Removed old backup: {}", path.display());
                    report.removed.push(name);
                }
                Err(e) => {
                    warn!("Failed to remove old backup {}: {}", path.display(), e);
                    report.warnings.push(PruneWarning {
                        file: name,
                        message: e.to_string(),
                    });
                }
            }
        }

        report.kept = kept;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_not_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let pruner = RetentionPruner::new(dir.path().join("absent"), 5);
        assert_eq!(pruner.prune(), PruneReport::default());
    }

    #[test]
    fn test_foreign_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "notes.txt",
            ".mysql-sync.lock",
            "dump_20240101_000000.sql.part",
            "dump_20240101_000001.sql",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let report = RetentionPruner::new(dir.path().to_path_buf(), 1).prune();
        assert!(report.removed.is_empty());
        assert_eq!(report.kept, vec!["dump_20240101_000001.sql"]);
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("dump_20240101_000000.sql.part").exists());
    }
}
