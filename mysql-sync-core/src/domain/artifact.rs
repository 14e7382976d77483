//! Dump artifact naming

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

const PREFIX: &str = "dump_";
const SUFFIX: &str = ".sql";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A dump produced by one run, named `dump_<YYYYMMDD_HHMMSS>.sql`
///
/// The same name is used in the remote scratch directory and in the local
/// backup directory, so the timestamp is the artifact's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpArtifact {
    created_at: NaiveDateTime,
    file_name: String,
}

impl DumpArtifact {
    pub fn new(created_at: NaiveDateTime) -> Self {
        let file_name = format!("{}{}{}", PREFIX, created_at.format(TIMESTAMP_FORMAT), SUFFIX);
        Self {
            created_at,
            file_name,
        }
    }

    /// Parse an artifact from a file name, rejecting anything not produced by [`DumpArtifact::new`]
    pub fn parse(file_name: &str) -> Option<Self> {
        let ts = file_name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        // %Y accepts any digit count, so pin the width first
        if ts.len() != 15 {
            return None;
        }
        let created_at = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            created_at,
            file_name: file_name.to_string(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Path of this artifact inside a remote (POSIX) directory
    pub fn remote_path(&self, scratch_dir: &str) -> String {
        let dir = scratch_dir.trim_end_matches('/');
        format!("{}/{}", dir, self.file_name)
    }

    /// Path of this artifact inside the local backup directory
    pub fn local_path(&self, backup_dir: &Path) -> PathBuf {
        backup_dir.join(&self.file_name)
    }

    /// Temporary download path, renamed to [`local_path`](Self::local_path) once verified
    pub fn partial_path(&self, backup_dir: &Path) -> PathBuf {
        backup_dir.join(format!("{}.part", self.file_name))
    }
}
