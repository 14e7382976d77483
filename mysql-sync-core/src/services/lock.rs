//! Run lock - one sync per backup directory at a time

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::{Error, Result};

pub const LOCK_FILE_NAME: &str = ".mysql-sync.lock";

/// Exclusive advisory lock on `<backup_dir>/.mysql-sync.lock`, released on drop
#[derive(Debug)]
pub struct SyncLock {
    file: File,
    path: PathBuf,
}

impl SyncLock {
    /// Take the lock without waiting; a held lock is [`Error::Locked`]
    pub fn acquire(backup_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(backup_dir)?;
        let path = backup_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file, path }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(Error::Locked(path)),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
