//! Sync service - the connect → dump → transfer → restore → prune pipeline

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::dump::{RemoteDump, RemoteDumper};
use super::lock::SyncLock;
use super::restore::LocalRestorer;
use super::retention::{PruneReport, RetentionPruner};
use super::session::SessionGuard;
use super::transfer::{LocalDump, Transferer};
use crate::config::SyncConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{DumpArtifact, SyncStage};
use crate::ports::{LocalRunner, RemoteConnector, RemoteTarget};

/// Receives stage transitions as they happen
pub trait SyncObserver {
    fn stage_changed(&self, _stage: SyncStage) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// Per-run switches
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Download only, leave the local database alone
    pub skip_restore: bool,
    /// Override the configured retention count; 0 is rejected
    pub keep_backups: Option<usize>,
}

/// What a successful run did
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub artifact: String,
    pub remote: RemoteDump,
    pub local: LocalDump,
    /// Local database restored into, `None` with `skip_restore`
    pub restored_database: Option<String>,
    pub prune: PruneReport,
    /// Every stage entered, in order
    pub stages: Vec<SyncStage>,
    pub final_stage: SyncStage,
    /// Set when the session could not be closed cleanly
    pub close_warning: Option<String>,
}

struct StageTracker<'a> {
    stages: Vec<SyncStage>,
    observer: &'a dyn SyncObserver,
}

impl<'a> StageTracker<'a> {
    fn new(observer: &'a dyn SyncObserver) -> Self {
        let mut tracker = Self {
            stages: Vec::new(),
            observer,
        };
        tracker.enter(SyncStage::Idle);
        tracker
    }

    fn enter(&mut self, stage: SyncStage) {
        info!(stage = %stage, "sync stage");
        self.stages.push(stage);
        self.observer.stage_changed(stage);
    }

    /// Move to the next stage of the success path
    fn advance(&mut self) {
        let next = self.current().next();
        self.enter(next);
    }

    fn current(&self) -> SyncStage {
        self.stages.last().copied().unwrap_or(SyncStage::Idle)
    }

    fn failed(&mut self, err: Error) -> Error {
        debug_assert!(self.current().can_fail(), "{} cannot fail", self.current());
        error!(stage = %self.current(), "{}", err);
        self.enter(SyncStage::Failed);
        err
    }
}

/// Orchestrates one sync run
pub struct SyncService {
    config: Arc<SyncConfig>,
    connector: Arc<dyn RemoteConnector>,
    dumper: RemoteDumper,
    transferer: Transferer,
    restorer: LocalRestorer,
}

impl SyncService {
    pub fn new(
        config: Arc<SyncConfig>,
        connector: Arc<dyn RemoteConnector>,
        runner: Arc<dyn LocalRunner>,
    ) -> Self {
        let dumper = RemoteDumper::new(&config.remote, config.verify_transfer);
        let transferer = Transferer::new(config.local.backup_dir.clone(), config.verify_transfer);
        let restorer = LocalRestorer::new(&config.local, runner);
        Self {
            config,
            connector,
            dumper,
            transferer,
            restorer,
        }
    }

    /// Run the pipeline, naming the dump after the current local time
    pub fn run(&self, options: &SyncOptions, observer: &dyn SyncObserver) -> Result<SyncReport> {
        self.run_at(Local::now().naive_local(), options, observer)
    }

    /// Run the pipeline with an explicit dump timestamp
    pub fn run_at(
        &self,
        now: NaiveDateTime,
        options: &SyncOptions,
        observer: &dyn SyncObserver,
    ) -> Result<SyncReport> {
        let keep = options.keep_backups.unwrap_or(self.config.keep_backups);
        if keep == 0 {
            return Err(Error::config("keep must be at least 1"));
        }

        let backup_dir = &self.config.local.backup_dir;
        let lock = SyncLock::acquire(backup_dir)?;
        debug!(lock = %lock.path().display(), "run lock acquired");

        let artifact = DumpArtifact::new(now);
        let mut tracker = StageTracker::new(observer);
        info!(
            host = %self.config.remote.host,
            database = %self.config.remote.database,
            artifact = artifact.file_name(),
            "Starting database synchronization"
        );

        tracker.advance();
        let target = RemoteTarget::from(&self.config.remote);
        let session = self
            .connector
            .connect(&target)
            .map_err(|e| tracker.failed(e))?;

        let mut guard = SessionGuard::new(session);
        let outcome = self.run_remote_stages(&mut guard, &artifact, options, &mut tracker);
        let closed = guard.close();

        let (remote, local, restored_database) = outcome.map_err(|e| tracker.failed(e))?;

        let close_warning = closed.err().map(|e| {
            warn!("failed to close remote session: {}", e);
            e.to_string()
        });

        tracker.enter(SyncStage::Pruning);
        let pruner = RetentionPruner::new(backup_dir.clone(), keep);
        info!(keep = pruner.keep(), "pruning old backups");
        let prune = pruner.prune();

        tracker.advance();
        info!("Database synchronization completed successfully");

        Ok(SyncReport {
            artifact: artifact.file_name().to_string(),
            remote,
            local,
            restored_database,
            prune,
            final_stage: tracker.current(),
            stages: tracker.stages,
            close_warning,
        })
    }

    fn run_remote_stages(
        &self,
        guard: &mut SessionGuard,
        artifact: &DumpArtifact,
        options: &SyncOptions,
        tracker: &mut StageTracker<'_>,
    ) -> Result<(RemoteDump, LocalDump, Option<String>)> {
        tracker.advance();
        let remote = self.dumper.dump(guard.session(), artifact)?;

        tracker.advance();
        let local = self.transferer.transfer(guard.session(), &remote, artifact)?;

        let restored = if options.skip_restore {
            info!("skipping restore");
            None
        } else {
            tracker.advance();
            self.restorer.restore(&local.path)?;
            Some(self.restorer.database().to_string())
        };

        Ok((remote, local, restored))
    }
}
