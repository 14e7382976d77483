//! Service layer - pipeline stages and their orchestration
//!
//! One service per stage, plus the orchestrator and local backup
//! management built on top of them.

mod backup;
mod dump;
pub mod lock;
pub mod logging;
pub mod mysql;
mod restore;
mod retention;
mod session;
mod sync;
mod transfer;

pub use backup::BackupService;
pub use dump::{RemoteDump, RemoteDumper};
pub use lock::SyncLock;
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use restore::LocalRestorer;
pub use retention::{PruneReport, PruneWarning, RetentionPruner};
pub use session::SessionGuard;
pub use sync::{NoopObserver, SyncObserver, SyncOptions, SyncReport, SyncService};
pub use transfer::{file_sha256, LocalDump, Transferer};
