//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external dependencies.

mod artifact;
mod backup;
pub mod command;
pub mod result;
mod stage;

pub use artifact::DumpArtifact;
pub use backup::BackupMetadata;
pub use command::{CommandOutput, CommandSpec, RemoteCommand};
pub use stage::SyncStage;
