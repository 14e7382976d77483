//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The pipeline
//! services depend only on these traits, not on ssh, sftp or mysql binaries.

mod local;
mod remote;

pub use local::LocalRunner;
pub use remote::{RemoteConnector, RemoteSession, RemoteTarget};
