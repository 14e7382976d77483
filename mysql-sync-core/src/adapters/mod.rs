//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - OpenSSH control-master sessions (`ssh` exec, `sftp` get/rm) for RemoteConnector
//! - Child processes for LocalRunner

pub mod openssh;
pub mod process;

pub use openssh::{OpenSshConnector, OpenSshSession};
pub use process::ProcessRunner;
