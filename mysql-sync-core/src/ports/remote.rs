//! Remote host port - authenticated session abstraction

use std::io;
use std::path::{Path, PathBuf};

use crate::config::{HostKeyPolicy, RemoteConfig};
use crate::domain::result::Result;
use crate::domain::{CommandOutput, RemoteCommand};

/// Where and as whom to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub key_path: PathBuf,
    pub host_key_policy: HostKeyPolicy,
}

impl From<&RemoteConfig> for RemoteTarget {
    fn from(remote: &RemoteConfig) -> Self {
        Self {
            host: remote.host.clone(),
            port: remote.port,
            user: remote.user.clone(),
            key_path: remote.key_path.clone(),
            host_key_policy: remote.host_key_policy,
        }
    }
}

impl RemoteTarget {
    /// `user@host` destination string
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// Opens authenticated sessions
pub trait RemoteConnector: Send + Sync {
    /// Connect and authenticate, failing with [`Error::Connection`](crate::Error::Connection)
    fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn RemoteSession>>;
}

/// An open, authenticated session on the remote host
///
/// Used strictly sequentially by one run. Callers must call [`close`](Self::close)
/// exactly once; [`SessionGuard`](crate::services::SessionGuard) takes care of that.
pub trait RemoteSession: Send {
    /// Run a command through the remote shell, feeding `stdin` if given,
    /// and wait for it to exit
    fn exec(&mut self, command: &RemoteCommand, stdin: Option<&[u8]>) -> io::Result<CommandOutput>;

    /// Copy a remote file to a local path
    fn download(&mut self, remote_path: &str, local_path: &Path) -> io::Result<()>;

    /// Delete a remote file
    fn remove(&mut self, remote_path: &str) -> io::Result<()>;

    /// Release the session
    fn close(&mut self) -> io::Result<()>;
}
