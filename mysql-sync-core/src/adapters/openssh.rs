//! OpenSSH adapter
//!
//! A session is an OpenSSH control master (`ssh -M -f -N`) whose socket lives
//! in a private temporary directory. Commands (`ssh`) and file operations
//! (`sftp -b -`) multiplex over that socket, so the key is used once, at
//! connect time. Closing sends `ssh -O exit` to the master.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::process::run_with_input;
use crate::config::HostKeyPolicy;
use crate::domain::result::{Error, Result};
use crate::domain::{CommandOutput, RemoteCommand};
use crate::ports::{RemoteConnector, RemoteSession, RemoteTarget};

const SOCKET_NAME: &str = "control.sock";
const MASTER_LOG: &str = "master.log";

/// Connects by starting an OpenSSH control master
#[derive(Debug, Clone)]
pub struct OpenSshConnector {
    ssh_program: String,
    sftp_program: String,
}

impl Default for OpenSshConnector {
    fn default() -> Self {
        Self {
            ssh_program: "ssh".to_string(),
            sftp_program: "sftp".to_string(),
        }
    }
}

impl OpenSshConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use specific `ssh` and `sftp` binaries
    pub fn with_programs(ssh: impl Into<String>, sftp: impl Into<String>) -> Self {
        Self {
            ssh_program: ssh.into(),
            sftp_program: sftp.into(),
        }
    }
}

/// `-o` options for the host key policy
fn host_key_options(policy: HostKeyPolicy) -> Vec<String> {
    match policy {
        HostKeyPolicy::Strict => vec!["StrictHostKeyChecking=yes".to_string()],
        HostKeyPolicy::AcceptNew => vec!["StrictHostKeyChecking=accept-new".to_string()],
        HostKeyPolicy::Insecure => vec![
            "StrictHostKeyChecking=no".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
        ],
    }
}

/// Arguments that start the control master
fn master_args(target: &RemoteTarget, socket: &Path, log: &Path) -> Vec<String> {
    let mut args = vec![
        "-M".to_string(),
        "-S".to_string(),
        socket.display().to_string(),
        "-f".to_string(),
        "-N".to_string(),
        "-E".to_string(),
        log.display().to_string(),
        "-i".to_string(),
        target.key_path.display().to_string(),
        "-p".to_string(),
        target.port.to_string(),
    ];
    let options = ["ControlPersist=yes", "BatchMode=yes", "IdentitiesOnly=yes"]
        .iter()
        .map(|o| o.to_string())
        .chain(host_key_options(target.host_key_policy));
    for option in options {
        args.push("-o".to_string());
        args.push(option);
    }
    args.push(target.destination());
    args
}

/// Quote a path for an sftp batch line
fn sftp_quote(path: &str) -> String {
    format!("\"{}\"", path.replace('\\', "\\\\").replace('"', "\\\""))
}

fn command_failed(what: &str, output: &CommandOutput) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("{} failed with {}", what, output.failure_summary()),
    )
}

impl RemoteConnector for OpenSshConnector {
    fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn RemoteSession>> {
        if !target.key_path.exists() {
            return Err(Error::connection(format!(
                "SSH key not found: {}",
                target.key_path.display()
            )));
        }

        let control_dir = tempfile::Builder::new()
            .prefix("mysql-sync-")
            .tempdir()
            .map_err(|e| Error::connection(format!("cannot create control directory: {}", e)))?;
        let socket = control_dir.path().join(SOCKET_NAME);
        let log = control_dir.path().join(MASTER_LOG);

        debug!(destination = %target.destination(), port = target.port, "starting ssh control master");

        // The master forks into the background and keeps any inherited pipe
        // open, so its diagnostics go to a log file (-E) instead of a pipe.
        let status = Command::new(&self.ssh_program)
            .args(master_args(target, &socket, &log))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::connection(format!("cannot run {}: {}", self.ssh_program, e)))?;

        if !status.success() {
            let detail = fs::read_to_string(&log).unwrap_or_default();
            let detail = detail.trim();
            return Err(Error::connection(if detail.is_empty() {
                format!("ssh exited with {}", status)
            } else {
                detail.lines().collect::<Vec<_>>().join(" ")
            }));
        }

        Ok(Box::new(OpenSshSession {
            target: target.clone(),
            ssh_program: self.ssh_program.clone(),
            sftp_program: self.sftp_program.clone(),
            socket,
            closed: false,
            _control_dir: control_dir,
        }))
    }
}

/// A live control-master session
#[derive(Debug)]
pub struct OpenSshSession {
    target: RemoteTarget,
    ssh_program: String,
    sftp_program: String,
    socket: PathBuf,
    closed: bool,
    // Removed (with the socket) when the session is dropped
    _control_dir: TempDir,
}

impl OpenSshSession {
    fn ssh(&self) -> Command {
        let mut cmd = Command::new(&self.ssh_program);
        cmd.arg("-S")
            .arg(&self.socket)
            .args(["-o", "ControlMaster=no", "-o", "BatchMode=yes"])
            .arg("-p")
            .arg(self.target.port.to_string());
        cmd
    }

    fn sftp_batch(&self, batch: &str) -> io::Result<CommandOutput> {
        let mut cmd = Command::new(&self.sftp_program);
        cmd.args(["-b", "-"])
            .arg("-o")
            .arg(format!("ControlPath={}", self.socket.display()))
            .args(["-o", "ControlMaster=no", "-o", "BatchMode=yes"])
            .arg("-P")
            .arg(self.target.port.to_string())
            .arg(self.target.destination());
        run_with_input(&mut cmd, Some(batch.as_bytes()))
    }
}

impl RemoteSession for OpenSshSession {
    fn exec(&mut self, command: &RemoteCommand, stdin: Option<&[u8]>) -> io::Result<CommandOutput> {
        debug!(program = %command.command().program, "executing remote command");
        let mut cmd = self.ssh();
        cmd.arg(self.target.destination()).arg(command.shell_line());
        run_with_input(&mut cmd, stdin)
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> io::Result<()> {
        let batch = format!(
            "get {} {}\n",
            sftp_quote(remote_path),
            sftp_quote(&local_path.display().to_string())
        );
        let output = self.sftp_batch(&batch)?;
        if !output.success() {
            return Err(command_failed("sftp get", &output));
        }
        Ok(())
    }

    fn remove(&mut self, remote_path: &str) -> io::Result<()> {
        let output = self.sftp_batch(&format!("rm {}\n", sftp_quote(remote_path)))?;
        if !output.success() {
            return Err(command_failed("sftp rm", &output));
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut cmd = self.ssh();
        cmd.args(["-O", "exit"]).arg(self.target.destination());
        let output = run_with_input(&mut cmd, None)?;
        if !output.success() {
            return Err(command_failed("ssh -O exit", &output));
        }
        Ok(())
    }
}

impl Drop for OpenSshSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to stop ssh control master: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(policy: HostKeyPolicy) -> RemoteTarget {
        RemoteTarget {
            host: "db.example.com".to_string(),
            port: 2222,
            user: "deploy".to_string(),
            key_path: PathBuf::from("/keys/id_ed25519"),
            host_key_policy: policy,
        }
    }

    #[test]
    fn test_master_args() {
        let args = master_args(
            &target(HostKeyPolicy::AcceptNew),
            Path::new("/run/x/control.sock"),
            Path::new("/run/x/master.log"),
        );
        assert_eq!(&args[..3], &["-M", "-S", "/run/x/control.sock"]);
        assert!(args.windows(2).any(|w| w == ["-i", "/keys/id_ed25519"]));
        assert!(args.windows(2).any(|w| w == ["-p", "2222"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["-o", "StrictHostKeyChecking=accept-new"]));
        assert_eq!(args.last().unwrap(), "deploy@db.example.com");
    }

    #[test]
    fn test_insecure_policy_skips_known_hosts() {
        let options = host_key_options(HostKeyPolicy::Insecure);
        assert!(options.contains(&"UserKnownHostsFile=/dev/null".to_string()));
        assert_eq!(
            host_key_options(HostKeyPolicy::Strict),
            vec!["StrictHostKeyChecking=yes".to_string()]
        );
    }

    #[test]
    fn test_sftp_quote() {
        assert_eq!(sftp_quote("/tmp/dump.sql"), "\"/tmp/dump.sql\"");
        assert_eq!(sftp_quote("a \"b\"\\c"), "\"a \\\"b\\\"\\\\c\"");
    }

    #[test]
    fn test_connect_rejects_missing_key() {
        let connector = OpenSshConnector::new();
        let mut t = target(HostKeyPolicy::Strict);
        t.key_path = PathBuf::from("/definitely/not/here/id_rsa");
        match connector.connect(&t) {
            Err(Error::Connection(msg)) => assert!(msg.contains("SSH key not found")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("connect should fail without a key"),
        }
    }
}
