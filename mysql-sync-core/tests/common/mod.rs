//! Shared test doubles for the port traits
//!
//! The remote host and the local mysql client are simulated; the backup
//! directory is a real temporary directory.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use mysql_sync_core::config::SyncConfig;
use mysql_sync_core::domain::{CommandOutput, CommandSpec, RemoteCommand};
use mysql_sync_core::ports::{LocalRunner, RemoteConnector, RemoteSession, RemoteTarget};
use mysql_sync_core::{DumpArtifact, Error, Result};

pub const REMOTE_PASSWORD: &str = "remote-s3cret";
pub const LOCAL_PASSWORD: &str = "local-s3cret";
pub const DUMP_CONTENT: &[u8] = b"DROP DATABASE IF EXISTS `shop`;\nCREATE DATABASE `shop`;\n";

/// Everything the doubles saw, in order
#[derive(Debug, Default)]
pub struct Calls {
    pub connects: usize,
    pub closes: usize,
    pub execs: Vec<String>,
    pub exec_stdin: Vec<String>,
    pub downloads: Vec<(String, PathBuf)>,
    pub removes: Vec<String>,
    pub restores: Vec<RestoreCall>,
}

#[derive(Debug, Clone)]
pub struct RestoreCall {
    pub command: CommandSpec,
    pub input: PathBuf,
    pub option_file: String,
}

pub type SharedCalls = Arc<Mutex<Calls>>;

/// How the simulated world behaves
#[derive(Debug, Clone)]
pub struct Script {
    pub connect_fails: bool,
    pub dump_status: i32,
    pub dump_stderr: String,
    pub download_fails: bool,
    pub truncate_download: bool,
    /// Same length as the remote dump, different bytes
    pub corrupt_download: bool,
    pub remove_fails: bool,
    pub restore_status: i32,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connect_fails: false,
            dump_status: 0,
            dump_stderr: String::new(),
            download_fails: false,
            truncate_download: false,
            corrupt_download: false,
            remove_fails: false,
            restore_status: 0,
        }
    }
}

pub struct MockConnector {
    pub calls: SharedCalls,
    pub script: Script,
}

impl RemoteConnector for MockConnector {
    fn connect(&self, _target: &RemoteTarget) -> Result<Box<dyn RemoteSession>> {
        self.calls.lock().unwrap().connects += 1;
        if self.script.connect_fails {
            return Err(Error::connection("Connection refused"));
        }
        Ok(Box::new(MockSession {
            calls: Arc::clone(&self.calls),
            script: self.script.clone(),
        }))
    }
}

pub struct MockSession {
    calls: SharedCalls,
    script: Script,
}

fn output(status: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> CommandOutput {
    CommandOutput {
        status: Some(status),
        stdout: stdout.into(),
        stderr: stderr.into(),
    }
}

impl RemoteSession for MockSession {
    fn exec(&mut self, command: &RemoteCommand, stdin: Option<&[u8]>) -> io::Result<CommandOutput> {
        let line = command.shell_line();
        {
            let mut calls = self.calls.lock().unwrap();
            calls.execs.push(line.clone());
            calls
                .exec_stdin
                .push(String::from_utf8_lossy(stdin.unwrap_or_default()).into_owned());
        }

        let program = command.command().program.as_str();
        Ok(match program {
            "mysqldump" => output(self.script.dump_status, "", self.script.dump_stderr.clone()),
            "wc" => output(0, format!("{}\n", DUMP_CONTENT.len()), ""),
            "sha256sum" => {
                let digest = hex::encode(Sha256::digest(DUMP_CONTENT));
                output(0, format!("{}  {}\n", digest, command.command().args[0]), "")
            }
            _ => output(127, "", "command not found"),
        })
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> io::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .downloads
            .push((remote_path.to_string(), local_path.to_path_buf()));
        if self.script.download_fails {
            return Err(io::Error::new(io::ErrorKind::Other, "connection lost"));
        }
        let mut content = if self.script.truncate_download {
            DUMP_CONTENT[..10].to_vec()
        } else {
            DUMP_CONTENT.to_vec()
        };
        if self.script.corrupt_download {
            content[0] ^= 0x20;
        }
        fs::write(local_path, content)
    }

    fn remove(&mut self, remote_path: &str) -> io::Result<()> {
        self.calls.lock().unwrap().removes.push(remote_path.to_string());
        if self.script.remove_fails {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.calls.lock().unwrap().closes += 1;
        Ok(())
    }
}

pub struct MockRunner {
    pub calls: SharedCalls,
    pub status: i32,
}

impl LocalRunner for MockRunner {
    fn run_with_input_file(&self, command: &CommandSpec, stdin_file: &Path) -> io::Result<CommandOutput> {
        // The option file only exists while the restore runs
        let option_file = command
            .args
            .iter()
            .find_map(|a| a.strip_prefix("--defaults-extra-file="))
            .map(|p| fs::read_to_string(p).unwrap_or_default())
            .unwrap_or_default();
        self.calls.lock().unwrap().restores.push(RestoreCall {
            command: command.clone(),
            input: stdin_file.to_path_buf(),
            option_file,
        });
        let stderr = if self.status == 0 {
            ""
        } else {
            "ERROR 1045 (28000): Access denied"
        };
        Ok(output(self.status, "", stderr))
    }
}

/// A valid config whose backup directory is `backup_dir`
pub fn test_config(backup_dir: &Path) -> SyncConfig {
    let json = serde_json::json!({
        "remote_host": "db.example.com",
        "remote_user": "deploy",
        "remote_db": "shop",
        "remote_mysql_user": "backup",
        "remote_mysql_password": REMOTE_PASSWORD,
        "local_mysql_user": "root",
        "local_mysql_password": LOCAL_PASSWORD,
        "local_db": "shop_local",
        "ssh_key_path": "/keys/id_ed25519",
        "local_backup_dir": backup_dir,
        "remote_scratch_dir": "/tmp/",
    });
    SyncConfig::from_json(&json.to_string()).unwrap()
}

/// Create empty backup files for the given timestamps (`YYYYMMDD_HHMMSS`)
pub fn seed_backups(dir: &Path, stamps: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for stamp in stamps {
        fs::write(dir.join(format!("dump_{}.sql", stamp)), "--").unwrap();
    }
}

/// Backup file names in `dir`, sorted
pub fn backup_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| DumpArtifact::parse(n).is_some())
        .collect();
    names.sort();
    names
}
