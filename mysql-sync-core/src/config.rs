//! Configuration management
//!
//! One JSON file, loaded once at startup:
//! ```json
//! {
//!   "remote_host": "db.example.com",
//!   "remote_user": "deploy",
//!   "remote_db": "shop",
//!   "remote_mysql_user": "backup",
//!   "remote_mysql_password": "...",
//!   "local_mysql_user": "root",
//!   "local_mysql_password": "...",
//!   "local_db": "shop",
//!   "ssh_key_path": "~/.ssh/id_ed25519"
//! }
//! ```
//! Everything else is optional and defaults to the values below.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

pub const DEFAULT_KEEP_BACKUPS: usize = 5;
pub const DEFAULT_BACKUP_DIR: &str = "database_backups";
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Raw config file structure
#[derive(Debug, Deserialize)]
struct ConfigFile {
    remote_host: String,
    remote_user: String,
    remote_db: String,
    remote_mysql_user: String,
    remote_mysql_password: String,
    local_mysql_user: String,
    local_mysql_password: String,
    local_db: String,
    ssh_key_path: String,
    #[serde(default)]
    remote_port: Option<u16>,
    #[serde(default)]
    local_backup_dir: Option<PathBuf>,
    #[serde(default)]
    remote_scratch_dir: Option<String>,
    #[serde(default)]
    keep_backups: Option<usize>,
    #[serde(default)]
    host_key_policy: HostKeyPolicy,
    #[serde(default)]
    verify_transfer: TransferVerification,
    #[serde(default)]
    local_mysql_host: Option<String>,
    #[serde(default)]
    local_mysql_port: Option<u16>,
}

/// How unknown or changed SSH host keys are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Only hosts already in known_hosts
    Strict,
    /// Trust on first use, reject changed keys
    #[default]
    AcceptNew,
    /// No verification at all
    Insecure,
}

/// What must match before the remote dump is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferVerification {
    None,
    #[default]
    Size,
    Checksum,
}

/// MySQL account credentials
///
/// The password is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Remote (source) side
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub key_path: PathBuf,
    pub host_key_policy: HostKeyPolicy,
    pub database: String,
    pub mysql: Credentials,
    pub scratch_dir: String,
}

/// Local (destination) side
#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub database: String,
    pub mysql: Credentials,
    pub mysql_host: Option<String>,
    pub mysql_port: Option<u16>,
    pub backup_dir: PathBuf,
}

/// Immutable run configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    pub keep_backups: usize,
    pub verify_transfer: TransferVerification,
}

impl SyncConfig {
    /// Load config from a JSON file
    ///
    /// Passwords can be overridden via `MYSQL_SYNC_REMOTE_MYSQL_PASSWORD`
    /// and `MYSQL_SYNC_LOCAL_MYSQL_PASSWORD`, so they need not live on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config = Self::from_json(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse config from JSON text without validating it
    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: ConfigFile = serde_json::from_str(content)?;

        let key_path = PathBuf::from(shellexpand::tilde(&raw.ssh_key_path).into_owned());

        Ok(Self {
            remote: RemoteConfig {
                host: raw.remote_host,
                port: raw.remote_port.unwrap_or(DEFAULT_SSH_PORT),
                user: raw.remote_user,
                key_path,
                host_key_policy: raw.host_key_policy,
                database: raw.remote_db,
                mysql: Credentials::new(raw.remote_mysql_user, raw.remote_mysql_password),
                scratch_dir: raw
                    .remote_scratch_dir
                    .unwrap_or_else(|| DEFAULT_SCRATCH_DIR.to_string()),
            },
            local: LocalConfig {
                database: raw.local_db,
                mysql: Credentials::new(raw.local_mysql_user, raw.local_mysql_password),
                mysql_host: raw.local_mysql_host,
                mysql_port: raw.local_mysql_port,
                backup_dir: raw
                    .local_backup_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
            },
            keep_backups: raw.keep_backups.unwrap_or(DEFAULT_KEEP_BACKUPS),
            verify_transfer: raw.verify_transfer,
        })
    }

    /// Replace passwords from the environment when set
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(password) = lookup("MYSQL_SYNC_REMOTE_MYSQL_PASSWORD") {
            self.remote.mysql.password = password;
        }
        if let Some(password) = lookup("MYSQL_SYNC_LOCAL_MYSQL_PASSWORD") {
            self.local.mysql.password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("remote_host", self.remote.host.as_str()),
            ("remote_user", self.remote.user.as_str()),
            ("remote_db", self.remote.database.as_str()),
            ("remote_mysql_user", self.remote.mysql.user.as_str()),
            ("local_mysql_user", self.local.mysql.user.as_str()),
            ("local_db", self.local.database.as_str()),
            ("remote_scratch_dir", self.remote.scratch_dir.as_str()),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("'{}' must not be empty", key)));
            }
        }
        if self.remote.key_path.as_os_str().is_empty() {
            return Err(Error::config("'ssh_key_path' must not be empty"));
        }
        if self.remote.port == 0 {
            return Err(Error::config("'remote_port' must not be 0"));
        }
        if self.keep_backups == 0 {
            return Err(Error::config("'keep_backups' must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "remote_host": "db.example.com",
        "remote_user": "deploy",
        "remote_db": "shop",
        "remote_mysql_user": "backup",
        "remote_mysql_password": "s3cret",
        "local_mysql_user": "root",
        "local_mysql_password": "local",
        "local_db": "shop_copy",
        "ssh_key_path": "/keys/id_ed25519"
    }"#;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.remote.port, 22);
        assert_eq!(config.remote.scratch_dir, "/tmp");
        assert_eq!(config.local.backup_dir, PathBuf::from("database_backups"));
        assert_eq!(config.keep_backups, 5);
        assert_eq!(config.remote.host_key_policy, HostKeyPolicy::AcceptNew);
        assert_eq!(config.verify_transfer, TransferVerification::Size);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_key_is_reported() {
        let content = MINIMAL.replace(r#""remote_db": "shop","#, "");
        let err = SyncConfig::from_json(&content).unwrap_err();
        assert!(err.to_string().contains("remote_db"));
    }

    #[test]
    fn test_load_missing_key_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL.replace(r#""local_db": "shop_copy","#, "")).unwrap();

        match SyncConfig::load(&path) {
            Err(Error::Config(msg)) => assert!(msg.contains("local_db")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_optional_keys() {
        let content = MINIMAL.replace(
            r#""local_db": "shop_copy","#,
            r#""local_db": "shop_copy",
               "remote_port": 2222,
               "keep_backups": 3,
               "host_key_policy": "strict",
               "verify_transfer": "checksum",
               "local_mysql_host": "127.0.0.1","#,
        );
        let config = SyncConfig::from_json(&content).unwrap();
        assert_eq!(config.remote.port, 2222);
        assert_eq!(config.keep_backups, 3);
        assert_eq!(config.remote.host_key_policy, HostKeyPolicy::Strict);
        assert_eq!(config.verify_transfer, TransferVerification::Checksum);
        assert_eq!(config.local.mysql_host.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_zero_keep_is_rejected() {
        let mut config = SyncConfig::from_json(MINIMAL).unwrap();
        config.keep_backups = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides_passwords() {
        let mut config = SyncConfig::from_json(MINIMAL).unwrap();
        config.apply_env_overrides(|key| match key {
            "MYSQL_SYNC_REMOTE_MYSQL_PASSWORD" => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.remote.mysql.password(), "from-env");
        assert_eq!(config.local.mysql.password(), "local");
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let config = SyncConfig::from_json(MINIMAL).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}
