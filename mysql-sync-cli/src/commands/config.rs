//! Config command - validate the config file without touching any server

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_config;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Load and validate the config, then print it with passwords hidden
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(config_path: &Path, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Check { json } => {
            let config = get_config(config_path)?;
            let remote = &config.remote;
            let local = &config.local;
            let local_server = match (&local.mysql_host, local.mysql_port) {
                (Some(host), Some(port)) => format!("{}:{}", host, port),
                (Some(host), None) => host.clone(),
                (None, Some(port)) => format!("localhost:{}", port),
                (None, None) => "client default".to_string(),
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "config_path": config_path.to_string_lossy(),
                        "remote": {
                            "host": remote.host,
                            "port": remote.port,
                            "user": remote.user,
                            "key_path": remote.key_path.to_string_lossy(),
                            "host_key_policy": remote.host_key_policy,
                            "database": remote.database,
                            "mysql_user": remote.mysql.user,
                            "scratch_dir": remote.scratch_dir,
                        },
                        "local": {
                            "database": local.database,
                            "mysql_user": local.mysql.user,
                            "mysql_server": local_server,
                            "backup_dir": local.backup_dir.to_string_lossy(),
                        },
                        "keep_backups": config.keep_backups,
                        "verify_transfer": config.verify_transfer,
                    }))?
                );
                return Ok(());
            }

            output::success(&format!("{} is valid", config_path.display()));
            println!();
            println!("{}", "Remote".bold());
            println!(
                "  SSH:          {}@{}:{}",
                remote.user, remote.host, remote.port
            );
            println!("  Key:          {}", remote.key_path.display());
            println!("  Host keys:    {:?}", remote.host_key_policy);
            println!(
                "  Database:     {} (as {})",
                remote.database, remote.mysql.user
            );
            println!("  Scratch dir:  {}", remote.scratch_dir);
            println!();
            println!("{}", "Local".bold());
            println!(
                "  Database:     {} (as {})",
                local.database, local.mysql.user
            );
            println!("  Server:       {}", local_server);
            println!("  Backup dir:   {}", local.backup_dir.display());
            println!("  Keep:         {}", config.keep_backups);
            println!("  Verify:       {:?}", config.verify_transfer);
            if !remote.key_path.exists() {
                println!();
                output::warning(&format!(
                    "SSH key not found: {}",
                    remote.key_path.display()
                ));
            }
        }
    }

    Ok(())
}
