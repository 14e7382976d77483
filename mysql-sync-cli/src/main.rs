//! mysql-sync CLI - mirror a remote MySQL database to this machine

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{backups, config, logs, sync};

/// Dump a remote MySQL database over SSH, restore it locally, keep the last few dumps
#[derive(Parser)]
#[command(name = "mysql-sync", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, short, global = true, env = "MYSQL_SYNC_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// More diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the remote database, download it, restore it locally and prune old dumps
    Sync {
        /// Number of local dumps to keep (overrides keep_backups)
        #[arg(long, short)]
        keep: Option<usize>,
        /// Download the dump but do not restore it
        #[arg(long)]
        skip_restore: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage local dumps
    Backups {
        #[command(subcommand)]
        command: backups::BackupsCommands,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage the run history
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

/// Diagnostics go to stderr; `MYSQL_SYNC_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("MYSQL_SYNC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "mysql_sync_core={level},mysql_sync={level}",
            level = default_level
        ))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        None => sync::run(&config_path, None, false, false),
        Some(Commands::Sync {
            keep,
            skip_restore,
            json,
        }) => sync::run(&config_path, keep, skip_restore, json),
        Some(Commands::Backups { command }) => backups::run(&config_path, command),
        Some(Commands::Config { command }) => config::run(&config_path, command),
        Some(Commands::Logs { command }) => logs::run(command),
    }
}
