//! MySQL client tool invocations
//!
//! Credentials travel in `[client]` option-file text, never on argv.

use std::path::Path;

use crate::config::Credentials;
use crate::domain::{CommandSpec, RemoteCommand};

/// Dump flags: consistent snapshot, structure + data + routines + events +
/// triggers, drop-before-create, no GTID metadata
pub const DUMP_FLAGS: &[&str] = &[
    "--routines",
    "--events",
    "--triggers",
    "--add-drop-database",
    "--add-drop-table",
    "--databases",
    "--create-options",
    "--single-transaction",
    "--set-gtid-purged=OFF",
];

/// Option file read by the remote mysqldump from its stdin
const STDIN_DEFAULTS: &str = "--defaults-extra-file=/dev/stdin";

/// Render a `[client]` option group for the given account
pub fn client_option_file(credentials: &Credentials, host: Option<&str>, port: Option<u16>) -> String {
    let mut content = String::from("[client]\n");
    content.push_str(&format!("user={}\n", option_value(&credentials.user)));
    content.push_str(&format!("password={}\n", option_value(credentials.password())));
    if let Some(host) = host {
        content.push_str(&format!("host={}\n", option_value(host)));
    }
    if let Some(port) = port {
        content.push_str(&format!("port={}\n", port));
    }
    content
}

/// Double-quote an option-file value, escaping backslashes and quotes
fn option_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Remote `mysqldump` writing `database` to `output_path`
///
/// Reads its credentials from stdin; feed it [`client_option_file`].
pub fn dump_command(database: &str, output_path: &str) -> RemoteCommand {
    let spec = CommandSpec::new("mysqldump")
        .arg(STDIN_DEFAULTS)
        .args(DUMP_FLAGS.iter().copied())
        .arg(database);
    RemoteCommand::new(spec).with_umask(0o077).stdout_to(output_path)
}

/// Remote byte count of a file
pub fn size_command(path: &str) -> RemoteCommand {
    RemoteCommand::new(CommandSpec::new("wc").arg("-c")).stdin_from(path)
}

/// Remote SHA-256 of a file
pub fn checksum_command(path: &str) -> RemoteCommand {
    RemoteCommand::new(CommandSpec::new("sha256sum").arg(path))
}

/// Local `mysql` import into `database`, credentials from `defaults_file`
pub fn restore_command(database: &str, defaults_file: &Path) -> CommandSpec {
    CommandSpec::new("mysql")
        .arg(format!("--defaults-extra-file={}", defaults_file.display()))
        .arg(database)
}
