//! Local command port

use std::io;
use std::path::Path;

use crate::domain::{CommandOutput, CommandSpec};

/// Runs local programs
pub trait LocalRunner: Send + Sync {
    /// Run `command` with the contents of `stdin_file` as its standard input
    /// and wait for it to exit, capturing stdout and stderr
    fn run_with_input_file(&self, command: &CommandSpec, stdin_file: &Path)
        -> io::Result<CommandOutput>;
}
