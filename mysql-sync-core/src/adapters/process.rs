//! Local process adapter

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;

use tracing::debug;

use crate::domain::{CommandOutput, CommandSpec};
use crate::ports::LocalRunner;

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Spawn `cmd`, write `input` to its stdin (closing it afterwards) and wait,
/// capturing stdout and stderr.
///
/// stdin is fed from a scoped thread so a child that writes a lot before
/// reading cannot deadlock against us.
pub(crate) fn run_with_input(cmd: &mut Command, input: Option<&[u8]>) -> io::Result<CommandOutput> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = cmd.spawn()?;
    let stdin = child.stdin.take();

    thread::scope(|scope| {
        let writer = scope.spawn(move || -> io::Result<()> {
            if let (Some(mut pipe), Some(bytes)) = (stdin, input) {
                match pipe.write_all(bytes) {
                    // The child may exit without reading everything
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                    other => other?,
                }
            }
            Ok(())
        });

        let output = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))??;
        Ok(output.into())
    })
}

/// Runs local programs as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl LocalRunner for ProcessRunner {
    fn run_with_input_file(
        &self,
        command: &CommandSpec,
        stdin_file: &Path,
    ) -> io::Result<CommandOutput> {
        debug!(program = %command.program, input = %stdin_file.display(), "running local command");
        let file = File::open(stdin_file)?;
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::from(file))
            .output()?;
        Ok(output.into())
    }
}
