//! External command descriptions
//!
//! Commands are kept as structured argument lists. Only the remote side ever
//! needs a shell line (ssh hands its command to the login shell), and that
//! line is rendered here with every word quoted.

use std::fmt;

/// A program and its argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render as shell words, each quoted where needed
    pub fn shell_words(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|w| shell_quote(w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shell_words())
    }
}

/// A command to run through the remote login shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    command: CommandSpec,
    umask: Option<u32>,
    stdin_file: Option<String>,
    stdout_file: Option<String>,
}

impl RemoteCommand {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            umask: None,
            stdin_file: None,
            stdout_file: None,
        }
    }

    /// Run under `umask <mask>` so created files get restrictive modes
    pub fn with_umask(mut self, mask: u32) -> Self {
        self.umask = Some(mask);
        self
    }

    pub fn stdin_from(mut self, path: impl Into<String>) -> Self {
        self.stdin_file = Some(path.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<String>) -> Self {
        self.stdout_file = Some(path.into());
        self
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn shell_line(&self) -> String {
        let mut line = String::new();
        if let Some(mask) = self.umask {
            line.push_str(&format!("umask {:03o} && ", mask));
        }
        line.push_str(&self.command.shell_words());
        if let Some(path) = &self.stdin_file {
            line.push_str(" < ");
            line.push_str(&shell_quote(path));
        }
        if let Some(path) = &self.stdout_file {
            line.push_str(" > ");
            line.push_str(&shell_quote(path));
        }
        line
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shell_line())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// One-line description of a failed run: status plus captured stderr
    pub fn failure_summary(&self) -> String {
        let status = match self.status {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr_text();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr.lines().collect::<Vec<_>>().join(" "))
        }
    }
}

/// Quote a word for a POSIX shell
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
