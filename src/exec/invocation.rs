// src/exec/invocation.rs

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// What to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Direct execution, no shell involved. Preferred: arguments are passed
    /// as discrete argv elements, so paths with shell metacharacters are
    /// harmless.
    Argv { program: String, args: Vec<String> },
    /// `<interpreter> -c <line>`, for tools that need shell features.
    Shell { interpreter: String, line: String },
}

impl CommandSpec {
    /// The binary the OS is asked to start.
    pub fn program(&self) -> &str {
        match self {
            CommandSpec::Argv { program, .. } => program,
            CommandSpec::Shell { interpreter, .. } => interpreter,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSpec::Argv { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            CommandSpec::Shell { interpreter, line } => write!(f, "{interpreter} -c {line:?}"),
        }
    }
}

/// An immutable description of one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandSpec,
    pub working_dir: Option<PathBuf>,
    /// If set, the raw merged output bytes are also written here.
    pub capture_to: Option<PathBuf>,
}

impl Invocation {
    pub fn argv<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: CommandSpec::Argv {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
            working_dir: None,
            capture_to: None,
        }
    }

    /// Run `line` through `sh -c`.
    pub fn shell(line: impl Into<String>) -> Self {
        Self::shell_with("sh", line)
    }

    pub fn shell_with(interpreter: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            command: CommandSpec::Shell {
                interpreter: interpreter.into(),
                line: line.into(),
            },
            working_dir: None,
            capture_to: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_capture_to(mut self, path: impl AsRef<Path>) -> Self {
        self.capture_to = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the tokio command. Stdio wiring is left to the runner.
    pub(crate) fn to_command(&self) -> Command {
        let mut cmd = match &self.command {
            CommandSpec::Argv { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
            CommandSpec::Shell { interpreter, line } => {
                let mut c = Command::new(interpreter);
                c.arg("-c").arg(line);
                c
            }
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

/// Quote `s` for safe interpolation into a POSIX shell line.
pub fn shell_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}
