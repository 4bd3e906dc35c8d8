// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs external commands with `tokio::process::Command`, merges their
//! stdout and stderr into one ordered line stream and reports each run's
//! outcome as [`RunEvent`]s.
//!
//! - [`invocation`] describes what to run ([`Invocation`], [`CommandSpec`]).
//! - [`runner`] owns [`ProcessRunner`] and the per-run [`RunHandle`].
//! - [`registry`] routes cancellation requests to the right run.
//! - `supervisor` drives a single process (spawn, stream, wait, cancel) and
//!   `terminate` signals its process group.

use crate::errors::RunError;

pub mod invocation;
pub mod registry;
pub mod runner;
mod supervisor;
mod terminate;

pub use invocation::{CommandSpec, Invocation, shell_quote};
pub use registry::CancelRegistry;
pub use runner::{Canceller, DEFAULT_GRACE_PERIOD, ProcessRunner, RunHandle};

/// Identifier of one run, unique per [`ProcessRunner`].
pub type RunId = u64;

/// Events delivered for a run, in order. The last one is always
/// `Completed` or `Failed`.
#[derive(Debug)]
pub enum RunEvent {
    /// One line of merged output, line terminator removed.
    Line(String),
    /// The process exited on its own. `-1` if it was killed by a signal.
    Completed(i32),
    /// Launch failure, stream failure or cancellation.
    Failed(RunError),
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::Line(_))
    }
}

#[derive(Debug)]
pub enum RunStatus {
    Exited(i32),
    Failed(RunError),
}

/// Everything one run produced.
#[derive(Debug)]
pub struct RunResult {
    /// Lines in arrival order.
    pub lines: Vec<String>,
    pub status: RunStatus,
}

impl RunResult {
    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            RunStatus::Exited(code) => Some(code),
            RunStatus::Failed(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, RunStatus::Failed(RunError::Cancelled))
    }

    /// Captured lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}
