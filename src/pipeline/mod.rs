// src/pipeline/mod.rs

//! Orchestration: request → preflight → process run → extraction → files.
//!
//! - [`dispatch`] is the closed tool table (file names, invocation).
//! - [`preflight`] holds the checks done before anything is launched.
//! - [`orchestrator`] owns [`Pipeline`], which wires a
//!   [`ProcessRunner`](crate::exec::ProcessRunner) run to the extractor.

use std::path::PathBuf;

use crate::errors::PipelineError;
use crate::exec::RunId;
use crate::extract::FindingRecord;
use crate::types::ToolId;

pub mod dispatch;
pub mod orchestrator;
pub mod preflight;

pub use dispatch::{ToolFiles, ToolPaths, files_for, output_paths};
pub use orchestrator::Pipeline;

/// "Run tool T against image F, write results under D."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub tool: ToolId,
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

impl ToolRequest {
    pub fn new(tool: ToolId, input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            input: input.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// Successful outcome of one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReport {
    pub tool: ToolId,
    pub run_id: RunId,
    pub exit_code: i32,
    pub raw_output: PathBuf,
    pub values_file: PathBuf,
    pub records: Vec<FindingRecord>,
}

/// Progress of a tool run, in order. For runs started with
/// [`Pipeline::spawn_tool`], `Finished` is always the last event.
#[derive(Debug)]
pub enum ToolEvent {
    /// The process was launched.
    Started {
        tool: ToolId,
        run_id: RunId,
        command: String,
    },
    /// One line of the tool's merged output, unchanged.
    Line {
        tool: ToolId,
        run_id: RunId,
        line: String,
    },
    /// The process exited on its own; extraction follows.
    Exited {
        tool: ToolId,
        run_id: RunId,
        exit_code: i32,
    },
    /// Final outcome of the run.
    Finished {
        tool: ToolId,
        result: Result<ToolReport, PipelineError>,
    },
}

impl ToolEvent {
    pub fn tool(&self) -> ToolId {
        match self {
            ToolEvent::Started { tool, .. }
            | ToolEvent::Line { tool, .. }
            | ToolEvent::Exited { tool, .. }
            | ToolEvent::Finished { tool, .. } => *tool,
        }
    }
}
