// src/errors.rs

//! Crate-wide error types.
//!
//! - [`KeysweepError`] covers configuration loading and top-level I/O.
//! - [`PreconditionError`], [`RunError`] and [`ExtractionError`] are the
//!   three stages a tool run can fail in; [`PipelineError`] wraps them so a
//!   run always ends in exactly one reported outcome.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeysweepError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, KeysweepError>;

/// Something required before launching a tool is missing.
///
/// None of these ever start a process.
#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("unknown tool '{0}' (expected one of: aes, rsa, serpent, twofish)")]
    UnknownTool(String),

    #[error("input file {0:?} does not exist")]
    MissingInput(PathBuf),

    #[error("input file {path:?} is not readable: {source}")]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output directory {path:?} cannot be created: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("program '{0}' was not found on PATH")]
    ProgramNotFound(String),

    #[error("path {0:?} is not valid UTF-8 and cannot be passed to the tool")]
    NonUtf8Path(PathBuf),
}

/// Terminal failure of a single process run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open capture file {path:?}: {source}")]
    Capture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while reading process output: {0}")]
    Stream(#[source] std::io::Error),

    #[error("run was cancelled")]
    Cancelled,
}

/// The captured output of a finished run could not be turned into text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("cannot read captured output {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("captured output {path:?} is not valid UTF-8 text")]
    NotText { path: PathBuf },
}

/// Outcome error of one orchestrated tool run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("failed to write findings to {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("runner stopped without reporting a terminal status")]
    RunnerGone,
}

impl PipelineError {
    /// True when the run ended because the caller asked for it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Run(RunError::Cancelled))
    }
}
