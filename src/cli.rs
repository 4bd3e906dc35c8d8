// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::ToolId;

/// Command-line arguments for `keysweep`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "keysweep",
    version,
    about = "Run key-recovery scanners over memory images and collect their findings.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Keysweep.toml` in the current working directory if it
    /// exists, otherwise built-in tool commands.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KEYSWEEP_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run scanners against a memory image and write findings files.
    Run(RunArgs),
    /// Re-extract findings from a raw capture written by an earlier run.
    Extract(ExtractArgs),
    /// Show which scanner programs are resolvable on PATH.
    Check,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Memory image to scan.
    #[arg(long, short, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory for raw captures and values files (created if missing).
    #[arg(long, short, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Scanner to run; repeat to run several concurrently. Default: all.
    #[arg(long = "tool", short, value_enum, value_name = "TOOL")]
    pub tools: Vec<ToolId>,

    /// Print the commands that would run, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Grammar to apply.
    #[arg(long, short, value_enum, value_name = "TOOL")]
    pub tool: ToolId,

    /// Raw capture file to read.
    #[arg(long, value_name = "PATH")]
    pub raw: PathBuf,

    /// Write records here instead of stdout.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
