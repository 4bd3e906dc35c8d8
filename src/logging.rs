// src/logging.rs

//! Logging setup for `keysweep` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `KEYSWEEP_LOG` environment variable, either a bare level ("debug")
//!    or a full filter directive ("keysweep::exec=trace,info")
//! 3. default to `info`
//!
//! Logs are sent to STDERR; scanner output lines go to STDOUT.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "KEYSWEEP_LOG";

/// Initialise global logging subscriber.
///
/// Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_directive(lvl)),
        None => match std::env::var(LOG_ENV_VAR) {
            Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec.trim())
                .with_context(|| format!("invalid {LOG_ENV_VAR} filter '{spec}'"))?,
            _ => EnvFilter::new("info"),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

fn level_directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
