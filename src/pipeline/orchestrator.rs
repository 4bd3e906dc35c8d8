// src/pipeline/orchestrator.rs

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{KeysweepError, PipelineError, PreconditionError, Result, RunError};
use crate::exec::{Invocation, ProcessRunner, RunEvent, RunId};
use crate::extract::{GrammarTable, extract_file, write_records};
use crate::pipeline::dispatch::{ToolPaths, build_invocation, output_paths};
use crate::pipeline::preflight::{check_input, ensure_output_dir, resolve_program};
use crate::pipeline::{ToolEvent, ToolReport, ToolRequest};
use crate::types::ToolId;

/// Runs scanners and turns their output into findings files.
///
/// Holds the process runner, the validated config and the compiled
/// grammars. Cheap to clone; clones share the runner's cancellation
/// registry and the shutdown flag.
#[derive(Debug, Clone)]
pub struct Pipeline {
    runner: ProcessRunner,
    config: Arc<ConfigFile>,
    grammars: Arc<GrammarTable>,
    shutting_down: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(config: ConfigFile) -> Result<Self> {
        let grammars = GrammarTable::new().map_err(|e| KeysweepError::Other(e.into()))?;
        let runner = ProcessRunner::new(config.runner.grace_period);

        Ok(Self {
            runner,
            config: Arc::new(config),
            grammars: Arc::new(grammars),
            shutting_down: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    pub fn grammars(&self) -> &GrammarTable {
        &self.grammars
    }

    /// The invocation `run_tool` would launch for `request`, without any
    /// precondition checks. Used for dry runs.
    pub fn plan(&self, request: &ToolRequest) -> std::result::Result<Invocation, PipelineError> {
        let paths = output_paths(request.tool, &request.output_dir);
        let invocation = build_invocation(
            &self.config.tool(request.tool),
            &self.config.runner.shell,
            &request.input,
        )?;
        Ok(invocation.with_capture_to(paths.raw))
    }

    /// Run one tool to completion.
    ///
    /// Emits `Started`, every output `Line` and `Exited` on `events`; the
    /// caller gets the final outcome as the return value. Use
    /// [`Pipeline::spawn_tool`] to also get it as a `Finished` event.
    pub async fn run_tool(
        &self,
        request: ToolRequest,
        events: &mpsc::Sender<ToolEvent>,
    ) -> std::result::Result<ToolReport, PipelineError> {
        let tool = request.tool;
        let command = self.config.tool(tool);

        check_input(&request.input)?;
        ensure_output_dir(&request.output_dir)?;
        for program in command.required_programs(&self.config.runner.shell) {
            resolve_program(program, command.working_dir.as_deref())?;
        }

        let paths = output_paths(tool, &request.output_dir);
        let invocation = self.plan(&request)?;

        if self.is_shutting_down() {
            info!(tool = %tool, "shutdown requested; not launching");
            return Err(RunError::Cancelled.into());
        }
        remove_stale_values(tool, &paths);

        let mut handle = self.runner.start(invocation.clone());
        let run_id = handle.id();
        // `shutdown` may have swept the registry between the check above and
        // `start`; the flag is set before the sweep, so one of the two sees
        // this run.
        if self.is_shutting_down() {
            handle.cancel();
        }
        info!(
            tool = %tool,
            run_id,
            input = ?request.input,
            command = %invocation.command,
            "tool started"
        );
        let _ = events
            .send(ToolEvent::Started {
                tool,
                run_id,
                command: invocation.command.to_string(),
            })
            .await;

        let exit_code = loop {
            match handle.next_event().await {
                Some(RunEvent::Line(line)) => {
                    let _ = events.send(ToolEvent::Line { tool, run_id, line }).await;
                }
                Some(RunEvent::Completed(code)) => break code,
                Some(RunEvent::Failed(err)) => return Err(err.into()),
                None => return Err(PipelineError::RunnerGone),
            }
        };

        // Scanners may exit non-zero even after a complete scan, so any
        // exit status is eligible for extraction.
        if exit_code != 0 {
            warn!(tool = %tool, run_id, exit_code, "tool exited with non-zero status; extracting anyway");
        }
        let _ = events
            .send(ToolEvent::Exited {
                tool,
                run_id,
                exit_code,
            })
            .await;

        let records = extract_file(&paths.raw, self.grammars.get(tool))?;
        write_records(&paths.values, &records).map_err(|source| PipelineError::Persist {
            path: paths.values.clone(),
            source,
        })?;

        info!(
            tool = %tool,
            run_id,
            findings = records.len(),
            values = ?paths.values,
            "findings written"
        );

        Ok(ToolReport {
            tool,
            run_id,
            exit_code,
            raw_output: paths.raw,
            values_file: paths.values,
            records,
        })
    }

    /// Run `request` on its own task. The last event sent for it is always
    /// `ToolEvent::Finished`.
    pub fn spawn_tool(
        &self,
        request: ToolRequest,
        events: mpsc::Sender<ToolEvent>,
    ) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let tool = request.tool;
            let result = pipeline.run_tool(request, &events).await;

            match &result {
                Ok(report) => debug!(tool = %tool, findings = report.records.len(), "tool run succeeded"),
                Err(err) if err.is_cancelled() => info!(tool = %tool, "tool run cancelled"),
                Err(err) => error!(tool = %tool, error = %err, "tool run failed"),
            }

            let _ = events.send(ToolEvent::Finished { tool, result }).await;
        })
    }

    /// Parse a tool name coming from outside (e.g. a front-end) into a
    /// request. Unknown names fail before anything is launched.
    pub fn request(
        &self,
        tool: &str,
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> std::result::Result<ToolRequest, PreconditionError> {
        let tool: ToolId = tool.parse()?;
        Ok(ToolRequest::new(tool, input, output_dir))
    }

    pub fn cancel(&self, run_id: RunId) -> bool {
        self.runner.cancel(run_id)
    }

    pub fn cancel_all(&self) -> usize {
        self.runner.cancel_all()
    }

    /// Cancel every active run and refuse to launch any further ones,
    /// including runs still in their precondition checks.
    pub fn shutdown(&self) -> usize {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.runner.cancel_all()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

/// A values file from an earlier run must not survive a run whose
/// extraction fails.
fn remove_stale_values(tool: ToolId, paths: &ToolPaths) {
    match fs::remove_file(&paths.values) {
        Ok(()) => debug!(tool = %tool, path = ?paths.values, "removed stale values file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(tool = %tool, path = ?paths.values, error = %e, "could not remove stale values file"),
    }
}
