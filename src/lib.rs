// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod types;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, ExtractArgs, RunArgs};
use crate::config::load_or_default;
use crate::extract::{GrammarTable, extract_file, render_records, write_records};
use crate::pipeline::preflight::resolve_program;
use crate::pipeline::{Pipeline, ToolEvent, ToolRequest};
use crate::types::ToolId;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the pipeline (runner + grammars)
/// - one spawned run per selected tool
/// - Ctrl-C handling (cancels every active run)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref()).context("loading configuration")?;

    match args.command {
        Command::Run(run_args) => {
            let pipeline = Pipeline::new(cfg)?;
            run_tools(&pipeline, run_args).await
        }
        Command::Extract(extract_args) => run_extract(extract_args),
        Command::Check => {
            let pipeline = Pipeline::new(cfg)?;
            run_check(&pipeline)
        }
    }
}

async fn run_tools(pipeline: &Pipeline, args: RunArgs) -> Result<()> {
    let tools = selected_tools(&args.tools);

    if args.dry_run {
        print_dry_run(pipeline, &args, &tools)?;
        return Ok(());
    }

    // Ctrl-C → cancel every active run and stop the ones not launched yet.
    // Installed before any run starts, so none can slip past it.
    {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let n = pipeline.shutdown();
            warn!(cancelled = n, "Ctrl-C received; cancelling active runs");
        });
    }

    let (tx, mut rx) = mpsc::channel::<ToolEvent>(256);
    for &tool in &tools {
        let request = ToolRequest::new(tool, &args.input, &args.output_dir);
        pipeline.spawn_tool(request, tx.clone());
    }
    // The loop below ends once every spawned run has sent `Finished`.
    drop(tx);

    info!(?tools, input = ?args.input, output_dir = ?args.output_dir, "running tools");

    let mut failed = Vec::new();
    let mut cancelled = Vec::new();

    while let Some(event) = rx.recv().await {
        match event {
            ToolEvent::Started { tool, command, .. } => {
                println!("[{tool}] running: {command}");
            }
            ToolEvent::Line { tool, line, .. } => {
                println!("[{tool}] {line}");
            }
            ToolEvent::Exited {
                tool, exit_code, ..
            } => {
                println!("[{tool}] finished with code {exit_code}");
            }
            ToolEvent::Finished { tool, result } => match result {
                Ok(report) => {
                    println!(
                        "[{tool}] {} finding(s) written to {}",
                        report.records.len(),
                        report.values_file.display()
                    );
                }
                Err(err) if err.is_cancelled() => {
                    eprintln!("[{tool}] cancelled");
                    cancelled.push(tool);
                }
                Err(err) => {
                    eprintln!("[{tool}] error: {err}");
                    failed.push(tool);
                }
            },
        }
    }

    debug!(?failed, ?cancelled, "all tool runs finished");

    if !failed.is_empty() {
        bail!("{} of {} tool run(s) failed: {:?}", failed.len(), tools.len(), failed);
    }
    if !cancelled.is_empty() {
        bail!("cancelled: {:?}", cancelled);
    }
    Ok(())
}

/// Selected tools in a stable order, duplicates removed; all when empty.
fn selected_tools(requested: &[ToolId]) -> Vec<ToolId> {
    if requested.is_empty() {
        return ToolId::ALL.to_vec();
    }
    let mut tools = requested.to_vec();
    tools.sort();
    tools.dedup();
    tools
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let grammars = GrammarTable::new()?;
    let records = extract_file(&args.raw, grammars.get(args.tool))?;

    match args.output {
        Some(path) => {
            write_records(&path, &records)
                .with_context(|| format!("writing findings to {:?}", path))?;
            info!(tool = %args.tool, findings = records.len(), path = ?path, "findings written");
        }
        None => print!("{}", render_records(&records)),
    }

    Ok(())
}

fn run_check(pipeline: &Pipeline) -> Result<()> {
    let cfg = pipeline.config();
    let mut missing = Vec::new();

    println!("keysweep tool check");
    for tool in ToolId::ALL {
        let command = cfg.tool(tool);
        for program in command.required_programs(&cfg.runner.shell) {
            match resolve_program(program, command.working_dir.as_deref()) {
                Ok(path) => println!("  {tool:<8} {program:<16} ok ({})", path.display()),
                Err(_) => {
                    println!("  {tool:<8} {program:<16} NOT FOUND");
                    if !missing.contains(&tool) {
                        missing.push(tool);
                    }
                }
            }
        }
    }

    if !missing.is_empty() {
        bail!("{} tool(s) unavailable: {:?}", missing.len(), missing);
    }
    Ok(())
}

/// Dry-run output: the command, capture file and values file per tool.
fn print_dry_run(pipeline: &Pipeline, args: &RunArgs, tools: &[ToolId]) -> Result<()> {
    println!("keysweep dry-run");
    println!("  input = {}", args.input.display());
    println!("  output_dir = {}", args.output_dir.display());
    println!(
        "  runner.grace_period = {:?}",
        pipeline.config().runner.grace_period
    );
    println!();

    println!("tools ({}):", tools.len());
    for &tool in tools {
        let request = ToolRequest::new(tool, &args.input, &args.output_dir);
        let invocation = pipeline.plan(&request)?;
        let paths = crate::pipeline::output_paths(tool, &args.output_dir);

        println!("  - {tool}");
        println!("      cmd: {}", invocation.command);
        if let Some(ref dir) = invocation.working_dir {
            println!("      cwd: {}", dir.display());
        }
        println!("      raw: {}", paths.raw.display());
        println!("      values: {}", paths.values.display());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
