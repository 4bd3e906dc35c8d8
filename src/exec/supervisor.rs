// src/exec/supervisor.rs

//! Per-run supervision: spawn, stream, wait, cancel.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, PipeReader, PipeWriter, Write};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::errors::RunError;
use crate::exec::invocation::Invocation;
use crate::exec::terminate;
use crate::exec::{RunEvent, RunId};

const LINE_CHANNEL_CAPACITY: usize = 256;

/// Drive one invocation to its terminal event.
///
/// Emits zero or more `RunEvent::Line`s followed by exactly one
/// `Completed` / `Failed`. Send errors are ignored: a caller that dropped its
/// handle still gets the process run (and captured) to completion.
pub(crate) async fn supervise(
    run_id: RunId,
    invocation: Invocation,
    events: mpsc::Sender<RunEvent>,
    cancel_rx: oneshot::Receiver<()>,
    grace_period: Duration,
) {
    let terminal = match run_inner(run_id, &invocation, &events, cancel_rx, grace_period).await {
        Ok(code) => RunEvent::Completed(code),
        Err(RunError::Cancelled) => {
            info!(run_id, "run cancelled");
            RunEvent::Failed(RunError::Cancelled)
        }
        Err(err) => {
            error!(run_id, error = %err, "run failed");
            RunEvent::Failed(err)
        }
    };

    let _ = events.send(terminal).await;
}

async fn run_inner(
    run_id: RunId,
    invocation: &Invocation,
    events: &mpsc::Sender<RunEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
    grace_period: Duration,
) -> Result<i32, RunError> {
    let program = invocation.command.program().to_string();
    info!(
        run_id,
        command = %invocation.command,
        cwd = ?invocation.working_dir,
        "starting process"
    );

    let capture = match &invocation.capture_to {
        Some(path) => Some(File::create(path).map_err(|source| RunError::Capture {
            path: path.clone(),
            source,
        })?),
        None => None,
    };

    let (reader, writer) = io::pipe().map_err(|source| RunError::Launch {
        program: program.clone(),
        source,
    })?;

    let mut child = match spawn_child(invocation, writer) {
        Ok(child) => child,
        Err(source) => {
            // Don't leave an empty capture behind for a process that never ran.
            if let Some(path) = &invocation.capture_to {
                drop(capture);
                let _ = std::fs::remove_file(path);
            }
            return Err(RunError::Launch { program, source });
        }
    };

    // Leader pid == process group id; kept so the group can still be
    // signalled after the leader is reaped.
    let pgid = child.id();
    debug!(run_id, pid = ?pgid, "process spawned");

    let (line_tx, mut line_rx) = mpsc::channel::<io::Result<String>>(LINE_CHANNEL_CAPACITY);
    tokio::task::spawn_blocking(move || pump_lines(reader, capture, line_tx));

    let mut cancel_armed = true;
    let mut cancelled = false;
    let mut kill_deadline: Option<Instant> = None;
    let mut stream_error: Option<io::Error> = None;
    let mut exit_status: Option<ExitStatus> = None;
    let mut eof = false;

    // Finish only when the pipe is drained AND the process is reaped, so
    // every line precedes the terminal event.
    while !(eof && exit_status.is_some()) {
        tokio::select! {
            biased;

            msg = &mut cancel_rx, if cancel_armed => {
                cancel_armed = false;
                if msg.is_ok() {
                    info!(run_id, grace_ms = grace_period.as_millis() as u64, "cancellation requested; stopping process");
                    cancelled = true;
                    terminate::request_stop(run_id, pgid, &mut child);
                    kill_deadline = Some(Instant::now() + grace_period);
                }
            }

            _ = sleep_until_deadline(kill_deadline) => {
                warn!(run_id, "process still running after grace period; killing");
                terminate::force_kill(run_id, pgid, &mut child);
                kill_deadline = None;
            }

            status = child.wait(), if exit_status.is_none() => {
                match status {
                    Ok(status) => {
                        debug!(run_id, ?status, "process exited");
                        exit_status = Some(status);
                    }
                    Err(e) => return Err(RunError::Stream(e)),
                }
                // A cancelled run keeps its deadline until EOF: group members
                // that ignored SIGTERM may still hold the pipe open.
                if !cancelled {
                    kill_deadline = None;
                }
            }

            line = line_rx.recv(), if !eof => match line {
                Some(Ok(line)) => {
                    let _ = events.send(RunEvent::Line(line)).await;
                }
                Some(Err(e)) => {
                    warn!(run_id, error = %e, "output stream failed; killing process");
                    stream_error = Some(e);
                    terminate::force_kill(run_id, pgid, &mut child);
                }
                None => eof = true,
            },
        }
    }

    // After `close` every request fails to deliver; one that got in before
    // it was reported as delivered, so it still counts.
    cancel_rx.close();
    if cancel_armed && cancel_rx.try_recv().is_ok() {
        info!(run_id, "cancellation requested as the process finished");
        cancelled = true;
    }

    if cancelled {
        return Err(RunError::Cancelled);
    }
    if let Some(e) = stream_error {
        return Err(RunError::Stream(e));
    }

    let status = exit_status.unwrap_or_default();
    let code = status.code().unwrap_or(-1);
    info!(
        run_id,
        program = %program,
        exit_code = code,
        success = status.success(),
        "process finished"
    );
    Ok(code)
}

/// Spawn with stdout and stderr both attached to the write end of one pipe.
///
/// The `Command` (and with it our copies of the write end) is dropped before
/// returning, so the reader sees EOF once the child side closes.
fn spawn_child(invocation: &Invocation, writer: PipeWriter) -> io::Result<Child> {
    let stderr = writer.try_clone()?;

    let mut cmd = invocation.to_command();
    cmd.stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr)
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn()
}

/// Blocking reader: split the merged stream into lines, tee raw bytes into
/// the capture file, forward decoded lines.
fn pump_lines(
    reader: PipeReader,
    capture: Option<File>,
    tx: mpsc::Sender<io::Result<String>>,
) {
    let mut reader = BufReader::new(reader);
    let mut capture = capture.map(BufWriter::new);
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if let Some(file) = capture.as_mut() {
                    if let Err(e) = file.write_all(&buf) {
                        let _ = tx.blocking_send(Err(e));
                        return;
                    }
                }
                if tx.blocking_send(Ok(decode_line(&buf))).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
    }

    if let Some(mut file) = capture {
        if let Err(e) = file.flush() {
            let _ = tx.blocking_send(Err(e));
        }
    }
}

/// Drop the trailing `\n` / `\r\n`; replace invalid UTF-8 with U+FFFD.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
