// src/exec/runner.rs

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::errors::RunError;
use crate::exec::invocation::Invocation;
use crate::exec::registry::CancelRegistry;
use crate::exec::supervisor::supervise;
use crate::exec::{RunEvent, RunId, RunResult, RunStatus};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default time between SIGTERM and SIGKILL on cancellation.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Starts processes and hands back a [`RunHandle`] per run.
///
/// Cheap to clone; clones share the cancellation registry, so a run started
/// through one clone can be cancelled through another.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    registry: Arc<CancelRegistry>,
    next_id: Arc<AtomicU64>,
    grace_period: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl ProcessRunner {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            registry: Arc::new(CancelRegistry::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            grace_period,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Start `invocation` on its own Tokio task and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, invocation: Invocation) -> RunHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel_rx = self.registry.register(id);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let registry = Arc::clone(&self.registry);
        let grace = self.grace_period;
        tokio::spawn(async move {
            supervise(id, invocation, tx, cancel_rx, grace).await;
            registry.remove(id);
        });

        RunHandle {
            id,
            events: rx,
            canceller: Canceller {
                id,
                registry: Arc::clone(&self.registry),
            },
        }
    }

    /// Cancel a run by id. Returns `false` if it is unknown or already done.
    pub fn cancel(&self, id: RunId) -> bool {
        self.registry.cancel(id)
    }

    pub fn cancel_all(&self) -> usize {
        self.registry.cancel_all()
    }

    pub fn active_runs(&self) -> Vec<RunId> {
        self.registry.active()
    }
}

/// Cloneable cancellation handle for one run.
#[derive(Debug, Clone)]
pub struct Canceller {
    id: RunId,
    registry: Arc<CancelRegistry>,
}

impl Canceller {
    pub fn run_id(&self) -> RunId {
        self.id
    }

    pub fn cancel(&self) -> bool {
        self.registry.cancel(self.id)
    }
}

/// Receiving side of one run.
#[derive(Debug)]
pub struct RunHandle {
    id: RunId,
    events: mpsc::Receiver<RunEvent>,
    canceller: Canceller,
}

impl RunHandle {
    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn cancel(&self) -> bool {
        self.canceller.cancel()
    }

    /// A handle that can cancel this run from another task while this one
    /// is awaiting events.
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// Next event, or `None` after the terminal event has been consumed.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Consume all events, calling `on_line` for each line as it arrives.
    pub async fn wait_with<F>(mut self, mut on_line: F) -> RunResult
    where
        F: FnMut(&str),
    {
        let mut lines = Vec::new();

        while let Some(event) = self.events.recv().await {
            match event {
                RunEvent::Line(line) => {
                    on_line(&line);
                    lines.push(line);
                }
                RunEvent::Completed(code) => {
                    return RunResult {
                        lines,
                        status: RunStatus::Exited(code),
                    };
                }
                RunEvent::Failed(err) => {
                    return RunResult {
                        lines,
                        status: RunStatus::Failed(err),
                    };
                }
            }
        }

        RunResult {
            lines,
            status: RunStatus::Failed(RunError::Stream(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "runner task ended without a terminal event",
            ))),
        }
    }

    pub async fn wait(self) -> RunResult {
        self.wait_with(|_| {}).await
    }
}
