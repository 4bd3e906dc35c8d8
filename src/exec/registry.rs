// src/exec/registry.rs

//! Routes cancellation requests to the right running process.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::exec::RunId;

/// Map of active run id -> cancel sender.
///
/// This is the only state shared between runs.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    active: Mutex<HashMap<RunId, oneshot::Sender<()>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a run and return the receiving side of its cancel channel.
    pub fn register(&self, id: RunId) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id, tx);
        rx
    }

    /// Request cancellation. Returns `false` if the run is unknown or has
    /// already finished.
    ///
    /// `true` means the request reached the run's supervisor. A run that
    /// got as far as spawning then ends in `RunError::Cancelled`, even if
    /// the process was already exiting: the supervisor checks for a late
    /// request after closing its receiver.
    pub fn cancel(&self, id: RunId) -> bool {
        let sender = self.lock().remove(&id);
        match sender {
            Some(tx) => {
                let delivered = tx.send(()).is_ok();
                if !delivered {
                    debug!(run_id = id, "run finished while cancelling");
                }
                delivered
            }
            None => false,
        }
    }

    /// Cancel every active run; returns how many requests were delivered.
    pub fn cancel_all(&self) -> usize {
        let senders: Vec<_> = self.lock().drain().collect();
        senders
            .into_iter()
            .filter(|(_, tx)| !tx.is_closed())
            .map(|(_, tx)| tx.send(()).is_ok())
            .filter(|ok| *ok)
            .count()
    }

    pub fn remove(&self, id: RunId) {
        self.lock().remove(&id);
    }

    pub fn active(&self) -> Vec<RunId> {
        let mut ids: Vec<RunId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RunId, oneshot::Sender<()>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
