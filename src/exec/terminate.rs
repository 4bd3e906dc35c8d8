// src/exec/terminate.rs

//! Stopping a child and everything it spawned.
//!
//! On Unix each child is started in its own process group, so signals go to
//! the whole group (a `sh -c` wrapper and the scanner it started). The group
//! id is the leader's pid, recorded at spawn: the group outlives the leader
//! while any member is still alive, so it stays signallable after the leader
//! has been reaped.

use tokio::process::Child;
use tracing::{debug, warn};

use crate::exec::RunId;

/// Ask the process group to stop.
///
/// Unix: SIGTERM. Elsewhere there is no graceful option, so this kills.
#[cfg_attr(unix, allow(unused_variables))]
pub(crate) fn request_stop(run_id: RunId, pgid: Option<u32>, child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pgid) = pgid {
            signal_group(run_id, pgid, nix::sys::signal::Signal::SIGTERM);
        }
    }

    #[cfg(not(unix))]
    {
        force_kill(run_id, pgid, child);
    }
}

/// Kill the process group outright, leader or not.
pub(crate) fn force_kill(run_id: RunId, pgid: Option<u32>, child: &mut Child) {
    #[cfg(unix)]
    if let Some(pgid) = pgid {
        signal_group(run_id, pgid, nix::sys::signal::Signal::SIGKILL);
    }

    #[cfg(not(unix))]
    let _ = pgid;

    if let Err(e) = child.start_kill() {
        debug!(run_id, error = %e, "start_kill failed (process likely already exited)");
    }
}

#[cfg(unix)]
fn signal_group(run_id: RunId, pgid: u32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    #[allow(clippy::cast_possible_wrap)]
    let pgid = Pid::from_raw(pgid as i32);
    debug!(run_id, %pgid, ?signal, "signalling process group");

    // ESRCH: every member is gone already.
    match killpg(pgid, signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(run_id, %pgid, ?signal, error = %e, "failed to signal process group"),
    }
}
