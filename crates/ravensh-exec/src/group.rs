//! Process group teardown
//!
//! One-shot programs run as the leader of their own process group, so
//! anything they fork can be killed along with them.

use tokio::process::{Child, Command};
use tracing::debug;

/// Make the spawned process lead a new process group.
pub(crate) fn isolate(cmd: &mut Command) {
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(not(unix))]
    let _ = cmd;
}

/// Kill `child` and every process still in its group.
pub(crate) fn kill_tree(child: &mut Child, pgid: Option<u32>) {
    if let Some(pgid) = pgid {
        kill_group(pgid);
    }
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Kill failed, process likely exited");
    }
}

/// Send SIGKILL to process group `pgid`. A group with no members left is
/// not an error.
#[cfg(unix)]
#[allow(unsafe_code)]
pub(crate) fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // Group ids 0 and 1 would target our own group and init.
    if pgid <= 1 {
        return;
    }

    // SAFETY: killpg takes no pointers and has no memory effects.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            debug!(pgid, error = %err, "Failed to kill process group");
        }
    }
}

#[cfg(not(unix))]
pub(crate) fn kill_group(_pgid: u32) {}
