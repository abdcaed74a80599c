//! Process group cleanup
//!
//! Candidates start as leaders of their own process group, so everything they
//! fork can be killed together once the leader exits or runs out of time.

/// Kills a candidate's process group on [`kill`](Self::kill) or drop
#[derive(Debug)]
pub(crate) struct ProcessGroup {
    leader: Option<u32>,
}

impl ProcessGroup {
    /// Track the group led by `leader`
    pub(crate) fn new(leader: Option<u32>) -> Self {
        Self { leader }
    }

    /// Kill every process still in the group
    pub(crate) fn kill(&mut self) {
        if let Some(pid) = self.leader.take() {
            kill_group(pid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    use tracing::warn;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        // Already empty
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid = raw, error = %e, "failed to kill candidate process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}
