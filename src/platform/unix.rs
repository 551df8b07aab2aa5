use crate::outcome::ProbeOutcome;
use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;
use tracing::debug;

/// Probe a PID with the null signal
///
/// Nothing is delivered; the kernel only performs the existence and
/// permission checks.
pub fn probe(pid: u32) -> ProbeOutcome {
    let c_pid = match libc::pid_t::try_from(pid) {
        // kill(0, ..) addresses our own process group
        Ok(0) | Err(_) => return ProbeOutcome::NotAlive,
        Ok(c_pid) => c_pid,
    };

    match signal::kill(Pid::from_raw(c_pid), None) {
        Ok(()) => ProbeOutcome::Alive,
        Err(Errno::ESRCH) => ProbeOutcome::NotAlive,
        // EPERM means process exists but no permission
        Err(Errno::EPERM) => ProbeOutcome::Alive,
        Err(errno) => {
            debug!(pid, %errno, "liveness probe failed");
            ProbeOutcome::from_error_text(errno.desc())
        }
    }
}

/// Check if process is alive
pub fn process_alive(pid: u32) -> bool {
    probe(pid) == ProbeOutcome::Alive
}
