//! Platform process queries

#[cfg(not(unix))]
use crate::outcome::ProbeOutcome;

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{probe, process_alive};

/// PID of the calling process
pub fn current_pid() -> u32 {
    std::process::id()
}

#[cfg(not(unix))]
pub fn probe(_pid: u32) -> ProbeOutcome {
    ProbeOutcome::Indeterminate("liveness probing is not supported on this platform".to_string())
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    false
}
