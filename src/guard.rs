//! PID-file instance guard
//!
//! Keeps two copies of a long-running process off the same resource. The
//! lock file holds the owner's PID as decimal text and nothing else. Every
//! check re-reads the file; nothing is cached between calls.
//!
//! This is best-effort exclusion: the file itself is not locked, so two
//! processes reclaiming the same stale file at the same moment can both win.

use crate::error::GuardError;
use crate::outcome::ProbeOutcome;
use crate::platform;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct InstanceGuard {
    path: PathBuf,
    pid: u32,
}

/// What the lock file currently says
#[derive(Debug, Clone, PartialEq, Eq)]
enum Recorded {
    Absent,
    Pid(u32),
    Garbage(String),
}

impl InstanceGuard {
    /// Guard claiming on behalf of the current process
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_pid(path, platform::current_pid())
    }

    /// Guard claiming on behalf of an arbitrary PID
    pub fn with_pid(path: impl Into<PathBuf>, pid: u32) -> Self {
        Self {
            path: path.into(),
            pid,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// PID currently recorded in the lock file, if any
    pub fn recorded_pid(&self) -> Result<Option<u32>, GuardError> {
        match self.read()? {
            Recorded::Pid(pid) => Ok(Some(pid)),
            Recorded::Absent | Recorded::Garbage(_) => Ok(None),
        }
    }

    /// Check the lock file and claim it if nobody else holds it.
    ///
    /// Returns our PID when we may proceed. A live, different owner yields
    /// [`GuardError::Conflict`] naming that owner. A file that does not hold
    /// a PID is left in place and yields [`GuardError::Unparseable`].
    pub fn claim(&self) -> Result<u32, GuardError> {
        let recorded = match self.read()? {
            Recorded::Absent => return self.write(),
            Recorded::Pid(pid) => pid,
            Recorded::Garbage(content) => {
                warn!(
                    path = %self.path.display(),
                    "pid file holds '{}', refusing to reclaim it",
                    content
                );
                return Err(GuardError::Unparseable {
                    path: self.path.clone(),
                    content,
                });
            }
        };

        if recorded == self.pid {
            info!("this is pid {}, ok to proceed", recorded);
            return Ok(self.pid);
        }

        match platform::probe(recorded) {
            ProbeOutcome::NotAlive => {
                info!("could not find pid {}, allow to proceed", recorded);
                self.write()
            }
            ProbeOutcome::Indeterminate(reason) => {
                warn!(
                    pid = recorded,
                    "liveness probe inconclusive ({}), keeping existing claim", reason
                );
                Err(GuardError::Conflict { pid: recorded })
            }
            ProbeOutcome::Alive => Err(GuardError::Conflict { pid: recorded }),
        }
    }

    /// Remove the lock file if it still names our PID.
    ///
    /// Returns whether a file was removed.
    pub fn release(&self) -> Result<bool, GuardError> {
        if self.read()? != Recorded::Pid(self.pid) {
            return Ok(false);
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(GuardError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn read(&self) -> Result<Recorded, GuardError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Recorded::Absent),
            Err(source) => {
                return Err(GuardError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(match content.trim().parse::<u32>() {
            Ok(pid) => Recorded::Pid(pid),
            Err(_) => Recorded::Garbage(content),
        })
    }

    fn write(&self) -> Result<u32, GuardError> {
        let to_write_err = |source| GuardError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_write_err)?;
        }
        fs::write(&self.path, self.pid.to_string()).map_err(to_write_err)?;
        info!(path = %self.path.display(), pid = self.pid, "claimed pid file");
        Ok(self.pid)
    }
}

/// Claim `pid_file` for the current process.
pub fn check_pid(pid_file: impl AsRef<Path>) -> Result<u32, GuardError> {
    InstanceGuard::new(pid_file.as_ref()).claim()
}
