//! Outcome classification policy
//!
//! Two decisions in execwarden hinge on how a process ended or whether it is
//! still around: which error payload to build after a failed run, and whether
//! a recorded PID still blocks a claim. Both are classified here and nowhere
//! else.

use crate::error::ExecError;
use std::process::ExitStatus;

/// How a child process finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exit code 0
    Success,
    /// Exit code 1: the child has already written a structured error body
    /// to its stderr
    HandledByChild,
    /// Any other exit code
    Failed(i32),
    /// Killed by a signal, no exit code
    Signaled(i32),
}

impl ExitOutcome {
    pub fn classify(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => ExitOutcome::Success,
            Some(1) => ExitOutcome::HandledByChild,
            Some(code) => ExitOutcome::Failed(code),
            None => Self::without_code(status),
        }
    }

    #[cfg(unix)]
    fn without_code(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match status.signal() {
            Some(signal) => ExitOutcome::Signaled(signal),
            None => ExitOutcome::Failed(-1),
        }
    }

    #[cfg(not(unix))]
    fn without_code(_status: ExitStatus) -> Self {
        ExitOutcome::Failed(-1)
    }

    pub fn into_result(self) -> Result<(), ExecError> {
        match self {
            ExitOutcome::Success => Ok(()),
            ExitOutcome::HandledByChild => Err(ExecError::ExitStatus(1)),
            ExitOutcome::Failed(code) => Err(ExecError::ExitStatus(code)),
            ExitOutcome::Signaled(signal) => Err(ExecError::Signaled(signal)),
        }
    }
}

/// True when the run error means the child reported its own structured
/// error on stderr, so the generic diagnostic path is skipped.
pub fn reported_by_child(err: &ExecError) -> bool {
    matches!(err, ExecError::ExitStatus(1))
}

/// Result of a zero-signal liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Alive,
    NotAlive,
    /// The probe failed for a reason that says nothing about liveness
    Indeterminate(String),
}

impl ProbeOutcome {
    /// Classify free-form probe error text.
    ///
    /// Only used where no errno is available. Anything not recognised as
    /// "gone" stays indeterminate.
    pub fn from_error_text(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        if lower.contains("already finished") || lower.contains("no such process") {
            ProbeOutcome::NotAlive
        } else {
            ProbeOutcome::Indeterminate(text.to_string())
        }
    }

    /// Whether a claim recorded under the probed PID must be respected.
    ///
    /// Indeterminate probes fail closed.
    pub fn blocks_claim(&self) -> bool {
        !matches!(self, ProbeOutcome::NotAlive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn status_from_raw(raw: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(raw)
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_exit_codes() {
        assert_eq!(ExitOutcome::classify(status_from_raw(0)), ExitOutcome::Success);
        assert_eq!(
            ExitOutcome::classify(status_from_raw(1 << 8)),
            ExitOutcome::HandledByChild
        );
        assert_eq!(
            ExitOutcome::classify(status_from_raw(2 << 8)),
            ExitOutcome::Failed(2)
        );
        assert_eq!(
            ExitOutcome::classify(status_from_raw(9)),
            ExitOutcome::Signaled(9)
        );
    }

    #[test]
    fn test_into_result() {
        assert!(ExitOutcome::Success.into_result().is_ok());
        let err = ExitOutcome::HandledByChild.into_result().unwrap_err();
        assert!(reported_by_child(&err));
        let err = ExitOutcome::Failed(2).into_result().unwrap_err();
        assert!(!reported_by_child(&err));
        assert_eq!(err.to_string(), "exit status 2");
    }

    #[test]
    fn test_probe_text_fallback() {
        assert_eq!(
            ProbeOutcome::from_error_text("os: process already finished"),
            ProbeOutcome::NotAlive
        );
        assert_eq!(
            ProbeOutcome::from_error_text("ESRCH: No such process"),
            ProbeOutcome::NotAlive
        );
        assert!(matches!(
            ProbeOutcome::from_error_text("operation not permitted"),
            ProbeOutcome::Indeterminate(_)
        ));
    }

    #[test]
    fn test_indeterminate_fails_closed() {
        assert!(ProbeOutcome::Alive.blocks_claim());
        assert!(ProbeOutcome::Indeterminate("EINVAL".into()).blocks_claim());
        assert!(!ProbeOutcome::NotAlive.blocks_claim());
    }
}
