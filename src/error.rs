//! Error types for execwarden
//!
//! Every failure the runner or the instance guard can hit is classified here,
//! with a coarse category used for operator-facing messages.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the three child pipes an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Stdin => "stdin",
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The run error of a single process invocation.
///
/// Only the first failure of an invocation is ever recorded.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{stream} pipe unavailable")]
    PipeUnavailable { stream: Stream },

    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to close stdin: {0}")]
    InputClose(#[source] io::Error),

    #[error("failed to read {stream}: {source}")]
    Drain {
        stream: Stream,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    #[error("exit status {0}")]
    ExitStatus(i32),

    #[error("signal: {0}")]
    Signaled(i32),
}

impl ExecError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExecError::PipeUnavailable { .. } => ErrorCategory::Pipe,
            ExecError::Spawn { .. } => ErrorCategory::Spawn,
            ExecError::InputClose(_) => ErrorCategory::Input,
            ExecError::Drain { .. } => ErrorCategory::Drain,
            ExecError::Wait(_) | ExecError::ExitStatus(_) | ExecError::Signaled(_) => {
                ErrorCategory::Exit
            }
        }
    }

    /// Exit code carried by the error, if the child ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::ExitStatus(code) => Some(*code),
            _ => None,
        }
    }
}

/// Errors raised by the PID-file instance guard
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Pid '{pid}' already exists, will not run")]
    Conflict { pid: u32 },

    #[error("pid file {} holds '{content}' instead of a pid, will not run", path.display())]
    Unparseable { path: PathBuf, content: String },

    #[error("failed to read pid file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write pid file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GuardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GuardError::Conflict { .. } | GuardError::Unparseable { .. } => {
                ErrorCategory::Conflict
            }
            GuardError::Read { .. } | GuardError::Write { .. } => ErrorCategory::Io,
        }
    }

    /// PID of the live competing owner, for conflicts
    pub fn conflicting_pid(&self) -> Option<u32> {
        match self {
            GuardError::Conflict { pid } => Some(*pid),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Invalid setting '{key}': {message}")]
    Invalid { key: String, message: String },
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Pipe,
    Spawn,
    Input,
    Drain,
    Exit,
    Conflict,
    Io,
    Config,
}

impl ErrorCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorCategory::Pipe => "Pipe",
            ErrorCategory::Spawn => "Process Start",
            ErrorCategory::Input => "Input",
            ErrorCategory::Drain => "Output Capture",
            ErrorCategory::Exit => "Process Exit",
            ErrorCategory::Conflict => "Instance Conflict",
            ErrorCategory::Io => "File System",
            ErrorCategory::Config => "Configuration",
        }
    }
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Config
    }
}
