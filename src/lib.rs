//! Execwarden Library
//!
//! Runs one external command per invocation with full output capture and a
//! structured error payload on failure, plus a PID-file guard that keeps a
//! second instance of a long-running process from starting.

pub mod commands;
pub mod config;
pub mod environment;
pub mod error;
pub mod guard;
pub mod outcome;
pub mod payload;
pub mod platform;
pub mod runner;
pub mod status;
pub mod utils;

pub use crate::config::Settings;
pub use environment::Environment;
pub use error::{ErrorCategory, ExecError, GuardError, Stream};
pub use guard::{check_pid, InstanceGuard};
pub use outcome::{ExitOutcome, ProbeOutcome};
pub use payload::{ErrorPayload, ErrorTemplate};
pub use runner::{Execution, ProcessRunner};
pub use status::StatusCode;
