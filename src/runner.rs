//! Single-shot process runner
//!
//! A [`ProcessRunner`] owns one external command invocation from spawn to
//! exit: it feeds stdin through a caller callback, captures stdout and stderr
//! in full and turns the outcome into either the child's own output or a
//! structured error payload.

use crate::environment::Environment;
use crate::error::{ExecError, Stream};
use crate::outcome::{self, ExitOutcome};
use crate::payload::{ErrorPayload, ErrorTemplate};
use crate::status::StatusCode;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;
use tracing::{debug, warn};

pub struct ProcessRunner {
    program: OsString,
    args: Vec<OsString>,
    env: Environment,
    template: ErrorTemplate,
}

impl ProcessRunner {
    pub fn new<P, I, A>(program: P, args: I, env: Environment) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env,
            template: ErrorTemplate::default(),
        }
    }

    pub fn with_error_template(mut self, template: ErrorTemplate) -> Self {
        self.template = template;
        self
    }

    /// Program and arguments joined by spaces, for logs
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command once.
    ///
    /// `write_input` receives the child's stdin; its own write errors are not
    /// recorded. Stdin is closed when it returns. The call blocks until the
    /// child exits.
    ///
    /// Output is only drained after stdin is closed. A child that echoes
    /// more than a pipe buffer (64 KiB on Linux) before it has read all of
    /// its input will block on its stdout while `write_input` blocks on
    /// stdin. Children that read to EOF before writing take any input size.
    pub fn invoke<F>(self, write_input: F) -> Execution
    where
        F: FnOnce(&mut ChildStdin),
    {
        let command_line = self.command_line();
        let mut captured = Captured::default();
        let run_error = self.run(write_input, &mut captured).err();

        match &run_error {
            None => debug!(command = %command_line, "process finished"),
            Some(err) => debug!(command = %command_line, error = %err, "process failed"),
        }

        Execution {
            command_line,
            stdout: captured.stdout,
            stderr: captured.stderr,
            run_error,
            template: self.template,
        }
    }

    /// Run the command once, writing `input` to its stdin.
    ///
    /// Subject to the same pipe buffer limit as [`ProcessRunner::invoke`]
    /// when the child streams its input back while reading it.
    pub fn invoke_with_input(self, input: &[u8]) -> Execution {
        self.invoke(|stdin| {
            if let Err(err) = stdin.write_all(input) {
                debug!("stdin write stopped early: {}", err);
            }
        })
    }

    fn run<F>(&self, write_input: F, captured: &mut Captured) -> Result<(), ExecError>
    where
        F: FnOnce(&mut ChildStdin),
    {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.env.apply(&mut command);

        let child = command.spawn().map_err(|source| ExecError::Spawn {
            command: self.program.to_string_lossy().into_owned(),
            source,
        })?;
        let mut child = ChildGuard::new(child);
        debug!(pid = child.id(), command = %self.command_line(), "started process");

        let Pipes {
            mut stdin,
            stdout,
            stderr,
        } = Pipes::take(child.inner())?;

        write_input(&mut stdin);
        close_input(stdin)?;

        drain(stdout, stderr, captured)?;

        let status = child.wait().map_err(ExecError::Wait)?;
        ExitOutcome::classify(status).into_result()
    }
}

#[derive(Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

struct Pipes {
    stdin: ChildStdin,
    stdout: ChildStdout,
    stderr: ChildStderr,
}

impl Pipes {
    fn take(child: &mut Child) -> Result<Self, ExecError> {
        let stdin = child.stdin.take().ok_or(ExecError::PipeUnavailable {
            stream: Stream::Stdin,
        })?;
        let stdout = child.stdout.take().ok_or(ExecError::PipeUnavailable {
            stream: Stream::Stdout,
        })?;
        let stderr = child.stderr.take().ok_or(ExecError::PipeUnavailable {
            stream: Stream::Stderr,
        })?;
        Ok(Self {
            stdin,
            stdout,
            stderr,
        })
    }
}

fn close_input(mut stdin: ChildStdin) -> Result<(), ExecError> {
    stdin.flush().map_err(ExecError::InputClose)?;
    drop(stdin);
    Ok(())
}

/// Read both streams to end-of-stream.
///
/// Stderr is read on a scoped thread so a child filling one pipe never
/// stalls on the other. A stdout failure takes precedence over a stderr one.
fn drain(
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    captured: &mut Captured,
) -> Result<(), ExecError> {
    let Captured {
        stdout: out_buf,
        stderr: err_buf,
    } = captured;

    let (out_result, err_result) = thread::scope(|scope| {
        let err_reader = scope.spawn(|| stderr.read_to_end(err_buf));
        let out_result = stdout.read_to_end(out_buf);
        let err_result = err_reader
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));
        (out_result, err_result)
    });

    out_result.map_err(|source| ExecError::Drain {
        stream: Stream::Stdout,
        source,
    })?;
    err_result.map_err(|source| ExecError::Drain {
        stream: Stream::Stderr,
        source,
    })?;
    Ok(())
}

/// Kills and reaps the child unless it was waited on.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn id(&self) -> u32 {
        self.child.id()
    }

    fn inner(&mut self) -> &mut Child {
        &mut self.child
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(err) = self.child.kill() {
            debug!(pid = self.child.id(), "kill after failed run: {}", err);
        }
        let _ = self.child.wait();
    }
}

/// Result of one [`ProcessRunner`] invocation
#[derive(Debug)]
pub struct Execution {
    command_line: String,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    run_error: Option<ExecError>,
    template: ErrorTemplate,
}

impl Execution {
    pub fn is_success(&self) -> bool {
        self.run_error.is_none()
    }

    pub fn run_error(&self) -> Option<&ExecError> {
        self.run_error.as_ref()
    }

    /// Run error text, empty on success
    pub fn error_message(&self) -> String {
        self.run_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_success() {
            StatusCode::Ok
        } else {
            StatusCode::BadRequest
        }
    }

    /// Captured stdout on success, otherwise the serialized error payload
    pub fn response_body(&self) -> Vec<u8> {
        if self.is_success() {
            self.stdout.clone()
        } else {
            self.build_error_payload().to_pretty_bytes()
        }
    }

    /// Build the failure payload.
    ///
    /// Exit status 1 means the child wrote its own error document to stderr,
    /// which becomes `details`. Any other failure replaces the message with
    /// the run error and logs both captured streams.
    pub fn build_error_payload(&self) -> ErrorPayload {
        let payload = ErrorPayload::from_template(&self.template);
        let Some(err) = &self.run_error else {
            return payload;
        };

        if outcome::reported_by_child(err) {
            return payload.with_child_details(&self.stderr);
        }

        warn!(
            command = %self.command_line,
            category = err.category().display_name(),
            "stdout: {}",
            String::from_utf8_lossy(&self.stdout)
        );
        warn!(
            command = %self.command_line,
            category = err.category().display_name(),
            "stderr: {}",
            String::from_utf8_lossy(&self.stderr)
        );
        payload.with_message(err.to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> ProcessRunner {
        ProcessRunner::new("sh", ["-c", script], Environment::inherit())
    }

    #[test]
    fn test_command_line() {
        let runner = ProcessRunner::new("echo", ["a", "b"], Environment::empty());
        assert_eq!(runner.command_line(), "echo a b");
    }

    #[test]
    fn test_captures_both_streams() {
        let execution = sh("printf out; printf err >&2").invoke(|_| {});
        assert!(execution.is_success());
        assert_eq!(execution.stdout(), b"out");
        assert_eq!(execution.stderr(), b"err");
        assert_eq!(execution.error_message(), "");
    }

    #[test]
    fn test_stdin_is_closed_after_callback() {
        let execution = ProcessRunner::new("cat", Vec::<&str>::new(), Environment::inherit())
            .invoke(|stdin| {
                stdin.write_all(b"hello").unwrap();
            });
        assert_eq!(execution.response_body(), b"hello".to_vec());
    }

    #[test]
    fn test_large_stderr_does_not_deadlock() {
        let execution =
            sh("head -c 262144 /dev/zero >&2; head -c 262144 /dev/zero").invoke(|_| {});
        assert!(execution.is_success());
        assert_eq!(execution.stdout().len(), 262144);
        assert_eq!(execution.stderr().len(), 262144);
    }

    #[test]
    fn test_signal_is_recorded() {
        let execution = sh("kill -9 $$").invoke(|_| {});
        assert!(matches!(execution.run_error(), Some(ExecError::Signaled(9))));
        assert_eq!(execution.status_code(), StatusCode::BadRequest);
    }

    #[test]
    fn test_environment_is_explicit() {
        let execution = ProcessRunner::new(
            "/bin/sh",
            ["-c", "printf \"$ONLY_VAR:$HOME\""],
            Environment::empty().with("ONLY_VAR", "x"),
        )
        .invoke(|_| {});
        assert_eq!(execution.stdout(), b"x:");
    }

    #[test]
    fn test_custom_template() {
        let template = ErrorTemplate {
            name: "script_error".to_string(),
            url: "https://example.invalid/errors".to_string(),
            message: "script failed".to_string(),
        };
        let execution = sh("exit 1").with_error_template(template).invoke(|_| {});
        let payload = execution.build_error_payload();
        assert_eq!(payload.name, "script_error");
        assert_eq!(payload.message, "script failed");
    }
}
