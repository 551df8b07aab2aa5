//! `execwarden run`

use super::parser::RunArgs;
use crate::config::Settings;
use crate::environment::Environment;
use crate::error::GuardError;
use crate::guard::InstanceGuard;
use crate::runner::ProcessRunner;
use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};

pub fn execute(args: RunArgs, settings: &Settings) -> Result<ExitCode> {
    let guard = args
        .pid_file
        .clone()
        .or_else(|| settings.pid_file())
        .map(InstanceGuard::new);

    if let Some(guard) = &guard {
        match guard.claim() {
            Ok(_) => {}
            Err(err @ (GuardError::Conflict { .. } | GuardError::Unparseable { .. })) => {
                eprintln!("{}: {}", err.category().display_name(), err);
                return Ok(ExitCode::from(1));
            }
            Err(err) => return Err(err.into()),
        }
    }

    let result = run_command(&args, settings);

    if let Some(guard) = &guard {
        if let Err(err) = guard.release() {
            warn!("failed to release {}: {}", guard.path().display(), err);
        }
    }

    result
}

fn run_command(args: &RunArgs, settings: &Settings) -> Result<ExitCode> {
    let (program, rest) = args
        .command
        .split_first()
        .context("no command given")?;
    let input = read_input(args.input.as_deref())?;
    let env = if args.clean_env {
        Environment::empty()
    } else {
        settings.environment()
    };

    let execution = ProcessRunner::new(program, rest, env)
        .with_error_template(settings.error.clone())
        .invoke_with_input(&input);
    let status = execution.status_code();
    info!(command = execution.command_line(), %status, "run complete");

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&execution.response_body())
        .context("failed to write response body")?;
    stdout.flush()?;

    if args.show_status {
        eprintln!("{}", status);
    }

    Ok(if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        None => Ok(Vec::new()),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
    }
}
