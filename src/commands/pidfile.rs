//! `execwarden claim` / `execwarden release`

use crate::error::GuardError;
use crate::guard::InstanceGuard;
use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;

pub fn claim(pid_file: PathBuf) -> Result<ExitCode> {
    match InstanceGuard::new(pid_file).claim() {
        Ok(pid) => {
            println!("{}", pid);
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ (GuardError::Conflict { .. } | GuardError::Unparseable { .. })) => {
            eprintln!("{}: {}", err.category().display_name(), err);
            Ok(ExitCode::from(1))
        }
        Err(err) => Err(err.into()),
    }
}

pub fn release(pid_file: PathBuf) -> Result<ExitCode> {
    let guard = InstanceGuard::new(pid_file);
    if guard.release()? {
        println!("released {}", guard.path().display());
    } else {
        println!("{} not held by pid {}", guard.path().display(), guard.pid());
    }
    Ok(ExitCode::SUCCESS)
}
