//! Command-line interface definition

use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "execwarden",
    version,
    about = "Run a command once, capture its output and guard against duplicate instances"
)]
pub struct Cli {
    /// Settings file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `execwarden=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command, print its output or an error payload
    Run(RunArgs),

    /// Claim a pid file for this process
    Claim {
        /// Lock file path
        pid_file: PathBuf,
    },

    /// Remove a pid file if this process owns it
    Release {
        /// Lock file path
        pid_file: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Refuse to run while another live process holds this lock file
    #[arg(long)]
    pub pid_file: Option<PathBuf>,

    /// Feed this file to the command's stdin (`-` for our own stdin).
    /// Commands that echo input back before reading all of it are limited
    /// to one pipe buffer (64 KiB on Linux)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Start the command with an empty environment
    #[arg(long)]
    pub clean_env: bool,

    /// Print the status code to stderr after the body
    #[arg(long)]
    pub show_status: bool,

    /// Command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<OsString>,
}

impl Cli {
    pub fn parse_command() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_keeps_command_flags() {
        let cli = Cli::try_parse_from([
            "execwarden",
            "run",
            "--pid-file",
            "/tmp/x.pid",
            "--",
            "sh",
            "-c",
            "exit 2",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.pid_file, Some(PathBuf::from("/tmp/x.pid")));
                assert_eq!(
                    args.command,
                    vec![
                        OsString::from("sh"),
                        OsString::from("-c"),
                        OsString::from("exit 2")
                    ]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_command() {
        assert!(Cli::try_parse_from(["execwarden", "run"]).is_err());
    }
}
