use anyhow::Context;
use execwarden::commands::{pidfile, run, Cli, Commands};
use execwarden::config::Settings;
use execwarden::utils::logger::init_logger;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_command();
    match main_impl(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(1)
        }
    }
}

fn main_impl(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    let log_level = cli.log_level.as_deref().or(settings.log_level.as_deref());
    init_logger(log_level, cli.log_file.clone())?;

    match cli.command {
        Commands::Run(args) => run::execute(args, &settings),
        Commands::Claim { pid_file } => pidfile::claim(pid_file),
        Commands::Release { pid_file } => pidfile::release(pid_file),
    }
}
