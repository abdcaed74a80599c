//! Parsewright CLI - generate and verify bank statement parsers.

use anyhow::{Context, Result};
use clap::Parser;
use parsewright_cli::{commands, Cli, Command, Config, Formatter};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "command failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let (config, source) = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    match &source {
        Some(path) => debug!(path = %path.display(), "loaded configuration"),
        None => debug!("no configuration file found, using defaults"),
    }

    let formatter = Formatter::new(cli.format, !cli.no_color);

    match cli.command {
        Command::Run(args) => {
            let target = args.target.target.clone();
            commands::execute_run(args, &config, &formatter)
                .await
                .with_context(|| format!("run for '{}' failed", target))
        }
        Command::Check(args) => {
            let target = args.target.clone();
            commands::execute_check(args, &config, &formatter)
                .await
                .with_context(|| format!("check for '{}' failed", target))
        }
        Command::Show(args) => {
            commands::execute_show(args, &config, &formatter).context("show failed")?;
            Ok(true)
        }
        Command::Profiles => {
            commands::execute_profiles(&config, &formatter).context("listing profiles failed")?;
            Ok(true)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
