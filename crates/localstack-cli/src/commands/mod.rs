//! CLI command definitions and dispatch.

pub mod check;
pub mod services;
pub mod up;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use localstack_common::config::HarnessConfig;

/// lstk: disposable LocalStack containers for tests.
#[derive(Parser, Debug)]
#[command(name = localstack_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON settings file. Defaults to the LOCALSTACK_TESTKIT_* environment.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start LocalStack and print client environment variables.
    Up(up::UpArgs),
    /// List the well-known services.
    Services(services::ServicesArgs),
    /// Report platform and docker availability.
    Check(check::CheckArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded or the command fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Up(args) => up::execute(args, config).await,
        Command::Services(args) => services::execute(&args),
        Command::Check(args) => check::execute(&args, &config),
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(HarnessConfig::from_env()),
    }
}
