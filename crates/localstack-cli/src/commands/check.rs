//! `lstk check`: Report platform and docker availability.

use clap::Args;
use localstack_common::config::HarnessConfig;
use localstack_runtime::backend::platform_info;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Exit with an error when docker is missing.
    #[arg(long)]
    pub strict: bool,
}

/// Executes the `check` command.
///
/// # Errors
///
/// With `--strict`, returns an error if the docker binary is not found.
pub fn execute(args: &CheckArgs, config: &HarnessConfig) -> anyhow::Result<()> {
    let info = platform_info(config);
    println!("Platform:  {}/{}", info.os, info.arch);
    println!(
        "Docker:    {} ({})",
        info.docker_binary,
        if info.docker_available { "found" } else { "not found" }
    );
    println!("Host:      {}", info.host);
    println!("Timeout:   {}s per docker command", config.command_timeout_secs);
    println!("Pull:      {}s per image pull", config.pull_timeout_secs);

    if args.strict && !info.docker_available {
        anyhow::bail!("docker binary {:?} is not on PATH", info.docker_binary);
    }
    Ok(())
}
