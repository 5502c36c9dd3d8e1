//! `lstk services`: List the well-known services.

use clap::Args;
use localstack_sdk::service::{ServiceCatalog, ServiceDescriptor};

use crate::output;

/// Arguments for the `services` command.
#[derive(Args, Debug)]
pub struct ServicesArgs {
    /// Print names only, comma-separated.
    #[arg(long)]
    pub names: bool,
}

/// Executes the `services` command.
///
/// # Errors
///
/// Never fails; the signature matches the other commands.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(args: &ServicesArgs) -> anyhow::Result<()> {
    let catalog = ServiceCatalog::global();
    if args.names {
        let names: Vec<&str> = catalog.iter().map(ServiceDescriptor::name).collect();
        println!("{}", names.join(","));
        return Ok(());
    }

    println!("{:<14} {:<6}", "SERVICE", "PORT");
    for service in catalog.iter() {
        println!("{}", output::service_row(service.name(), service.port()));
    }
    Ok(())
}
