//! `lstk up`: Start LocalStack and print client environment variables.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use localstack_common::config::HarnessConfig;
use localstack_runtime::backend::DockerCliRuntime;
use localstack_sdk::builder::LocalStackBuilder;
use localstack_sdk::container::LocalStackContainer;
use localstack_sdk::service::ServiceDescriptor;
use tokio::sync::Notify;

use crate::output;

/// Lines of container output shown when startup fails.
const FAILURE_LOG_LINES: usize = 20;

/// Arguments for the `up` command.
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Service to enable; repeat or comma-separate for several.
    #[arg(short, long = "service", value_delimiter = ',')]
    pub services: Vec<ServiceDescriptor>,

    /// Region LocalStack reports.
    #[arg(long)]
    pub region: Option<String>,

    /// Image to run instead of the pinned LocalStack release.
    #[arg(long)]
    pub image: Option<String>,

    /// Also publish each service's legacy port.
    #[arg(long)]
    pub expose_service_ports: bool,

    /// Seconds to wait for readiness.
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Leave the container running and exit.
    #[arg(short, long)]
    pub detach: bool,
}

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// How a startup attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Startup {
    Ready,
    Interrupted,
}

/// Executes the `up` command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or LocalStack does not
/// become ready.
pub async fn execute(args: UpArgs, config: HarnessConfig) -> anyhow::Result<()> {
    let started_at = Instant::now();
    let runtime = Arc::new(DockerCliRuntime::new(config));
    let mut localstack = builder_from(&args)
        .build_with_runtime(runtime)
        .context("invalid LocalStack configuration")?;

    eprintln!();
    eprintln!("  {BOLD}LocalStack{RESET} {DIM}lstk v{}{RESET}", env!("CARGO_PKG_VERSION"));

    let shutdown = install_shutdown_signal()?;
    if start_or_dispose(&mut localstack, &shutdown).await? == Startup::Interrupted {
        anyhow::bail!("interrupted before LocalStack became ready");
    }

    eprintln!(
        "  {GREEN}{BOLD}Ready{RESET} in {:.1}s",
        started_at.elapsed().as_secs_f64()
    );
    eprintln!();
    for line in output::export_lines(
        &localstack.endpoint()?,
        localstack.access_key_id(),
        localstack.access_secret_key(),
        localstack.default_region()?,
    ) {
        println!("{line}");
    }

    if args.detach {
        if let Some(id) = localstack.id() {
            eprintln!();
            eprintln!(
                "  Running detached as {BOLD}{id}{RESET} {DIM}(created {}){RESET}. Remove it with {BOLD}docker rm -f {id}{RESET}.",
                localstack.created_at()
            );
        }
        return Ok(());
    }

    wait_for_shutdown(&shutdown).await;
    eprintln!("  Removing LocalStack...");
    localstack.dispose().await?;
    eprintln!("  {GREEN}Removed.{RESET}");
    Ok(())
}

fn builder_from(args: &UpArgs) -> LocalStackBuilder {
    let mut builder = LocalStackBuilder::new()
        .with_service_port_exposure(args.expose_service_ports)
        .with_services(args.services.iter().cloned())
        .with_startup_timeout(Duration::from_secs(args.timeout));
    if let Some(region) = &args.region {
        builder = builder.with_default_region(region);
    }
    if let Some(image) = &args.image {
        builder = builder.with_image(image);
    }
    builder
}

async fn report_failure_logs(localstack: &LocalStackContainer) {
    match localstack.logs().await {
        Ok(logs) if !logs.is_empty() => {
            eprintln!("  {DIM}Last output:{RESET}");
            for line in logs.tail(FAILURE_LOG_LINES) {
                eprintln!("    {DIM}{line}{RESET}");
            }
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "could not read container output"),
    }
}

/// Installs the Ctrl+C handler. Each interrupt stores a wakeup on the
/// returned notifier, so a signal received before anyone waits is kept.
fn install_shutdown_signal() -> anyhow::Result<Arc<Notify>> {
    let shutdown = Arc::new(Notify::new());
    let notifier = Arc::clone(&shutdown);
    ctrlc::set_handler(move || notifier.notify_one())
        .context("failed to set Ctrl+C handler")?;
    Ok(shutdown)
}

/// Starts LocalStack unless `shutdown` fires first. The container is
/// removed when startup fails or is interrupted.
async fn start_or_dispose(
    localstack: &mut LocalStackContainer,
    shutdown: &Notify,
) -> anyhow::Result<Startup> {
    let outcome = tokio::select! {
        biased;
        result = localstack.start() => Some(result),
        () = shutdown.notified() => None,
    };

    match outcome {
        Some(Ok(())) => Ok(Startup::Ready),
        Some(Err(e)) => {
            eprintln!("  {RED}LocalStack failed to start:{RESET} {e}");
            report_failure_logs(localstack).await;
            dispose_quietly(localstack).await;
            Err(e.into())
        }
        None => {
            eprintln!();
            eprintln!("  Interrupted, removing LocalStack...");
            dispose_quietly(localstack).await;
            Ok(Startup::Interrupted)
        }
    }
}

async fn dispose_quietly(localstack: &mut LocalStackContainer) {
    if let Err(e) = localstack.dispose().await {
        tracing::warn!(error = %e, "failed to remove container");
    }
}

async fn wait_for_shutdown(shutdown: &Notify) {
    eprintln!();
    eprintln!("  Press {BOLD}Ctrl+C{RESET} to stop LocalStack...");
    shutdown.notified().await;
    eprintln!();
}
