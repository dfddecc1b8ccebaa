use crate::dispatcher::RouteTable;
use crate::echo::demo_routes;
use crate::logging;
use crate::runtime_config::RuntimeConfig;
use crate::server::{AgiServer, AgiService, ServerHandle};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for agirouter
#[derive(Parser, Debug)]
#[command(name = "agirouter")]
#[command(about = "FastAGI call router", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the built-in demo routes (`hello`, `echo`)
    Serve {
        /// Address to bind (overrides config file and AGI_BIND_ADDR)
        #[arg(long)]
        addr: Option<String>,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of may worker threads (overrides config file and AGI_WORKERS)
        #[arg(long)]
        workers: Option<usize>,
    },
}

/// Resolve the effective configuration for `serve`.
///
/// # Errors
///
/// Fails when the configuration file cannot be loaded.
pub fn serve_config(
    addr: Option<&str>,
    config: Option<&std::path::Path>,
    workers: Option<usize>,
) -> anyhow::Result<RuntimeConfig> {
    let mut runtime = RuntimeConfig::load(config)?;
    if let Some(addr) = addr {
        runtime.bind_addr = addr.to_string();
    }
    if let Some(workers) = workers.filter(|w| *w > 0) {
        runtime.workers = workers;
    }
    Ok(runtime)
}

/// Start the demo server with `config`.
///
/// # Errors
///
/// Fails when the listener cannot be bound.
pub fn start_demo_server(config: &RuntimeConfig) -> anyhow::Result<ServerHandle> {
    config.apply_to_runtime();

    let mut table = RouteTable::new();
    table.include_router(&demo_routes());
    let service = AgiService::new(table.freeze()).with_raise_on_error(config.raise_on_error);

    let handle = AgiServer::new(service)
        .with_stack_size(config.stack_size)
        .start(config.bind_addr.as_str())
        .with_context(|| format!("binding {}", config.bind_addr))?;
    handle.wait_ready()?;
    Ok(handle)
}

#[cfg(unix)]
fn wait_for_shutdown() -> anyhow::Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> anyhow::Result<()> {
    loop {
        std::thread::park();
    }
}

/// Parse arguments and run the selected command.
///
/// # Errors
///
/// Configuration, logging or server start-up failures.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            addr,
            config,
            workers,
        } => {
            // logging first so configuration warnings are recorded
            logging::init_logging()?;
            let runtime = serve_config(addr.as_deref(), config.as_deref(), workers)?;
            info!(
                bind_addr = %runtime.bind_addr,
                workers = runtime.workers,
                stack_size = runtime.stack_size,
                raise_on_error = runtime.raise_on_error,
                "Starting agirouter"
            );

            let handle = start_demo_server(&runtime)?;
            wait_for_shutdown()?;
            handle.stop();
            Ok(())
        }
    }
}
