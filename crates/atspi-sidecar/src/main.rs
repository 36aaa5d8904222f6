//! JSON-RPC sidecar for Linux desktop UI automation
//!
//! Exposes the AT-SPI accessibility tree and input synthesis to a parent
//! process over newline-delimited JSON-RPC on stdin/stdout.

mod actions;
mod active_window;
#[cfg(target_os = "linux")]
mod atspi_backend;
mod backend;
mod config;
mod constants;
mod driver;
mod errors;
mod keys;
mod path;
mod rpc;
mod snapshot;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use config::Cli;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(target_os = "linux")]
fn run(cli: &Cli) -> Result<()> {
    use active_window::HeuristicLocator;
    use anyhow::Context;
    use atspi_backend::AtspiBackend;
    use rpc::Sidecar;

    let backend = AtspiBackend::connect().context("AT-SPI backend unavailable")?;
    let sidecar = Sidecar::new(backend, HeuristicLocator, cli.sidecar_config());

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    sidecar
        .serve(stdin.lock(), &mut stdout)
        .context("JSON-RPC transport failed")?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run(_cli: &Cli) -> Result<()> {
    anyhow::bail!("The AT-SPI sidecar only runs on Linux")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries protocol messages only
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!("Starting atspi-sidecar v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        tracing::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
