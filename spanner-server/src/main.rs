//! CLI entry point for the spanner MST compute server.
//!
//! Parses arguments with clap, initialises logging eagerly so every later
//! step can emit structured diagnostics, wires Ctrl-C to the server's
//! shutdown handle, and maps failures to a non-zero exit code.

use std::{num::NonZeroUsize, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use spanner_server::{
    logging::{self, LoggingError},
    server::{ConcurrencyMode, Server, ServerConfig},
};

/// Serve per-client minimum spanning tree computations over TCP.
#[derive(Debug, Parser)]
#[command(name = "spanner-server")]
struct Cli {
    /// TCP port to listen on; 0 selects an ephemeral port.
    #[arg(long)]
    port: u16,

    /// Concurrency core used to deliver SolveMST replies.
    #[arg(long, value_enum, default_value = "pipeline")]
    mode: ConcurrencyMode,

    /// Leader-followers roster size.
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let workers = NonZeroUsize::new(cli.workers).context("--workers must be at least 1")?;

    let config = ServerConfig::new(cli.port)
        .with_mode(cli.mode)
        .with_workers(workers);
    let server = Server::bind(&config).context("failed to start the server")?;

    let handle = server.shutdown_handle();
    ctrlc::set_handler(move || handle.shutdown())
        .context("failed to install the Ctrl-C handler")?;

    server.run().context("server terminated abnormally")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        error!(error = %err, "server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Emit a fallback diagnostic to stderr when tracing initialisation fails.
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialise logging: {err}");
}
