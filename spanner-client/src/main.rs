//! Interactive line client for the spanner MST server.
//!
//! Reads commands from stdin and sends each one as a line over TCP. After a
//! `SolveMST` command the client blocks on one length-framed reply and
//! prints its body; every other command is fire-and-forget, mirroring the
//! server's reply discipline.

use std::{
    io::{self, BufRead, Write},
    net::TcpStream,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;

use spanner_core::read_frame;

/// Drive a spanner MST server from the terminal.
#[derive(Debug, Parser)]
#[command(name = "spanner-client")]
struct Cli {
    /// Server port.
    #[arg(long)]
    port: u16,

    /// Server host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let stream = TcpStream::connect((cli.host.as_str(), cli.port))
        .with_context(|| format!("failed to connect to {}:{}", cli.host, cli.port))?;
    let mut replies = stream
        .try_clone()
        .context("failed to clone the connection")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        let mut writer = &stream;
        writer
            .write_all(command.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .context("failed to send command")?;

        // Only SolveMST produces a reply; the server answers even an
        // unsupported algorithm name with a framed error body.
        if command.split_whitespace().next() == Some("SolveMST") {
            let body = read_frame(&mut replies).context("failed to read reply")?;
            let mut out = stdout.lock();
            out.write_all(&body).context("failed to print reply")?;
            out.flush().context("failed to flush stdout")?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("spanner-client: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
