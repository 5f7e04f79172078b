// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote client entry point.
//
// Invoked by the registered URI-scheme handler with a single encoded
// argument.  One command per process: parse, execute, exit.  Outcomes reach
// the remote peer via the report-back POST; the shell only sees the exit
// status.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use druckbote_client::command::{CommandParser, decode_invocation};
use druckbote_client::executor::CommandExecutor;
use druckbote_core::config::ClientConfig;
use druckbote_core::error::Result;
use druckbote_document::PopplerRasterizer;
use druckbote_print::CupsSpooler;

/// Druckbote - remote print bridge client
#[derive(Parser, Debug)]
#[command(name = "druckbote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Encoded invocation string, as passed by the URI-scheme handler.
    invocation: String,

    /// Request timeout in seconds for fetch and report-back.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Rasterization resolution for fetched PDF pages.
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// CUPS endpoint driving the local printers.
    #[arg(long, default_value = "ipp://localhost:631")]
    cups: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig {
        request_timeout_secs: cli.timeout,
        raster_dpi: cli.dpi,
        cups_uri: cli.cups,
    };

    let decoded = decode_invocation(&cli.invocation);
    info!(invocation = %decoded, "druckbote starting");

    let command = CommandParser::parse(&decoded)?;
    let spooler = CupsSpooler::new(&config.cups_uri)?;
    let executor = CommandExecutor::new(&config, spooler, PopplerRasterizer::new())?;
    executor.execute(command).await
}
