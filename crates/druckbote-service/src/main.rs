// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote service entry point.
//
// Binds the listener, then runs until ctrl-c.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use druckbote_core::config::ServiceConfig;
use druckbote_core::error::Result;
use druckbote_core::types::PaperSize;
use druckbote_service::ListenerService;

/// Druckbote - remote print bridge service
#[derive(Parser, Debug)]
#[command(name = "druckbote-service")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Load all settings from a JSON config file (other flags are ignored).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind on.
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 11223)]
    port: u16,

    /// PDF document streamed back for print-job requests.
    #[arg(long, default_value = "documents/report.pdf")]
    document: PathBuf,

    /// Advertised paper size name for that document.
    #[arg(long, default_value = "A4")]
    paper_name: String,

    /// Advertised paper width in millimetres.
    #[arg(long, default_value_t = 210)]
    paper_width: i32,

    /// Advertised paper height in millimetres.
    #[arg(long, default_value_t = 297)]
    paper_height: i32,

    /// Ceiling on concurrently running request handlers.
    #[arg(long, default_value_t = 32)]
    max_workers: usize,
}

impl Cli {
    fn into_config(self) -> Result<ServiceConfig> {
        if let Some(path) = &self.config {
            return ServiceConfig::load(path);
        }
        let config = ServiceConfig {
            bind: self.bind,
            port: self.port,
            document: self.document,
            paper_size: PaperSize::new(self.paper_name, self.paper_width, self.paper_height),
            max_workers: self.max_workers,
        };
        config.validate()?;
        Ok(config)
    }
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
            error!(error = %e, "service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    let mut service = ListenerService::new(config);
    let addr = service.start().await?;
    info!(addr = %addr, "druckbote service started, ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    service.stop().await
}
