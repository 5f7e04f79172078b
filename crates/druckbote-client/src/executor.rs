// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command execution.
//
// The enumeration commands report straight back to the remote peer; DoPrint
// composes fetch -> decode -> dispatch.  Whatever happens, the spooled
// payload and decoder are released before the error (if any) surfaces.

use serde_json::{Map, Value};
use tracing::info;

use druckbote_core::config::ClientConfig;
use druckbote_core::error::Result;
use druckbote_core::types::{CommandKind, DEFAULT_PRINTER_KEY, LOCAL_PRINTERS_KEY, PrintCommand};
use druckbote_document::{PageRasterizer, PdfPageDecoder};
use druckbote_print::{PrintDispatcher, Spooler, printer_roster};

use crate::fetch::RemoteJobFetcher;

/// Executes one parsed command against the local spooler and remote peer.
pub struct CommandExecutor<S: Spooler, R: PageRasterizer> {
    fetcher: RemoteJobFetcher,
    spooler: S,
    rasterizer: R,
    raster_dpi: u32,
}

impl<S: Spooler, R: PageRasterizer> CommandExecutor<S, R> {
    pub fn new(config: &ClientConfig, spooler: S, rasterizer: R) -> Result<Self> {
        Ok(Self {
            fetcher: RemoteJobFetcher::new(config)?,
            spooler,
            rasterizer,
            raster_dpi: config.raster_dpi,
        })
    }

    pub async fn execute(&self, command: PrintCommand) -> Result<()> {
        info!(kind = %command.kind, url = %command.target_url, "executing command");
        match command.kind {
            CommandKind::GetDefaultPrinter => {
                let name = self.spooler.default_printer().await?;
                let body = report_body(
                    &command.parameters.passthrough,
                    DEFAULT_PRINTER_KEY,
                    Value::String(name),
                );
                self.fetcher.post_report(&command.target_url, &body).await
            }
            CommandKind::GetPrinterList => {
                let roster = printer_roster(&self.spooler).await?;
                let body = report_body(
                    &command.parameters.passthrough,
                    LOCAL_PRINTERS_KEY,
                    Value::Array(roster.into_iter().map(Value::String).collect()),
                );
                self.fetcher.post_report(&command.target_url, &body).await
            }
            CommandKind::DoPrint => {
                let (spool, hint) = self
                    .fetcher
                    .fetch(&command.target_url, &command.parameters.passthrough)
                    .await?;
                let decoder = PdfPageDecoder::open(spool, &self.rasterizer, self.raster_dpi)?;
                let printed = PrintDispatcher::new(&self.spooler)
                    .print(decoder, command.parameters.printer_name.as_deref(), hint)
                    .await?;
                info!(pages = printed, "print command complete");
                Ok(())
            }
        }
    }
}

/// The report-back JSON object: the original passthrough parameters with
/// the result appended under its dedicated key, order preserved.
fn report_body(
    passthrough: &Map<String, Value>,
    key: &str,
    value: Value,
) -> Map<String, Value> {
    let mut body = passthrough.clone();
    body.insert(key.to_string(), value);
    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
