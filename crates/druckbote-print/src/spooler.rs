// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local print-spooler access.
//
// The `Spooler` trait is the seam between the bridge and the platform: the
// production implementation talks IPP to a CUPS endpoint, tests substitute
// a fake.  Serialization of the physical printer across jobs is the
// spooler's business, not ours.

use std::io::Cursor;

use ipp::prelude::*;
use tracing::{debug, info, warn};

use druckbote_core::error::{DruckboteError, Result};
use druckbote_core::types::PaperSize;

use crate::media;

/// Access to the platform print spooler.
pub trait Spooler {
    /// Name of the system default printer.
    fn default_printer(&self) -> impl Future<Output = Result<String>>;

    /// Names of all installed printers, in spooler order.
    fn installed_printers(&self) -> impl Future<Output = Result<Vec<String>>>;

    /// The printer's currently configured default paper size.  Never
    /// degenerate; implementations fall back to A4 rather than report a
    /// zero-sized page.
    fn default_paper_size(&self, printer: &str) -> impl Future<Output = Result<PaperSize>>;

    /// Open a print job on the given printer, returning the spooler job id.
    fn create_job(
        &self,
        printer: &str,
        job_name: &str,
        paper: &PaperSize,
    ) -> impl Future<Output = Result<i32>>;

    /// Append one rendered page (PNG bytes) to an open job.  `last` tells
    /// the spooler whether more pages follow; it must be exact.
    fn send_page(
        &self,
        printer: &str,
        job_id: i32,
        png: Vec<u8>,
        last: bool,
    ) -> impl Future<Output = Result<()>>;
}

impl<T: Spooler> Spooler for &T {
    fn default_printer(&self) -> impl Future<Output = Result<String>> {
        (**self).default_printer()
    }

    fn installed_printers(&self) -> impl Future<Output = Result<Vec<String>>> {
        (**self).installed_printers()
    }

    fn default_paper_size(&self, printer: &str) -> impl Future<Output = Result<PaperSize>> {
        (**self).default_paper_size(printer)
    }

    fn create_job(
        &self,
        printer: &str,
        job_name: &str,
        paper: &PaperSize,
    ) -> impl Future<Output = Result<i32>> {
        (**self).create_job(printer, job_name, paper)
    }

    fn send_page(
        &self,
        printer: &str,
        job_id: i32,
        png: Vec<u8>,
        last: bool,
    ) -> impl Future<Output = Result<()>> {
        (**self).send_page(printer, job_id, png, last)
    }
}

/// Installed printers with the default printer first and duplicates
/// removed.  This is the ordered roster reported to the remote peer.
pub async fn printer_roster<S: Spooler>(spooler: &S) -> Result<Vec<String>> {
    let default = spooler.default_printer().await?;
    let mut roster = vec![default];
    for name in spooler.installed_printers().await? {
        if !roster.contains(&name) {
            roster.push(name);
        }
    }
    Ok(roster)
}

// ---------------------------------------------------------------------------
// CUPS/IPP implementation
// ---------------------------------------------------------------------------

/// Spooler backed by a CUPS endpoint via IPP.
///
/// Enumeration uses the CUPS operation extensions (CUPS-Get-Default,
/// CUPS-Get-Printers); job output uses Create-Job followed by per-page
/// Send-Document with the `last-document` flag.
pub struct CupsSpooler {
    /// The CUPS root URI (e.g. `ipp://localhost:631`).
    uri: Uri,
}

impl CupsSpooler {
    pub fn new(uri: &str) -> Result<Self> {
        let parsed: Uri = uri
            .parse()
            .map_err(|e| DruckboteError::Spooler(format!("invalid CUPS URI '{uri}': {e}")))?;
        Ok(Self { uri: parsed })
    }

    /// URI of a named print queue under this CUPS instance.
    fn printer_uri(&self, printer: &str) -> Result<Uri> {
        format!("{}/printers/{}", base_uri(&self.uri), printer)
            .parse()
            .map_err(|e| DruckboteError::Spooler(format!("printer URI for '{printer}': {e}")))
    }

    async fn send_cups(&self, operation: Operation) -> Result<IppRequestResponse> {
        let request =
            IppRequestResponse::new(IppVersion::v1_1(), operation, Some(self.uri.clone()));
        let response = AsyncIppClient::new(self.uri.clone())
            .send(request)
            .await
            .map_err(|e| DruckboteError::Spooler(format!("{operation:?}: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            return Err(DruckboteError::Spooler(format!(
                "{operation:?} returned status {code:?}"
            )));
        }
        Ok(response)
    }
}

impl Spooler for CupsSpooler {
    async fn default_printer(&self) -> Result<String> {
        let response = self.send_cups(Operation::CupsGetDefault).await?;
        printer_names(response.attributes())
            .into_iter()
            .next()
            .ok_or_else(|| {
                DruckboteError::Spooler("CUPS reports no default printer".into())
            })
    }

    async fn installed_printers(&self) -> Result<Vec<String>> {
        let response = self.send_cups(Operation::CupsGetPrinters).await?;
        let names = printer_names(response.attributes());
        debug!(count = names.len(), "installed printers enumerated");
        Ok(names)
    }

    async fn default_paper_size(&self, printer: &str) -> Result<PaperSize> {
        let uri = self.printer_uri(printer)?;
        let operation = IppOperationBuilder::get_printer_attributes(uri.clone()).build();

        let response = AsyncIppClient::new(uri)
            .send(operation)
            .await
            .map_err(|e| DruckboteError::Spooler(format!("Get-Printer-Attributes: {e}")))?;
        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            return Err(DruckboteError::Spooler(format!(
                "Get-Printer-Attributes returned status {code:?}"
            )));
        }

        let keyword = find_attribute(response.attributes(), "media-default");
        match keyword.as_deref().and_then(media::paper_size_from_keyword) {
            Some(size) => Ok(size),
            None => {
                warn!(
                    printer,
                    media_default = keyword.as_deref().unwrap_or("<none>"),
                    "printer reports no usable default media, assuming A4"
                );
                Ok(PaperSize::a4())
            }
        }
    }

    async fn create_job(
        &self,
        printer: &str,
        job_name: &str,
        paper: &PaperSize,
    ) -> Result<i32> {
        let uri = self.printer_uri(printer)?;
        let operation = IppOperationBuilder::create_job(uri.clone())
            .job_name(job_name)
            .attribute(IppAttribute::new(
                "media",
                IppValue::Keyword(media::media_keyword(paper)),
            ))
            .build();

        info!(printer, job_name, media = %media::media_keyword(paper), "sending Create-Job");
        let response = AsyncIppClient::new(uri)
            .send(operation)
            .await
            .map_err(|e| DruckboteError::PrintDispatch(format!("Create-Job: {e}")))?;
        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            return Err(DruckboteError::PrintDispatch(format!(
                "Create-Job returned status {code:?}"
            )));
        }

        extract_job_id(response.attributes()).ok_or_else(|| {
            DruckboteError::PrintDispatch("Create-Job response missing job-id".into())
        })
    }

    async fn send_page(
        &self,
        printer: &str,
        job_id: i32,
        png: Vec<u8>,
        last: bool,
    ) -> Result<()> {
        let uri = self.printer_uri(printer)?;
        let payload = IppPayload::new(Cursor::new(png));
        let operation = IppOperationBuilder::send_document(uri.clone(), job_id, payload)
            .document_format("image/png")
            .last(last)
            .build();

        debug!(printer, job_id, last, "sending Send-Document");
        let response = AsyncIppClient::new(uri)
            .send(operation)
            .await
            .map_err(|e| DruckboteError::PrintDispatch(format!("Send-Document: {e}")))?;
        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            return Err(DruckboteError::PrintDispatch(format!(
                "Send-Document returned status {code:?}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// IPP response helpers
// ---------------------------------------------------------------------------

/// Strip any path/query from a URI, keeping scheme and authority.
fn base_uri(uri: &Uri) -> String {
    let scheme = uri.scheme_str().unwrap_or("ipp");
    let authority = uri
        .authority()
        .map(|a| a.as_str())
        .unwrap_or("localhost:631");
    format!("{scheme}://{authority}")
}

/// All `printer-name` values across the response's printer attribute groups.
fn printer_names(attrs: &IppAttributes) -> Vec<String> {
    attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .filter_map(|group| {
            group
                .attributes()
                .get("printer-name")
                .map(|attr| attr.value().to_string())
        })
        .collect()
}

/// First value of a named attribute anywhere in the response.
fn find_attribute(attrs: &IppAttributes, name: &str) -> Option<String> {
    attrs
        .groups()
        .iter()
        .find_map(|group| group.attributes().get(name))
        .map(|attr| attr.value().to_string())
}

/// The `job-id` integer from a response's job attributes group.
fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value()
        {
            return Some(*id);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
