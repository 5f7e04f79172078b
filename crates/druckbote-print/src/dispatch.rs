// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-page print dispatch.
//
// Advances the decoded page sequence one element at a time, rendering the
// current page onto the next physical sheet.  The spooler learns whether
// more pages follow from the peeked sequence, so the final page is never
// over- or under-declared.

use std::io::Cursor;

use chrono::Utc;
use tracing::{debug, info, warn};

use druckbote_core::error::{DruckboteError, Result};
use druckbote_core::types::PaperSize;
use druckbote_document::PageImage;

use crate::spooler::Spooler;

/// Feeds a page sequence to the local print spooler, one page per sheet.
pub struct PrintDispatcher<S: Spooler> {
    spooler: S,
}

impl<S: Spooler> PrintDispatcher<S> {
    pub fn new(spooler: S) -> Self {
        Self { spooler }
    }

    /// Print `pages` on `printer_name` (or the platform default) at
    /// `paper_hint` (or the printer's default paper size).
    ///
    /// Resolution order is fixed: explicit argument, then remote hint, then
    /// local default -- and never a zero-sized page.  An empty sequence
    /// performs zero spooler submissions and returns `Ok(0)`.
    ///
    /// Decode failures surface as [`DruckboteError::DocumentDecode`] from
    /// the sequence itself; spooler failures as
    /// [`DruckboteError::PrintDispatch`].  Either way the sequence is
    /// dropped here, which closes its underlying stream.
    pub async fn print<I>(
        &self,
        pages: I,
        printer_name: Option<&str>,
        paper_hint: Option<PaperSize>,
    ) -> Result<u32>
    where
        I: Iterator<Item = Result<PageImage>>,
    {
        let printer = match printer_name {
            Some(name) => name.to_string(),
            None => self.spooler.default_printer().await?,
        };

        let paper = self.resolve_paper_size(&printer, paper_hint).await?;

        let mut pages = pages.peekable();
        if pages.peek().is_none() {
            info!(printer = %printer, "empty page sequence, nothing to print");
            return Ok(0);
        }

        let job_name = format!("druckbote {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
        let job_id = self.spooler.create_job(&printer, &job_name, &paper).await?;
        info!(printer = %printer, job_id, paper = %paper, "print job opened");

        let mut printed = 0u32;
        while let Some(page) = pages.next() {
            let page = page?;
            let png = encode_png(&page)?;
            let last = pages.peek().is_none();
            self.spooler
                .send_page(&printer, job_id, png, last)
                .await?;
            printed += 1;
            debug!(job_id, page = printed, last, "page dispatched");
        }

        info!(printer = %printer, job_id, pages = printed, "print job complete");
        Ok(printed)
    }

    /// Explicit hint wins; otherwise ask the printer.  Degenerate values
    /// are never used.
    async fn resolve_paper_size(
        &self,
        printer: &str,
        hint: Option<PaperSize>,
    ) -> Result<PaperSize> {
        if let Some(size) = hint {
            if !size.is_degenerate() {
                return Ok(size);
            }
            warn!(printer, size = %size, "ignoring degenerate paper-size hint");
        }

        let default = self.spooler.default_paper_size(printer).await?;
        if default.is_degenerate() {
            warn!(printer, size = %default, "printer default paper size unusable, assuming A4");
            return Ok(PaperSize::a4());
        }
        Ok(default)
    }
}

/// Encode one page as PNG for the spooler.
fn encode_png(page: &PageImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    page.pixels
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| DruckboteError::PrintDispatch(format!("PNG encode: {e}")))?;
    Ok(buf.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
