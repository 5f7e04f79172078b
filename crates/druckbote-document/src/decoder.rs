// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lazy PDF-to-image decoding.
//
// The decoder owns the spooled payload and hands out one rasterized page at
// a time: a consumer that stops after K pages never pays for page K+1, and
// dropping the decoder at any point removes the spooled file.  The sequence
// is a single forward pass -- it is consumed by value and cannot be
// restarted.

use image::RgbImage;
use lopdf::Document;
use tracing::{debug, info};

use druckbote_core::error::{DruckboteError, Result};

use crate::raster::PageRasterizer;
use crate::spool::JobSpool;

/// One rasterized page, produced on demand and not retained afterwards.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Raster pixels, row-major RGB.
    pub pixels: RgbImage,
    /// Declared pixel width.
    pub width: u32,
    /// Declared pixel height.
    pub height: u32,
    /// Resolution the page was rasterized at.
    pub dpi: u32,
}

impl PageImage {
    pub fn new(pixels: RgbImage, dpi: u32) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            pixels,
            width,
            height,
            dpi,
        }
    }
}

/// Demand-driven page sequence over a spooled PDF payload.
///
/// Implements `Iterator<Item = Result<PageImage>>`, bounded by the page
/// count declared in the document.  A corrupt page surfaces
/// [`DruckboteError::DocumentDecode`] when that page is reached; pages
/// already produced stay valid.  After an error the sequence is fused.
pub struct PdfPageDecoder<R: PageRasterizer> {
    spool: JobSpool,
    rasterizer: R,
    dpi: u32,
    page_count: u32,
    /// Next page to rasterize, 1-indexed; `page_count + 1` once exhausted.
    next_page: u32,
}

impl<R: PageRasterizer> PdfPageDecoder<R> {
    /// Take ownership of the spool and validate the document structure.
    ///
    /// An unreadable document fails here, before any page is produced.
    pub fn open(spool: JobSpool, rasterizer: R, dpi: u32) -> Result<Self> {
        let document = Document::load(spool.path()).map_err(|e| {
            DruckboteError::DocumentDecode(format!("unreadable PDF payload: {e}"))
        })?;
        let page_count = document.get_pages().len() as u32;
        info!(pages = page_count, bytes = spool.len(), "PDF payload opened");

        Ok(Self {
            spool,
            rasterizer,
            dpi,
            page_count,
            next_page: 1,
        })
    }

    /// Number of pages the document declares.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Pages not yet produced.
    pub fn remaining(&self) -> u32 {
        self.page_count.saturating_sub(self.next_page - 1)
    }
}

impl<R: PageRasterizer> Iterator for PdfPageDecoder<R> {
    type Item = Result<PageImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_page > self.page_count {
            return None;
        }
        let page = self.next_page;
        self.next_page += 1;

        match self
            .rasterizer
            .rasterize(self.spool.path(), page, self.dpi)
        {
            Ok(pixels) => {
                let image = PageImage::new(pixels, self.dpi);
                debug!(page, width = image.width, height = image.height, "page decoded");
                Some(Ok(image))
            }
            Err(e) => {
                // Fuse the sequence: a failed page ends the pass.
                self.next_page = self.page_count + 1;
                Some(Err(DruckboteError::DocumentDecode(format!(
                    "page {page}: {e}"
                ))))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
