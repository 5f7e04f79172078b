// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization seam.
//
// Turning one PDF page into pixels is the single platform-dependent step of
// the decode pipeline, so it sits behind a trait.  The production
// implementation shells out to poppler's `pdftoppm` one page at a time;
// tests substitute an in-memory fake.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use tracing::debug;

use druckbote_core::error::{DruckboteError, Result};

/// Renders a single page of an on-disk PDF document to pixels.
pub trait PageRasterizer {
    /// Rasterize `page_number` (1-indexed) of `document` at `dpi`.
    fn rasterize(&self, document: &Path, page_number: u32, dpi: u32) -> Result<RgbImage>;
}

impl<T: PageRasterizer> PageRasterizer for &T {
    fn rasterize(&self, document: &Path, page_number: u32, dpi: u32) -> Result<RgbImage> {
        (**self).rasterize(document, page_number, dpi)
    }
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    /// Path or name of the pdftoppm executable.
    tool: PathBuf,
}

impl PopplerRasterizer {
    pub fn new() -> Self {
        Self {
            tool: PathBuf::from("pdftoppm"),
        }
    }

    /// Use a specific pdftoppm binary instead of resolving via PATH.
    pub fn with_tool(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PopplerRasterizer {
    fn rasterize(&self, document: &Path, page_number: u32, dpi: u32) -> Result<RgbImage> {
        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join("page");
        let page = page_number.to_string();

        debug!(
            document = %document.display(),
            page = page_number,
            dpi,
            "rasterizing page via pdftoppm"
        );

        let output = Command::new(&self.tool)
            .arg("-png")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &page, "-l", &page])
            .arg(document)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                DruckboteError::DocumentDecode(format!(
                    "cannot run {}: {e}",
                    self.tool.display()
                ))
            })?;

        if !output.status.success() {
            return Err(DruckboteError::DocumentDecode(format!(
                "pdftoppm failed on page {page_number}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // pdftoppm pads the page number in the output name depending on the
        // document's page count, so locate the one PNG it produced instead
        // of guessing the suffix.
        let produced = std::fs::read_dir(out_dir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|p| p.extension().is_some_and(|ext| ext == "png"))
            .ok_or_else(|| {
                DruckboteError::DocumentDecode(format!(
                    "pdftoppm produced no output for page {page_number}"
                ))
            })?;

        let img = image::open(&produced)
            .map_err(|e| {
                DruckboteError::DocumentDecode(format!(
                    "cannot read rasterized page {page_number}: {e}"
                ))
            })?
            .to_rgb8();

        Ok(img)
    }
}
