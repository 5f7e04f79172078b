// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client and service configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DruckboteError, Result};
use crate::types::PaperSize;

/// Settings for the client binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Bound connect/read timeout for the job fetch and report-back
    /// requests, in seconds.  There is no retry on timeout.
    pub request_timeout_secs: u64,
    /// Resolution used when rasterizing fetched PDF pages.
    pub raster_dpi: u32,
    /// The local CUPS endpoint driving the physical printers.
    pub cups_uri: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            raster_dpi: 300,
            cups_uri: "ipp://localhost:631".into(),
        }
    }
}

/// Settings for the listener service binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address to bind the listener on.
    pub bind: String,
    /// TCP port to listen on.
    pub port: u16,
    /// The PDF document streamed back for print-job requests.
    pub document: PathBuf,
    /// Paper size advertised for that document via the response header.
    pub paper_size: PaperSize,
    /// Ceiling on concurrently running request handlers.
    pub max_workers: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 11223,
            document: PathBuf::from("documents/report.pdf"),
            paper_size: PaperSize::a4(),
            max_workers: 32,
        }
    }
}

impl ServiceConfig {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(DruckboteError::Config(
                "max_workers must be at least 1".into(),
            ));
        }
        if self.paper_size.is_degenerate() {
            return Err(DruckboteError::Config(format!(
                "degenerate paper size {}",
                self.paper_size
            )));
        }
        Ok(())
    }
}
