// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temp-file-backed spool for a fetched print-job payload.
//
// The fetch side fills the spool chunk by chunk, so the client never holds
// the whole document in one allocation.  Whoever owns the spool owns the
// backing file; dropping it on any path (success, error, abandonment)
// removes the file.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use druckbote_core::error::Result;

/// An exclusively-owned byte spool for one print-job payload.
#[derive(Debug)]
pub struct JobSpool {
    file: NamedTempFile,
    len: u64,
}

impl JobSpool {
    /// Create an empty spool backed by a fresh temp file.
    pub fn new() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("druckbote-job-")
            .suffix(".pdf")
            .tempfile()?;
        debug!(path = %file.path().display(), "job spool created");
        Ok(Self { file, len: 0 })
    }

    /// Append one chunk of the payload.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.as_file_mut().write_all(chunk)?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// Flush buffered bytes to disk.  Call once after the last chunk.
    pub fn finish(&mut self) -> Result<()> {
        self.file.as_file_mut().flush()?;
        debug!(bytes = self.len, "job spool complete");
        Ok(())
    }

    /// Total bytes spooled so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Path of the backing file, valid for the lifetime of the spool.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
