// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote -- fetched-job spooling and lazy PDF-to-image decoding.

pub mod decoder;
pub mod raster;
pub mod spool;

pub use decoder::{PageImage, PdfPageDecoder};
pub use raster::{PageRasterizer, PopplerRasterizer};
pub use spool::JobSpool;
