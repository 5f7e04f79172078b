// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote -- local spooler access and multi-page print dispatch.

pub mod dispatch;
pub mod media;
pub mod spooler;

pub use dispatch::PrintDispatcher;
pub use spooler::{CupsSpooler, Spooler, printer_roster};
