// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote service -- the peer half of the print-bridge protocol.

pub mod http;
pub mod server;

pub use server::ListenerService;
