// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote client -- invocation parsing, remote job fetch, and command
// execution.

pub mod command;
pub mod executor;
pub mod fetch;

pub use command::{CommandParser, decode_invocation};
pub use executor::CommandExecutor;
pub use fetch::RemoteJobFetcher;
