// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Druckbote.

use thiserror::Error;

/// Top-level error type for all Druckbote operations.
///
/// Every stage of the bridge fails fast: a variant is raised at the point of
/// failure after the stage has released whatever resource it held.  The only
/// soft fallbacks in the system (a missing or unparseable paper-size hint,
/// unknown trailing invocation tokens) never pass through here.
#[derive(Debug, Error)]
pub enum DruckboteError {
    // -- Invocation parsing --
    #[error("malformed command invocation: {0}")]
    MalformedCommand(String),

    #[error("unknown command kind: {0:?}")]
    UnknownCommandKind(String),

    // -- Remote protocol --
    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),

    // -- Document decoding --
    #[error("document decode failed: {0}")]
    DocumentDecode(String),

    // -- Print output --
    #[error("print dispatch failed: {0}")]
    PrintDispatch(String),

    #[error("spooler query failed: {0}")]
    Spooler(String),

    // -- Service / configuration --
    #[error("listener service error: {0}")]
    Listener(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Passthroughs --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DruckboteError>;
