// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Invocation-string decoding and command parsing.
//
// The browser hands the registered URI handler one encoded argument, e.g.
//
//   webprint%3ADoPrint%20http%3A%2F%2Fhost%2Fjob%3FPrinterName%3DHP1
//
// which decodes to `webprint:DoPrint http://host/job?PrinterName=HP1`.
// The scheme prefix is stripped through the first `:`, the rest parses as
// `<kind> <url>?<query>`.

use percent_encoding::percent_decode_str;
use tracing::debug;

use druckbote_core::error::{DruckboteError, Result};
use druckbote_core::types::{JobParameters, PrintCommand};

/// Undo the outer transport encoding of the invocation argument: `+` as
/// space, percent-escapes, then the scheme prefix up to and including the
/// first `:`.
pub fn decode_invocation(raw: &str) -> String {
    let plussed = raw.replace('+', " ");
    let decoded = percent_decode_str(&plussed).decode_utf8_lossy().into_owned();
    match decoded.find(':') {
        Some(colon) => decoded[colon + 1..].to_string(),
        None => decoded,
    }
}

/// Parses a decoded invocation string into a [`PrintCommand`].
pub struct CommandParser;

impl CommandParser {
    /// Split the invocation into positional tokens and build the command.
    ///
    /// Token 0 is the command kind; an unrecognized kind is a hard
    /// [`DruckboteError::UnknownCommandKind`], never a silent default.
    /// Token 1 is the target URL, whose query string becomes the parameter
    /// mapping (split on `&`, then on the first `=`; keys are not decoded
    /// further).  The printer-name parameter is consumed into
    /// [`JobParameters::printer_name`] here.  Tokens beyond the URL are
    /// ignored.
    pub fn parse(decoded: &str) -> Result<PrintCommand> {
        let mut tokens = decoded.split_whitespace();

        let kind = tokens
            .next()
            .ok_or_else(|| DruckboteError::MalformedCommand("empty invocation".into()))?
            .parse()?;

        let url_token = tokens.next().ok_or_else(|| {
            DruckboteError::MalformedCommand(format!("no target URL after {kind:?}"))
        })?;

        if tokens.next().is_some() {
            debug!("ignoring trailing invocation tokens");
        }

        let (target_url, query) = match url_token.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url_token, ""),
        };

        let mut parameters = JobParameters::default();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            // First `=` wins; a bare key carries an empty value.
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            parameters.insert(key, value);
        }

        Ok(PrintCommand {
            kind,
            target_url: target_url.to_string(),
            parameters,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
