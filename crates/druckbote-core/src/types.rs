// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Druckbote print bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DruckboteError;

/// Wire key under which the client-local printer name travels in a query
/// string.  Consumed into [`JobParameters::printer_name`] at parse time and
/// never echoed back to the remote peer.
pub const PRINTER_NAME_KEY: &str = "PrinterName";

/// Report-back key carrying the default printer name.
pub const DEFAULT_PRINTER_KEY: &str = "DefaultPrinter";

/// Report-back key carrying the ordered installed-printer list.
pub const LOCAL_PRINTERS_KEY: &str = "LocalPrinters";

/// Response header carrying the serialized paper-size hint.
pub const PAPER_SIZE_HEADER: &str = "PaperSize";

/// Millimetres per hundredth of an inch, the platform print-size unit.
const MM_PER_HUNDREDTH_INCH: f64 = 0.254;

// ---------------------------------------------------------------------------
// PaperSize
// ---------------------------------------------------------------------------

/// Physical page dimensions in millimetres.
///
/// Serializes with PascalCase field names to match the wire format of the
/// `PaperSize` response header: `{"Name":"A4","Width":210,"Height":297}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaperSize {
    /// Human-readable size name (e.g. "A4").
    pub name: String,
    /// Width in millimetres.
    pub width: i32,
    /// Height in millimetres.
    pub height: i32,
}

impl PaperSize {
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// ISO A4, the fallback when no usable size is known.
    pub fn a4() -> Self {
        Self::new("A4", 210, 297)
    }

    /// Whether either dimension is zero or negative.  A degenerate size must
    /// never reach the spooler; callers fall back to the printer default or
    /// [`PaperSize::a4`] instead.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Dimensions in the platform print unit (hundredths of an inch),
    /// rounded to nearest.
    pub fn to_hundredths_inch(&self) -> (i32, i32) {
        (
            (f64::from(self.width) / MM_PER_HUNDREDTH_INCH).round() as i32,
            (f64::from(self.height) / MM_PER_HUNDREDTH_INCH).round() as i32,
        )
    }

    /// Build a size from platform-unit dimensions, rounded to nearest
    /// millimetre.  Round-trips with [`PaperSize::to_hundredths_inch`]
    /// within one unit.
    pub fn from_hundredths_inch(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            width: (f64::from(width) * MM_PER_HUNDREDTH_INCH).round() as i32,
            height: (f64::from(height) * MM_PER_HUNDREDTH_INCH).round() as i32,
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]({}, {})", self.name, self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// The operation requested by an invocation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Enumerate installed printers and report them back.
    GetPrinterList,
    /// Report the default printer name back.
    GetDefaultPrinter,
    /// Fetch a PDF job from the peer and print it.
    DoPrint,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetPrinterList => "GetPrinterList",
            Self::GetDefaultPrinter => "GetDefaultPrinter",
            Self::DoPrint => "DoPrint",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = DruckboteError;

    /// An unrecognized token is a hard error, never a silent default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GetPrinterList" => Ok(Self::GetPrinterList),
            "GetDefaultPrinter" => Ok(Self::GetDefaultPrinter),
            "DoPrint" => Ok(Self::DoPrint),
            other => Err(DruckboteError::UnknownCommandKind(other.to_string())),
        }
    }
}

/// The typed boundary for the wire parameter bag.
///
/// Query parameters are decoded into this structure once, at parse time.
/// The printer-name key is diverted into [`JobParameters::printer_name`];
/// everything else stays in `passthrough` in insertion order and is the
/// exact JSON object sent to the remote peer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobParameters {
    /// Locally-consumed target printer, if the invocation named one.
    pub printer_name: Option<String>,
    /// Remaining parameters, forwarded verbatim in request bodies.
    pub passthrough: Map<String, Value>,
}

impl JobParameters {
    /// Insert one decoded query pair.  `PrinterName` never lands in the
    /// passthrough map; a repeated key keeps the last occurrence.
    pub fn insert(&mut self, key: &str, value: &str) {
        if key == PRINTER_NAME_KEY {
            self.printer_name = Some(value.to_string());
        } else {
            self.passthrough
                .insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.printer_name.is_none() && self.passthrough.is_empty()
    }
}

/// A fully parsed invocation.  Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintCommand {
    pub kind: CommandKind,
    /// Request URL with the query string stripped.
    pub target_url: String,
    pub parameters: JobParameters,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_to_platform_units() {
        let (w, h) = PaperSize::a4().to_hundredths_inch();
        assert_eq!((w, h), (827, 1169));
    }

    #[test]
    fn platform_unit_round_trip_within_one_unit() {
        for size in [
            PaperSize::a4(),
            PaperSize::new("Letter", 216, 279),
            PaperSize::new("A5", 148, 210),
            PaperSize::new("Receipt", 80, 200),
        ] {
            let (w, h) = size.to_hundredths_inch();
            let back = PaperSize::from_hundredths_inch(&size.name, w, h);
            assert!(
                (back.width - size.width).abs() <= 1,
                "{size}: width {} -> {} -> {}",
                size.width,
                w,
                back.width
            );
            assert!((back.height - size.height).abs() <= 1);
        }
    }

    #[test]
    fn wire_shape_is_pascal_case() {
        let json = serde_json::to_string(&PaperSize::a4()).unwrap();
        assert_eq!(json, r#"{"Name":"A4","Width":210,"Height":297}"#);

        let parsed: PaperSize =
            serde_json::from_str(r#"{"Name":"Letter","Width":216,"Height":279}"#).unwrap();
        assert_eq!(parsed, PaperSize::new("Letter", 216, 279));
    }

    #[test]
    fn degenerate_sizes_are_flagged() {
        assert!(PaperSize::new("bad", 0, 297).is_degenerate());
        assert!(PaperSize::new("bad", 210, -1).is_degenerate());
        assert!(!PaperSize::a4().is_degenerate());
    }

    #[test]
    fn display_format() {
        assert_eq!(PaperSize::a4().to_string(), "[A4](210, 297)");
    }

    #[test]
    fn command_kind_parses_known_tokens_only() {
        assert_eq!(
            "GetPrinterList".parse::<CommandKind>().unwrap(),
            CommandKind::GetPrinterList
        );
        assert_eq!(
            "DoPrint".parse::<CommandKind>().unwrap(),
            CommandKind::DoPrint
        );
        assert!(matches!(
            "Reboot".parse::<CommandKind>(),
            Err(DruckboteError::UnknownCommandKind(t)) if t == "Reboot"
        ));
    }

    #[test]
    fn printer_name_never_enters_passthrough() {
        let mut params = JobParameters::default();
        params.insert("JobId", "17");
        params.insert(PRINTER_NAME_KEY, "HP1");
        params.insert("Copies", "2");

        assert_eq!(params.printer_name.as_deref(), Some("HP1"));
        assert!(!params.passthrough.contains_key(PRINTER_NAME_KEY));
        let keys: Vec<&str> = params.passthrough.keys().map(String::as_str).collect();
        assert_eq!(keys, ["JobId", "Copies"]);
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let mut params = JobParameters::default();
        params.insert("JobId", "1");
        params.insert("JobId", "2");
        assert_eq!(params.passthrough["JobId"], Value::String("2".into()));
        assert_eq!(params.passthrough.len(), 1);
    }
}
