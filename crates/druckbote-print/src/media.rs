// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Translation between paper sizes and IPP `media` keywords (RFC 8011
// §5.2.13, PWG 5101.1 self-describing names).

use druckbote_core::types::PaperSize;

/// Well-known media keywords and their millimetre dimensions.
const KNOWN_MEDIA: &[(&str, &str, i32, i32)] = &[
    ("iso_a3_297x420mm", "A3", 297, 420),
    ("iso_a4_210x297mm", "A4", 210, 297),
    ("iso_a5_148x210mm", "A5", 148, 210),
    ("na_letter_8.5x11in", "Letter", 216, 279),
    ("na_legal_8.5x14in", "Legal", 216, 356),
    ("na_ledger_11x17in", "Tabloid", 279, 432),
];

/// IPP media keyword for a paper size.
///
/// Well-known sizes map to their PWG names; anything else becomes a
/// self-describing `custom_WxHmm` keyword.
pub fn media_keyword(paper: &PaperSize) -> String {
    for (keyword, _, width, height) in KNOWN_MEDIA {
        if *width == paper.width && *height == paper.height {
            return (*keyword).to_string();
        }
    }
    format!("custom_{}x{}mm", paper.width, paper.height)
}

/// Parse an IPP media keyword into a paper size.
///
/// Recognizes the well-known table first, then any self-describing keyword
/// whose final segment carries `<W>x<H>` with an `mm` or `in` suffix.
/// Returns `None` for keywords without usable dimensions.
pub fn paper_size_from_keyword(keyword: &str) -> Option<PaperSize> {
    for (known, name, width, height) in KNOWN_MEDIA {
        if *known == keyword {
            return Some(PaperSize::new(*name, *width, *height));
        }
    }

    let dims = keyword.rsplit('_').next()?;
    let (dims, to_mm) = if let Some(stripped) = dims.strip_suffix("mm") {
        (stripped, 1.0)
    } else if let Some(stripped) = dims.strip_suffix("in") {
        (stripped, 25.4)
    } else {
        return None;
    };

    let (w, h) = dims.split_once('x')?;
    let width = (w.parse::<f64>().ok()? * to_mm).round() as i32;
    let height = (h.parse::<f64>().ok()? * to_mm).round() as i32;

    let size = PaperSize::new(keyword, width, height);
    if size.is_degenerate() { None } else { Some(size) }
}
