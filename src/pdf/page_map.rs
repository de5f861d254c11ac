//! Printed-to-physical page reconciliation.
//!
//! A page's printed number (what is typeset on it) routinely disagrees with
//! its physical index (its 1-based position in the file): front matter,
//! restarted numbering, unnumbered plates. The resolver reads every page in
//! physical order and records what it actually says, through a cheap-first
//! strategy chain: embedded footer text, then OCR, then an identity mapping
//! so every page stays reachable. A later strategy only runs when the
//! previous one came up empty.

use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::pdf::document::PdfDocument;
use crate::pdf::glyphs::{self, assemble_lines, PageGlyphs};
use crate::pdf::ocr::OcrEngine;

/// Fraction of the page height, measured from the bottom edge, searched for
/// an embedded printed number.
pub const FOOTER_REGION_RATIO: f64 = 0.12;

/// Render scale for OCR rasterization; recognition wants more pixels than a
/// screen render.
pub const OCR_SCALE: f64 = 2.0;

/// How many trailing OCR lines are scanned for a number token.
const OCR_TAIL_LINES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSource {
    /// Read from the embedded text layer.
    Embedded,
    /// Read from a rasterized page via OCR.
    Ocr,
    /// No legible number; the physical index stands in.
    Identity,
}

impl std::fmt::Display for NumberSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NumberSource::Embedded => "text",
            NumberSource::Ocr => "ocr",
            NumberSource::Identity => "identity",
        })
    }
}

#[derive(Debug, Clone)]
pub struct PageMapping {
    /// 1-based position in the file.
    pub physical: u32,
    /// Number printed on the page (or the physical index for identity
    /// fallbacks).
    pub printed: u32,
    pub source: NumberSource,
}

/// One mapping per physical page, in physical order.
///
/// Printed numbers are neither contiguous nor unique; physical coverage is
/// total by construction (the identity fallback). Built once per document
/// session and read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct PrintedPageMap {
    entries: Vec<PageMapping>,
}

impl PrintedPageMap {
    /// Record the outcome for the next physical page.
    pub(crate) fn record(&mut self, physical: u32, detected: Option<(u32, NumberSource)>) {
        let (printed, source) = detected.unwrap_or((physical, NumberSource::Identity));
        self.entries.push(PageMapping {
            physical,
            printed,
            source,
        });
    }

    /// Earliest physical page carrying the given printed number.
    pub fn resolve(&self, printed: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.printed == printed)
            .map(|entry| entry.physical)
    }

    pub fn entries(&self) -> &[PageMapping] {
        &self.entries
    }
}

/// Build the printed-page map for a whole document, pages strictly in
/// physical order, one at a time.
///
/// OCR runs lazily: only for pages whose embedded-text attempt found
/// nothing, and only when an engine was detected. Per-page failures never
/// propagate; the page falls through to the identity mapping.
pub async fn build_page_map(
    doc: &PdfDocument,
    ocr: Option<&OcrEngine>,
    footer_ratio: f64,
    ocr_scale: f64,
) -> PrintedPageMap {
    let page_count = doc.page_count();

    let extracted = match glyphs::extract_glyphs(&doc.doc, None) {
        Ok(pages) => pages,
        Err(e) => {
            warn!("no text layer for page numbering, OCR only: {:#}", e);
            Vec::new()
        }
    };
    let by_page: HashMap<u32, &PageGlyphs> = extracted.iter().map(|p| (p.page, p)).collect();

    let mut map = PrintedPageMap::default();
    for physical in 1..=page_count {
        let mut detected = by_page
            .get(&physical)
            .and_then(|page| embedded_number(page, footer_ratio, page_count))
            .map(|printed| (printed, NumberSource::Embedded));

        if detected.is_none() {
            if let Some(engine) = ocr {
                match engine.recognize_page(&doc.path, physical, ocr_scale).await {
                    Ok(text) => {
                        detected = trailing_ocr_number(&text, page_count)
                            .map(|printed| (printed, NumberSource::Ocr));
                    }
                    Err(e) => debug!("page {}: OCR attempt failed: {:#}", physical, e),
                }
            }
        }

        if detected.is_none() {
            debug!("page {}: no printed number, using identity", physical);
        }
        map.record(physical, detected);
    }

    map
}

fn number_token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,4}").expect("number token pattern"))
}

/// First in-range number token in the page's footer region.
fn embedded_number(page: &PageGlyphs, footer_ratio: f64, page_count: u32) -> Option<u32> {
    let cutoff = page.bottom + page.height * footer_ratio;
    let footer: Vec<_> = page
        .runs
        .iter()
        .filter(|run| run.y < cutoff)
        .cloned()
        .collect();
    let text = assemble_lines(&footer).join(" ");
    let found = number_tokens(&text).find(|&n| in_range(n, page_count));
    found
}

/// Last in-range number token within the last few lines of OCR output.
fn trailing_ocr_number(text: &str, page_count: u32) -> Option<u32> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let tail_start = lines.len().saturating_sub(OCR_TAIL_LINES);
    let tail = lines[tail_start..].join(" ");
    number_tokens(&tail)
        .filter(|&n| in_range(n, page_count))
        .last()
}

fn number_tokens(text: &str) -> impl Iterator<Item = u32> + '_ {
    number_token_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
}

fn in_range(printed: u32, page_count: u32) -> bool {
    printed >= 1 && printed <= page_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::glyphs::GlyphRun;

    fn page_with_footer(page: u32, footer: &[(&str, f64)]) -> PageGlyphs {
        let mut runs = vec![GlyphRun {
            text: "Body text".to_string(),
            x: 50.0,
            y: 500.0,
        }];
        for (text, y) in footer {
            runs.push(GlyphRun {
                text: text.to_string(),
                x: 280.0,
                y: *y,
            });
        }
        PageGlyphs {
            page,
            bottom: 0.0,
            height: 800.0,
            runs,
        }
    }

    #[test]
    fn test_embedded_number_reads_the_footer_only() {
        let page = page_with_footer(3, &[("17", 30.0)]);
        assert_eq!(embedded_number(&page, FOOTER_REGION_RATIO, 200), Some(17));
    }

    #[test]
    fn test_embedded_number_ignores_body_region() {
        // "42" sits well above the footer cutoff
        let page = page_with_footer(3, &[("42", 300.0)]);
        assert_eq!(embedded_number(&page, FOOTER_REGION_RATIO, 200), None);
    }

    #[test]
    fn test_embedded_number_rejects_out_of_range_tokens() {
        let page = page_with_footer(3, &[("1944", 30.0)]);
        assert_eq!(embedded_number(&page, FOOTER_REGION_RATIO, 200), None);
    }

    #[test]
    fn test_ocr_number_prefers_last_candidate() {
        let text = "Heading\nsome body text\n12 running title\n13\n";
        assert_eq!(trailing_ocr_number(text, 200), Some(13));
    }

    #[test]
    fn test_ocr_number_skips_invalid_then_takes_valid() {
        let text = "body\nprinted in 1987\npage 44\n";
        assert_eq!(trailing_ocr_number(text, 200), Some(44));
    }

    #[test]
    fn test_ocr_number_only_scans_the_tail() {
        let text = "7\na\nb\nc\nd\ne\n";
        assert_eq!(trailing_ocr_number(text, 200), None);
    }

    #[test]
    fn test_identity_fallback_keeps_coverage_total() {
        let mut map = PrintedPageMap::default();
        map.record(1, Some((9, NumberSource::Embedded)));
        map.record(2, None);
        map.record(3, Some((11, NumberSource::Ocr)));

        assert_eq!(map.entries().len(), 3);
        for (physical, entry) in (1..=3).zip(map.entries()) {
            assert_eq!(entry.physical, physical);
        }
        // every physical page is reachable through some printed key
        for entry in map.entries() {
            assert_eq!(map.resolve(entry.printed), Some(entry.physical));
        }
        assert_eq!(map.entries()[1].source, NumberSource::Identity);
    }

    #[test]
    fn test_resolve_duplicate_printed_number_takes_earliest_physical() {
        let mut map = PrintedPageMap::default();
        map.record(1, None);
        map.record(2, Some((1, NumberSource::Embedded)));
        assert_eq!(map.resolve(1), Some(1));
    }

    #[test]
    fn test_resolve_unknown_printed_number_is_none() {
        let mut map = PrintedPageMap::default();
        map.record(1, Some((5, NumberSource::Embedded)));
        assert_eq!(map.resolve(99), None);
    }
}
