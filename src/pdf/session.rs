//! Document session and table-of-contents discovery.
//!
//! A [`DocumentSession`] owns everything derived from one loaded file: the
//! document handle, the discovered contents and the optional printed-page
//! map. A new load builds a new session; nothing survives it, which is what
//! keeps overlapping loads from interleaving state.

use log::warn;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::pdf::contents::{self, TocEntry, TocSection};
use crate::pdf::document::PdfDocument;
use crate::pdf::glyphs::{self, assemble_lines};
use crate::pdf::ocr::OcrEngine;
use crate::pdf::outline::{self, OutlineNode};
use crate::pdf::page_map::{self, PrintedPageMap};

/// Physical page tried first for a printed contents listing; a typical spot
/// after a title and copyright page.
pub const CANDIDATE_CONTENTS_PAGE: u32 = 4;

/// Documents shorter than this are not worth scanning.
pub const MIN_PAGES_FOR_TOC: u32 = 5;

/// How many leading pages the OCR fallback scan may touch.
pub const OCR_SCAN_WINDOW: u32 = 10;

/// Upper bound on a whole load, discovery and page map included.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunable heuristics, preserved as configuration rather than inferred from
/// documents. `Default` is the reference policy.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub candidate_page: u32,
    pub min_pages_for_toc: u32,
    pub ocr_scan_window: u32,
    pub section_keywords: Vec<String>,
    pub section_page_gap: u32,
    pub footer_region_ratio: f64,
    pub ocr_scale: f64,
    pub load_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            candidate_page: CANDIDATE_CONTENTS_PAGE,
            min_pages_for_toc: MIN_PAGES_FOR_TOC,
            ocr_scan_window: OCR_SCAN_WINDOW,
            section_keywords: contents::SECTION_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            section_page_gap: contents::SECTION_PAGE_GAP,
            footer_region_ratio: page_map::FOOTER_REGION_RATIO,
            ocr_scale: page_map::OCR_SCALE,
            load_timeout: LOAD_TIMEOUT,
        }
    }
}

/// Outcome of contents discovery. The last two are recognized empty-result
/// states, not failures: the caller falls back to manual page controls.
#[derive(Debug)]
pub enum TableOfContents {
    /// The document supplied a native outline; heuristics were skipped.
    Outline(Vec<OutlineNode>),
    /// Reconstructed from page text (embedded or OCR).
    Assembled(Vec<TocSection>),
    /// Fewer pages than [`ScanConfig::min_pages_for_toc`].
    TooShort,
    /// Neither outline nor heuristics found anything.
    NotFound,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to load document: {0}")]
    Load(anyhow::Error),
    #[error("Document processing exceeded the {}s budget", .0.as_secs())]
    Timeout(Duration),
}

pub struct DocumentSession {
    pub doc: PdfDocument,
    pub contents: TableOfContents,
    pub page_map: Option<PrintedPageMap>,
}

impl DocumentSession {
    /// Load a document and run discovery under the configured time budget.
    ///
    /// `with_page_map` additionally builds the printed-page map (the
    /// expensive part when OCR is involved). On timeout the in-flight work
    /// is dropped, not forcibly aborted; its results are simply ignored.
    pub async fn load<P: AsRef<Path>>(
        path: P,
        config: &ScanConfig,
        ocr: Option<&OcrEngine>,
        with_page_map: bool,
    ) -> Result<DocumentSession, SessionError> {
        tokio::time::timeout(
            config.load_timeout,
            Self::load_inner(path.as_ref(), config, ocr, with_page_map),
        )
        .await
        .map_err(|_| SessionError::Timeout(config.load_timeout))?
    }

    async fn load_inner(
        path: &Path,
        config: &ScanConfig,
        ocr: Option<&OcrEngine>,
        with_page_map: bool,
    ) -> Result<DocumentSession, SessionError> {
        let doc = PdfDocument::open(path).map_err(SessionError::Load)?;

        let page_map = if with_page_map {
            Some(
                page_map::build_page_map(&doc, ocr, config.footer_region_ratio, config.ocr_scale)
                    .await,
            )
        } else {
            None
        };

        let contents = discover_contents(&doc, config, ocr).await;

        Ok(DocumentSession {
            doc,
            contents,
            page_map,
        })
    }

    /// Translate a contents entry's printed page number into the physical
    /// page to navigate to. Consulted at navigation time, never eagerly.
    pub fn resolve_target(&self, printed: u32) -> u32 {
        resolve_printed(self.page_map.as_ref(), printed, self.doc.page_count())
    }
}

/// Printed → physical translation with a clamped identity fallback for
/// numbers the map has never seen.
fn resolve_printed(map: Option<&PrintedPageMap>, printed: u32, page_count: u32) -> u32 {
    let fallback = printed.clamp(1, page_count.max(1));
    map.and_then(|m| m.resolve(printed)).unwrap_or(fallback)
}

/// Discovery decision chain: native outline, then the candidate contents
/// page, then an OCR scan over a bounded window of leading pages.
async fn discover_contents(
    doc: &PdfDocument,
    config: &ScanConfig,
    ocr: Option<&OcrEngine>,
) -> TableOfContents {
    match outline::extract_outline(&doc.doc) {
        Ok(nodes) if !nodes.is_empty() => return TableOfContents::Outline(nodes),
        Ok(_) => {}
        Err(e) => warn!("outline extraction failed, trying heuristics: {:#}", e),
    }

    let page_count = doc.page_count();
    if page_count < config.min_pages_for_toc {
        return TableOfContents::TooShort;
    }

    let candidate = config.candidate_page.min(page_count);
    if let Some(sections) = scan_candidate_page(doc, candidate, page_count, config) {
        return TableOfContents::Assembled(sections);
    }

    if let Some(engine) = ocr {
        if let Some(sections) = ocr_scan(doc, engine, page_count, config).await {
            return TableOfContents::Assembled(sections);
        }
    }

    TableOfContents::NotFound
}

fn scan_candidate_page(
    doc: &PdfDocument,
    candidate: u32,
    page_count: u32,
    config: &ScanConfig,
) -> Option<Vec<TocSection>> {
    let pages = match glyphs::extract_glyphs(&doc.doc, Some(&[candidate])) {
        Ok(pages) => pages,
        Err(e) => {
            warn!("no text layer on candidate page {}: {:#}", candidate, e);
            return None;
        }
    };

    let page = pages.iter().find(|p| p.page == candidate)?;
    let lines = assemble_lines(&page.runs);
    let entries = contents::parse_lines(&lines);
    finish_entries(entries, candidate, page_count, config)
}

async fn ocr_scan(
    doc: &PdfDocument,
    engine: &OcrEngine,
    page_count: u32,
    config: &ScanConfig,
) -> Option<Vec<TocSection>> {
    for page in 1..=page_count.min(config.ocr_scan_window) {
        let text = match engine.recognize_page(&doc.path, page, config.ocr_scale).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR scan of page {} failed: {:#}", page, e);
                continue;
            }
        };
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let entries = contents::parse_lines(&lines);
        if entries.is_empty() {
            continue;
        }
        if let Some(sections) = finish_entries(entries, page, page_count, config) {
            return Some(sections);
        }
    }
    None
}

/// Shared tail of both extraction paths: offset correction, validation
/// against the page count, then hierarchy grouping.
fn finish_entries(
    mut entries: Vec<TocEntry>,
    source_page: u32,
    page_count: u32,
    config: &ScanConfig,
) -> Option<Vec<TocSection>> {
    if entries.is_empty() {
        return None;
    }
    apply_printed_offset(&mut entries, source_page);
    entries.retain(|entry| entry.page <= page_count);
    if entries.is_empty() {
        return None;
    }
    Some(contents::group_sections(
        entries,
        &config.section_keywords,
        config.section_page_gap,
    ))
}

/// Printed numbering that restarts at 1 on the contents page itself is
/// content-relative, not file-relative; shift it by the page's own physical
/// index. Listings whose first entry is not page 1 are left untouched.
fn apply_printed_offset(entries: &mut [TocEntry], source_page: u32) {
    if entries.first().map(|entry| entry.page) == Some(1) {
        for entry in entries.iter_mut() {
            entry.page += source_page;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::page_map::NumberSource;

    fn entry(title: &str, page: u32) -> TocEntry {
        TocEntry {
            title: title.to_string(),
            page,
        }
    }

    #[test]
    fn test_offset_applied_when_first_entry_is_page_one() {
        let mut entries = vec![entry("Intro", 1), entry("Ch1", 5)];
        apply_printed_offset(&mut entries, 4);
        let pages: Vec<u32> = entries.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![5, 9]);
    }

    #[test]
    fn test_no_offset_when_first_entry_is_not_page_one() {
        let mut entries = vec![entry("Ch3", 30), entry("Ch4", 44)];
        apply_printed_offset(&mut entries, 4);
        let pages: Vec<u32> = entries.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![30, 44]);
    }

    #[test]
    fn test_offset_on_empty_entries_is_a_no_op() {
        let mut entries: Vec<TocEntry> = Vec::new();
        apply_printed_offset(&mut entries, 4);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_resolve_printed_goes_through_the_map() {
        let mut map = PrintedPageMap::default();
        map_record(&mut map, 1, None);
        map_record(&mut map, 2, Some(1));
        map_record(&mut map, 3, Some(2));
        // printed 2 lives on physical 3
        assert_eq!(resolve_printed(Some(&map), 2, 3), 3);
    }

    #[test]
    fn test_resolve_printed_without_map_clamps_to_page_count() {
        assert_eq!(resolve_printed(None, 7, 10), 7);
        assert_eq!(resolve_printed(None, 40, 10), 10);
        assert_eq!(resolve_printed(None, 0, 10), 1);
    }

    #[test]
    fn test_resolve_printed_unknown_key_falls_back_to_identity() {
        let mut map = PrintedPageMap::default();
        map_record(&mut map, 1, Some(9));
        assert_eq!(resolve_printed(Some(&map), 4, 12), 4);
    }

    #[test]
    fn test_finish_entries_drops_pages_beyond_the_document() {
        let config = ScanConfig::default();
        let entries = vec![entry("Ch1", 2), entry("Bogus", 900)];
        let sections = finish_entries(entries, 4, 20, &config).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].page, 2);
    }

    #[test]
    fn test_finish_entries_empty_input_is_none() {
        let config = ScanConfig::default();
        assert!(finish_entries(Vec::new(), 4, 20, &config).is_none());
    }

    fn map_record(map: &mut PrintedPageMap, physical: u32, printed: Option<u32>) {
        let detected = printed.map(|p| (p, NumberSource::Embedded));
        map.record(physical, detected);
    }
}
