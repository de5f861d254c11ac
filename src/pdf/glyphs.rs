//! Positioned text extraction and line reconstruction.
//!
//! PDF content streams place glyph runs independently; nothing in the format
//! groups them into lines. The collector below taps pdf-extract's `OutputDev`
//! callbacks to record each run with its text-matrix position, and
//! [`assemble_lines`] rebuilds reading-order lines by baseline proximity.
//!
//! Coordinates are kept in raw PDF user space (origin bottom-left, y grows
//! upward): sorting by descending y gives top-of-page-first order, and the
//! footer region is simply y below a fraction of the page height.

use anyhow::{anyhow, Result};
use lopdf::Document;
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use std::collections::BTreeSet;

/// Runs whose baselines differ by less than this many units join one line.
pub const LINE_TOLERANCE: f64 = 5.0;

/// One positioned text fragment on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// All glyph runs collected from one page, plus the page geometry needed for
/// region predicates.
#[derive(Debug, Clone)]
pub struct PageGlyphs {
    /// 1-based physical page index.
    pub page: u32,
    /// Lower edge of the media box.
    pub bottom: f64,
    /// Media box height.
    pub height: f64,
    pub runs: Vec<GlyphRun>,
}

/// Extract glyph runs for the given physical pages (all pages when `None`).
///
/// pdf-extract panics on some malformed documents; a panic here is reported
/// as "no usable text layer" so callers can drop to the OCR tier instead of
/// crashing.
pub fn extract_glyphs(doc: &Document, pages: Option<&[u32]>) -> Result<Vec<PageGlyphs>> {
    let mut collector = GlyphCollector::new(pages);
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::output_doc(doc, &mut collector)
    }));
    match outcome {
        Ok(Ok(())) => Ok(collector.into_pages()),
        Ok(Err(e)) => Err(anyhow!("Text extraction failed: {}", e)),
        Err(_) => Err(anyhow!(
            "Text extraction panicked; document has no usable text layer"
        )),
    }
}

/// Group a page's runs into reading-order lines, top to bottom.
///
/// Runs are sorted by descending baseline (x ascending as tiebreak) and
/// absorbed into the current line while each run's baseline stays within
/// [`LINE_TOLERANCE`] of the previously absorbed one. Flushed lines are
/// joined with single spaces and trimmed; whitespace-only lines are dropped.
/// Empty input yields empty output, and no state survives between calls.
pub fn assemble_lines(runs: &[GlyphRun]) -> Vec<String> {
    let mut sorted: Vec<&GlyphRun> = runs.iter().collect();
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut last_y = 0.0;

    for run in sorted {
        if !buffer.is_empty() && (run.y - last_y).abs() >= LINE_TOLERANCE {
            flush_line(&mut buffer, &mut lines);
        }
        buffer.push(run.text.as_str());
        last_y = run.y;
    }
    flush_line(&mut buffer, &mut lines);

    lines
}

fn flush_line(buffer: &mut Vec<&str>, lines: &mut Vec<String>) {
    let line = buffer.join(" ").trim().to_string();
    if !line.is_empty() {
        lines.push(line);
    }
    buffer.clear();
}

/// `OutputDev` implementation that records one [`GlyphRun`] per word span,
/// stamped with the position of the span's first character.
struct GlyphCollector {
    wanted: Option<BTreeSet<u32>>,
    pages: Vec<PageGlyphs>,
    current: Option<PageGlyphs>,
    word: String,
    word_x: f64,
    word_y: f64,
    word_placed: bool,
}

impl GlyphCollector {
    fn new(pages: Option<&[u32]>) -> Self {
        GlyphCollector {
            wanted: pages.map(|p| p.iter().copied().collect()),
            pages: Vec::new(),
            current: None,
            word: String::new(),
            word_x: 0.0,
            word_y: 0.0,
            word_placed: false,
        }
    }

    fn wants(&self, page: u32) -> bool {
        self.wanted.as_ref().map_or(true, |set| set.contains(&page))
    }

    fn flush_word(&mut self) {
        if let Some(page) = self.current.as_mut() {
            let text = self.word.trim();
            if self.word_placed && !text.is_empty() {
                page.runs.push(GlyphRun {
                    text: text.to_string(),
                    x: self.word_x,
                    y: self.word_y,
                });
            }
        }
        self.word.clear();
        self.word_placed = false;
    }

    fn into_pages(self) -> Vec<PageGlyphs> {
        self.pages
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.current = self.wants(page_num).then(|| PageGlyphs {
            page: page_num,
            bottom: media_box.lly,
            height: media_box.ury - media_box.lly,
            runs: Vec::new(),
        });
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.flush_word();
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        _width: f64,
        _spacing: f64,
        _font_size: f64,
        text: &str,
    ) -> Result<(), OutputError> {
        if self.current.is_some() {
            if !self.word_placed {
                self.word_x = trm.m31;
                self.word_y = trm.m32;
                self.word_placed = true;
            }
            self.word.push_str(text);
        }
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        self.flush_word();
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f64, y: f64) -> GlyphRun {
        GlyphRun {
            text: text.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(assemble_lines(&[]).is_empty());
    }

    #[test]
    fn test_runs_within_tolerance_share_a_line() {
        let runs = vec![run("Hello", 10.0, 100.0), run("world", 60.0, 96.5)];
        assert_eq!(assemble_lines(&runs), vec!["Hello world"]);
    }

    #[test]
    fn test_runs_at_tolerance_split() {
        let runs = vec![run("Hello", 10.0, 100.0), run("world", 10.0, 95.0)];
        assert_eq!(assemble_lines(&runs), vec!["Hello", "world"]);
    }

    #[test]
    fn test_tolerance_chains_from_last_absorbed_run() {
        // each step is 4 units from the previous, so all three merge even
        // though the first and last are 8 apart
        let runs = vec![
            run("a", 10.0, 100.0),
            run("b", 40.0, 96.0),
            run("c", 70.0, 92.0),
        ];
        assert_eq!(assemble_lines(&runs), vec!["a b c"]);
    }

    #[test]
    fn test_lines_come_out_top_to_bottom() {
        let runs = vec![
            run("footer", 10.0, 20.0),
            run("title", 10.0, 700.0),
            run("body", 10.0, 400.0),
        ];
        assert_eq!(assemble_lines(&runs), vec!["title", "body", "footer"]);
    }

    #[test]
    fn test_x_orders_runs_within_a_line() {
        let runs = vec![run("world", 120.0, 100.0), run("Hello", 10.0, 100.0)];
        assert_eq!(assemble_lines(&runs), vec!["Hello world"]);
    }

    #[test]
    fn test_whitespace_only_runs_are_dropped() {
        let runs = vec![run("  ", 10.0, 100.0), run("text", 10.0, 50.0)];
        assert_eq!(assemble_lines(&runs), vec!["text"]);
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let runs = vec![
            run("b", 40.0, 96.0),
            run("a", 10.0, 100.0),
            run("c", 10.0, 50.0),
        ];
        assert_eq!(assemble_lines(&runs), assemble_lines(&runs));
    }
}
