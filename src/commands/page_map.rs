use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

use crate::pdf::labels::extract_page_labels;
use crate::pdf::ocr::OcrEngine;
use crate::pdf::page_map::build_page_map;
use crate::pdf::session::ScanConfig;
use crate::pdf::PdfDocument;

pub async fn run<P: AsRef<Path>>(path: P, ocr: bool, language: &str) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let config = ScanConfig::default();

    let engine = if ocr {
        let engine = OcrEngine::detect(language);
        if engine.is_none() {
            eprintln!("OCR requested but pdftoppm/tesseract are unavailable; continuing without.");
        }
        engine
    } else {
        None
    };

    let map = build_page_map(
        &doc,
        engine.as_ref(),
        config.footer_region_ratio,
        config.ocr_scale,
    )
    .await;

    // declared labels shown as a sanity column next to what the pages say
    let declared: HashMap<u32, String> = extract_page_labels(&doc.doc)
        .unwrap_or_default()
        .into_iter()
        .map(|label| (label.physical_page, label.logical_label))
        .collect();

    for entry in map.entries() {
        let label = declared
            .get(&entry.physical)
            .map(|l| format!("  label {}", l))
            .unwrap_or_default();
        println!(
            "{}: printed {} ({}){}",
            entry.physical, entry.printed, entry.source, label
        );
    }

    Ok(())
}
