use anyhow::Result;
use std::path::Path;

use crate::pdf::ocr::OcrEngine;
use crate::pdf::page_map::NumberSource;
use crate::pdf::session::{DocumentSession, ScanConfig};

pub async fn run<P: AsRef<Path>>(path: P, printed: u32, ocr: bool, language: &str) -> Result<()> {
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

    let session = DocumentSession::load(&path, &config, engine.as_ref(), true).await?;
    let physical = session.resolve_target(printed);

    let source = session
        .page_map
        .as_ref()
        .and_then(|map| {
            map.entries()
                .iter()
                .find(|entry| entry.printed == printed && entry.physical == physical)
        })
        .map(|entry| entry.source)
        .unwrap_or(NumberSource::Identity);

    println!(
        "Printed page {} is file page {} of {} ({})",
        printed,
        physical,
        session.doc.page_count(),
        source
    );

    Ok(())
}
