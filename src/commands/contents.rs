use anyhow::Result;
use std::path::Path;

use crate::pdf::ocr::OcrEngine;
use crate::pdf::outline::flatten_outline;
use crate::pdf::session::{DocumentSession, ScanConfig, TableOfContents};

pub struct ContentsOptions {
    pub ocr: bool,
    pub language: String,
    pub candidate_page: Option<u32>,
}

impl Default for ContentsOptions {
    fn default() -> Self {
        ContentsOptions {
            ocr: false,
            language: "eng".to_string(),
            candidate_page: None,
        }
    }
}

pub async fn run<P: AsRef<Path>>(path: P, options: &ContentsOptions) -> Result<()> {
    let mut config = ScanConfig::default();
    if let Some(page) = options.candidate_page {
        config.candidate_page = page;
    }

    let ocr = if options.ocr {
        let engine = OcrEngine::detect(&options.language);
        if engine.is_none() {
            eprintln!("OCR requested but pdftoppm/tesseract are unavailable; continuing without.");
        }
        engine
    } else {
        None
    };

    let session = DocumentSession::load(&path, &config, ocr.as_ref(), options.ocr).await?;

    match &session.contents {
        TableOfContents::Outline(nodes) => {
            for entry in flatten_outline(nodes) {
                let indent = "  ".repeat(entry.level as usize);
                match entry.page {
                    Some(page) => println!("{}{} (p. {})", indent, entry.title, page),
                    None => println!("{}{} [unresolved]", indent, entry.title),
                }
            }
        }
        TableOfContents::Assembled(sections) => {
            for section in sections {
                println!("{}{}", section.title, target_note(&session, section.page));
                for entry in &section.entries {
                    println!("  {}{}", entry.title, target_note(&session, entry.page));
                }
            }
        }
        TableOfContents::TooShort => {
            println!("Document is too short for a table of contents.");
        }
        TableOfContents::NotFound => {
            println!("No table of contents found.");
        }
    }

    Ok(())
}

/// " (p. N)" plus the physical page when the map translates it elsewhere.
fn target_note(session: &DocumentSession, printed: u32) -> String {
    let physical = session.resolve_target(printed);
    if session.page_map.is_some() && physical != printed {
        format!(" (p. {}, file page {})", printed, physical)
    } else {
        format!(" (p. {})", printed)
    }
}
