use anyhow::Result;
use std::path::Path;

use crate::page_range::expand_page_ranges;
use crate::pdf::glyphs::{assemble_lines, extract_glyphs};
use crate::pdf::PdfDocument;

pub fn run<P: AsRef<Path>>(path: P, pages: &str) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let page_list = expand_page_ranges(pages, doc.page_count())?;

    let extracted = extract_glyphs(&doc.doc, Some(&page_list))?;

    for page_num in &page_list {
        println!("--- Page {} ---", page_num);
        if let Some(page) = extracted.iter().find(|p| p.page == *page_num) {
            for line in assemble_lines(&page.runs) {
                println!("{}", line);
            }
        }
        println!();
    }

    Ok(())
}
