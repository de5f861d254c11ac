use anyhow::Result;
use std::path::Path;

use crate::pdf::labels::extract_page_labels;
use crate::pdf::PdfDocument;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    for label in extract_page_labels(&doc.doc)? {
        println!("{}: {}", label.physical_page, label.logical_label);
    }
    Ok(())
}
