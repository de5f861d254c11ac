use anyhow::Result;
use std::path::Path;

use crate::pdf::outline::{extract_outline, flatten_outline};
use crate::pdf::PdfDocument;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let outline = extract_outline(&doc.doc)?;

    if outline.is_empty() {
        println!("No outline found.");
        return Ok(());
    }

    for entry in flatten_outline(&outline) {
        let indent = "  ".repeat(entry.level as usize);
        match entry.page {
            Some(page) => println!("{}{} (p. {})", indent, entry.title, page),
            None => println!("{}{} [unresolved]", indent, entry.title),
        }
    }

    Ok(())
}
