use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::pdf::ocr::Rasterizer;
use crate::pdf::PdfDocument;

pub async fn run<P: AsRef<Path>>(
    path: P,
    page: u32,
    output: Option<PathBuf>,
    scale: f64,
) -> Result<()> {
    let path = path.as_ref();
    let doc = PdfDocument::open(path)?;
    let total = doc.page_count();
    if page == 0 || page > total {
        anyhow::bail!("Page {} is out of range (1-{})", page, total);
    }
    if !Rasterizer::available() {
        anyhow::bail!("Rendering requires pdftoppm, which was not found");
    }

    let output = output.unwrap_or_else(|| {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("page");
        PathBuf::from(format!("{}-{}.png", stem, page))
    });

    let written = Rasterizer::render_page(path, page, scale, &output).await?;
    println!("Rendered page {} to {}", page, written.display());

    Ok(())
}
