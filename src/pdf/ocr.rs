//! Rasterizer and OCR collaborators.
//!
//! Rendering and recognition are delegated to the poppler `pdftoppm` and
//! `tesseract` binaries; both are probed up front so their absence degrades
//! the pipeline (no OCR tier) instead of failing loads. Invocations are
//! asynchronous and awaited one at a time by the callers, so at most one
//! rasterized page exists on disk at any moment.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const POINTS_PER_INCH: f64 = 72.0;

/// True when `name` can be spawned at all (the probe run is expected to
/// exit nonzero, only ENOENT matters).
fn command_available(name: &str) -> bool {
    std::process::Command::new(name)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Page-to-bitmap rendering through `pdftoppm`.
pub struct Rasterizer;

impl Rasterizer {
    pub fn available() -> bool {
        command_available("pdftoppm")
    }

    /// Render one physical page to a PNG at the given scale (1.0 = 72 dpi)
    /// and return the written path.
    pub async fn render_page(
        pdf: &Path,
        page: u32,
        scale: f64,
        output: &Path,
    ) -> Result<PathBuf> {
        let prefix = output.with_extension("");
        let dpi = (POINTS_PER_INCH * scale).round().max(1.0) as u32;
        let page_arg = page.to_string();

        let status = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &page_arg, "-l", &page_arg])
            .arg(pdf)
            .arg(&prefix)
            .stdin(Stdio::null())
            .status()
            .await
            .context("Failed to run pdftoppm")?;
        if !status.success() {
            bail!(
                "pdftoppm failed on page {} of {} ({})",
                page,
                pdf.display(),
                status
            );
        }

        let written = prefix.with_extension("png");
        if !written.is_file() {
            bail!("pdftoppm reported success but wrote no {}", written.display());
        }
        Ok(written)
    }
}

/// Text recognition through `tesseract`.
pub struct OcrEngine {
    language: String,
}

impl OcrEngine {
    /// Detect the OCR toolchain; `None` when either binary is missing.
    pub fn detect(language: &str) -> Option<OcrEngine> {
        (Rasterizer::available() && command_available("tesseract")).then(|| OcrEngine {
            language: language.to_string(),
        })
    }

    /// Rasterize one page into a scratch directory and run recognition over
    /// it. The scratch file is removed when the call returns.
    pub async fn recognize_page(&self, pdf: &Path, page: u32, scale: f64) -> Result<String> {
        let scratch = tempfile::tempdir().context("Failed to create OCR scratch directory")?;
        let target = scratch.path().join(format!("page-{}.png", page));
        let image = Rasterizer::render_page(pdf, page, scale, &target).await?;

        let output = Command::new("tesseract")
            .arg(&image)
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--psm", "6"])
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to run tesseract")?;
        if !output.status.success() {
            bail!(
                "tesseract failed on page {}: {}",
                page,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
