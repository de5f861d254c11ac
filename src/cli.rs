use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfnav")]
#[command(about = "PDF contents discovery and page navigation tool with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server (primary mode)
    Mcp,

    /// Display PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Discover the table of contents (outline, text heuristics, or OCR)
    #[command(alias = "toc")]
    Contents {
        /// PDF file to inspect
        path: PathBuf,

        /// Build a printed-page map and allow OCR fallbacks
        #[arg(long)]
        ocr: bool,

        /// OCR language passed to tesseract
        #[arg(long, default_value = "eng")]
        language: String,

        /// Override the physical page scanned for a printed contents listing
        #[arg(long)]
        candidate_page: Option<u32>,
    },

    /// Print the document's native outline only
    Outline {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Show the printed-to-physical page number map
    PageMap {
        /// PDF file to inspect
        path: PathBuf,

        /// Allow OCR fallback for pages without embedded footer text
        #[arg(long)]
        ocr: bool,

        /// OCR language passed to tesseract
        #[arg(long, default_value = "eng")]
        language: String,
    },

    /// Show the page labels the document itself declares
    Labels {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Resolve a printed page number to its physical page
    Locate {
        /// PDF file to inspect
        path: PathBuf,

        /// Printed page number to look up
        printed: u32,

        /// Allow OCR fallback while building the map
        #[arg(long)]
        ocr: bool,

        /// OCR language passed to tesseract
        #[arg(long, default_value = "eng")]
        language: String,
    },

    /// Print reconstructed text lines from specific pages
    Read {
        /// PDF file to read
        path: PathBuf,

        /// Page ranges (e.g., "1-5,10,15-end")
        pages: String,
    },

    /// Render a page to a PNG image
    Render {
        /// PDF file to render
        path: PathBuf,

        /// Physical page to render
        page: u32,

        /// Output file (defaults to <stem>-<page>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render scale, 1.0 = 72 dpi
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },
}
