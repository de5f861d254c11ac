use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::page_range::expand_page_ranges;
use crate::pdf::glyphs::{assemble_lines, extract_glyphs};
use crate::pdf::ocr::OcrEngine;
use crate::pdf::outline::{extract_outline, flatten_outline};
use crate::pdf::page_map::build_page_map;
use crate::pdf::session::{DocumentSession, ScanConfig, TableOfContents};
use crate::pdf::PdfDocument;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfContentsRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Build a printed-page map and allow OCR fallbacks (default: false)")]
    #[serde(default)]
    pub ocr: bool,
    #[schemars(description = "OCR language passed to tesseract (default: eng)")]
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfLocateRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Printed page number to resolve")]
    pub printed: u32,
    #[schemars(description = "Allow OCR fallback while building the map (default: false)")]
    #[serde(default)]
    pub ocr: bool,
    #[schemars(description = "OCR language passed to tesseract (default: eng)")]
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfReadLinesRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges (e.g., '1-5,10,15-end')")]
    pub pages: String,
}

fn default_language() -> String {
    "eng".to_string()
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, creator, producer, creation date, and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match PdfDocument::open(&path) {
            Ok(doc) => {
                let info = doc.info();
                let result = PdfInfoResult {
                    path,
                    page_count: info.page_count,
                    title: info.title,
                    author: info.author,
                    creator: info.creator,
                    producer: info.producer,
                    creation_date: info.creation_date,
                    subject: info.subject,
                    keywords: info.keywords,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Discover the table of contents: the document's native outline when present, otherwise a heuristic reconstruction from page text (with optional OCR fallback)")]
    async fn pdf_contents(&self, Parameters(req): Parameters<PdfContentsRequest>) -> String {
        let config = ScanConfig::default();
        let engine = if req.ocr {
            OcrEngine::detect(&req.language)
        } else {
            None
        };

        let session = match DocumentSession::load(&req.path, &config, engine.as_ref(), req.ocr).await
        {
            Ok(s) => s,
            Err(e) => return format!("Error: {}", e),
        };

        let result = match &session.contents {
            TableOfContents::Outline(nodes) => ContentsResult {
                source: "outline".to_string(),
                entries: flatten_outline(nodes)
                    .into_iter()
                    .map(|entry| ContentsEntryResult {
                        title: entry.title,
                        printed_page: entry.page,
                        physical_page: entry.page,
                        level: entry.level,
                    })
                    .collect(),
            },
            TableOfContents::Assembled(sections) => {
                let mut entries = Vec::new();
                for section in sections {
                    entries.push(ContentsEntryResult {
                        title: section.title.clone(),
                        printed_page: Some(section.page),
                        physical_page: Some(session.resolve_target(section.page)),
                        level: 0,
                    });
                    for entry in &section.entries {
                        entries.push(ContentsEntryResult {
                            title: entry.title.clone(),
                            printed_page: Some(entry.page),
                            physical_page: Some(session.resolve_target(entry.page)),
                            level: 1,
                        });
                    }
                }
                ContentsResult {
                    source: "assembled".to_string(),
                    entries,
                }
            }
            TableOfContents::TooShort => ContentsResult {
                source: "too-short".to_string(),
                entries: Vec::new(),
            },
            TableOfContents::NotFound => ContentsResult {
                source: "not-found".to_string(),
                entries: Vec::new(),
            },
        };

        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Get the document's native outline (bookmarks) as structured data; nodes with unresolvable destinations have no page")]
    fn pdf_outline(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let doc = match PdfDocument::open(&path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        match extract_outline(&doc.doc) {
            Ok(nodes) => {
                let result: Vec<OutlineEntryResult> = flatten_outline(&nodes)
                    .into_iter()
                    .map(|entry| OutlineEntryResult {
                        title: entry.title,
                        page: entry.page,
                        level: entry.level,
                    })
                    .collect();
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Map every physical page to the page number actually printed on it (embedded text first, OCR fallback when requested, identity when illegible)")]
    async fn pdf_page_map(&self, Parameters(req): Parameters<PdfContentsRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let config = ScanConfig::default();
        let engine = if req.ocr {
            OcrEngine::detect(&req.language)
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

        let result: Vec<PageMappingResult> = map
            .entries()
            .iter()
            .map(|entry| PageMappingResult {
                physical_page: entry.physical,
                printed_page: entry.printed,
                source: entry.source.to_string(),
            })
            .collect();
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Resolve a printed page number to the physical page to navigate to")]
    async fn pdf_locate(&self, Parameters(req): Parameters<PdfLocateRequest>) -> String {
        let config = ScanConfig::default();
        let engine = if req.ocr {
            OcrEngine::detect(&req.language)
        } else {
            None
        };

        let session = match DocumentSession::load(&req.path, &config, engine.as_ref(), true).await {
            Ok(s) => s,
            Err(e) => return format!("Error: {}", e),
        };

        let result = LocateResult {
            printed_page: req.printed,
            physical_page: session.resolve_target(req.printed),
            page_count: session.doc.page_count(),
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Extract reconstructed text lines from specific pages. Use page range syntax like '1-5,10,15-end'.")]
    fn pdf_read_lines(&self, Parameters(req): Parameters<PdfReadLinesRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        let page_list = match expand_page_ranges(&req.pages, doc.page_count()) {
            Ok(p) => p,
            Err(e) => return format!("Error: {}", e),
        };

        let extracted = match extract_glyphs(&doc.doc, Some(&page_list)) {
            Ok(pages) => pages,
            Err(e) => return format!("Error: {}", e),
        };

        let result: Vec<PageLinesResult> = page_list
            .iter()
            .map(|page_num| PageLinesResult {
                page: *page_num,
                lines: extracted
                    .iter()
                    .find(|p| p.page == *page_num)
                    .map(|p| assemble_lines(&p.runs))
                    .unwrap_or_default(),
            })
            .collect();
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ContentsResult {
    pub source: String,
    pub entries: Vec<ContentsEntryResult>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ContentsEntryResult {
    pub title: String,
    pub printed_page: Option<u32>,
    pub physical_page: Option<u32>,
    pub level: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OutlineEntryResult {
    pub title: String,
    pub page: Option<u32>,
    pub level: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageMappingResult {
    pub physical_page: u32,
    pub printed_page: u32,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LocateResult {
    pub printed_page: u32,
    pub physical_page: u32,
    pub page_count: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageLinesResult {
    pub page: u32,
    pub lines: Vec<String>,
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF contents discovery and navigation tools. Use pdf_info for document metadata, \
                 pdf_contents to discover the table of contents (native outline or heuristic \
                 reconstruction), pdf_outline for the raw outline, pdf_page_map to reconcile \
                 printed page numbers with physical pages, pdf_locate to resolve a printed page \
                 number, and pdf_read_lines to extract text lines from specific pages."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
