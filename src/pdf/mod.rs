pub mod contents;
pub mod document;
pub mod glyphs;
pub mod labels;
pub mod ocr;
pub mod outline;
pub mod page_map;
pub mod session;

pub use document::PdfDocument;
