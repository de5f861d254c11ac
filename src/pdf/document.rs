use anyhow::{Context, Result};
use lopdf::{Document, Object};
use std::path::{Path, PathBuf};

/// An open document plus the path it was loaded from.
///
/// Everything derived from a document (outline, contents, page map) is owned
/// by one session around this handle; loading a new file builds a fresh
/// handle and discards the old one wholesale.
pub struct PdfDocument {
    pub doc: Document,
    pub path: PathBuf,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = Document::load(&path)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(PdfDocument { doc, path })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Metadata from the document info dictionary.
    pub fn info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = string_entry(dict, b"Title");
                info.author = string_entry(dict, b"Author");
                info.creator = string_entry(dict, b"Creator");
                info.producer = string_entry(dict, b"Producer");
                info.creation_date = string_entry(dict, b"CreationDate");
                info.mod_date = string_entry(dict, b"ModDate");
                info.subject = string_entry(dict, b"Subject");
                info.keywords = string_entry(dict, b"Keywords");
            }
        }

        info.page_count = self.page_count();
        info
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub page_count: u32,
}

fn string_entry(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => Some(decode_text(bytes)),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when the BOM is present, otherwise a
/// Latin-1-style byte mapping (close enough to PDFDocEncoding for titles).
pub fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|chunk| {
                if chunk.len() == 2 {
                    Some(u16::from_be_bytes([chunk[0], chunk[1]]))
                } else {
                    None
                }
            })
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf16_text() {
        let bytes = [0xFE, 0xFF, 0x00, 0x49, 0x00, 0x56];
        assert_eq!(decode_text(&bytes), "IV");
    }

    #[test]
    fn test_decode_latin1_text() {
        assert_eq!(decode_text(b"Chapter 1"), "Chapter 1");
    }

    #[test]
    fn test_decode_truncated_utf16_pair() {
        // odd trailing byte is dropped, not an error
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00];
        assert_eq!(decode_text(&bytes), "A");
    }
}
