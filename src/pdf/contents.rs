//! Heuristic table-of-contents reconstruction from page text.
//!
//! [`parse_lines`] turns one candidate page's reconstructed lines into
//! validated entries; [`group_sections`] folds the flat entry list into
//! sections with nested sub-entries. Both are best-effort heuristics tuned
//! on printed-book contents pages, not guarantees.

use regex::Regex;
use std::sync::OnceLock;

/// Titles shorter than this after normalization are discarded as fragments.
const MIN_TITLE_CHARS: usize = 3;

/// Lower-cased substrings that mark an entry as a top-level section heading.
pub const SECTION_KEYWORDS: [&str; 4] = ["chapter", "section", "progressions", "about the book"];

/// A jump of more than this many pages starts a new section even without a
/// keyword match.
pub const SECTION_PAGE_GAP: u32 = 5;

/// OCR and typesetting confusables seen in scanned contents pages, applied
/// after whitespace normalization.
const CONFUSABLES: [(&str, &str); 4] = [("lV", "IV"), ("1V", "IV"), ("Vl", "vi"), ("l V", "I V")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    /// Page number as printed in the contents, 1-based.
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocSection {
    pub title: String,
    pub page: u32,
    pub entries: Vec<TocEntry>,
}

fn trailing_page_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 1-3 trailing digits; the leading \D keeps year-like runs ("2023") from
    // matching on their tail
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{1,3})\s*$").expect("trailing page pattern"))
}

fn leader_dots_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{2,}").expect("leader dot pattern"))
}

fn whitespace_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern"))
}

/// Parse a contents page's lines into entries, sorted ascending by page.
///
/// A line qualifies when it ends in a 1-3 digit page number; everything
/// before the number is the title, normalized and length-checked. Entries
/// whose page parses to 0 are rejected outright. The output is re-ordered by
/// page number: out-of-order entries in the source are OCR noise more often
/// than genuine structure.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<TocEntry> {
    let mut entries = Vec::new();

    for line in lines {
        let line = line.as_ref();
        let Some(caps) = trailing_page_pattern().captures(line) else {
            continue;
        };
        let Some(digits) = caps.get(1) else {
            continue;
        };
        let Ok(page) = digits.as_str().parse::<u32>() else {
            continue;
        };
        if page == 0 {
            continue;
        }

        let title = normalize_title(&line[..digits.start()]);
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        entries.push(TocEntry { title, page });
    }

    entries.sort_by_key(|entry| entry.page);
    entries
}

/// Collapse leader dots and whitespace, trim, then repair confusables.
fn normalize_title(raw: &str) -> String {
    let no_dots = leader_dots_pattern().replace_all(raw, " ");
    let mut title = whitespace_pattern()
        .replace_all(&no_dots, " ")
        .trim()
        .to_string();
    for (wrong, right) in CONFUSABLES {
        title = title.replace(wrong, right);
    }
    title
}

/// Fold page-sorted entries into sections.
///
/// An entry opens a new section when its lower-cased title contains one of
/// `keywords`, when no section exists yet, or when its page number exceeds
/// the current section's by more than `page_gap`. Everything else becomes a
/// sub-entry of the current section.
pub fn group_sections(entries: Vec<TocEntry>, keywords: &[String], page_gap: u32) -> Vec<TocSection> {
    let mut sections: Vec<TocSection> = Vec::new();

    for entry in entries {
        let lowered = entry.title.to_lowercase();
        let is_heading = keywords.iter().any(|k| lowered.contains(k.as_str()));
        let breaks_away = sections
            .last()
            .map_or(true, |s| entry.page > s.page.saturating_add(page_gap));

        if is_heading || breaks_away {
            sections.push(TocSection {
                title: entry.title,
                page: entry.page,
                entries: Vec::new(),
            });
        } else if let Some(section) = sections.last_mut() {
            section.entries.push(entry);
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_keywords() -> Vec<String> {
        SECTION_KEYWORDS.iter().map(|k| k.to_string()).collect()
    }

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_parses_title_and_trailing_page() {
        let entries = parse_lines(&lines(&["Introduction 7"]));
        assert_eq!(
            entries,
            vec![TocEntry {
                title: "Introduction".to_string(),
                page: 7
            }]
        );
    }

    #[test]
    fn test_normalizes_leader_dots_and_confusables() {
        let entries = parse_lines(&lines(&["lV. Results .......... 42"]));
        assert_eq!(
            entries,
            vec![TocEntry {
                title: "IV. Results".to_string(),
                page: 42
            }]
        );
    }

    #[test]
    fn test_rejects_page_zero() {
        assert!(parse_lines(&lines(&["Preface 0"])).is_empty());
    }

    #[test]
    fn test_rejects_lines_without_page_number() {
        assert!(parse_lines(&lines(&["Table of Contents"])).is_empty());
    }

    #[test]
    fn test_rejects_year_like_trailing_runs() {
        // four digits never parse as a page number
        assert!(parse_lines(&lines(&["Copyright 2023"])).is_empty());
    }

    #[test]
    fn test_rejects_short_titles() {
        // a stray page-number-only line normalizes to a title below 3 chars
        assert!(parse_lines(&lines(&["x 9", "12"])).is_empty());
    }

    #[test]
    fn test_entries_are_sorted_by_page() {
        let entries = parse_lines(&lines(&["Appendix 90", "Preface 2", "Index 95"]));
        let pages: Vec<u32> = entries.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![2, 90, 95]);
    }

    #[test]
    fn test_never_emits_invalid_entries() {
        let noisy = lines(&["", ". 5", "0", "ok 0", "A very long heading 12"]);
        for entry in parse_lines(&noisy) {
            assert!(entry.page >= 1);
            assert!(entry.title.chars().count() >= 3);
        }
    }

    #[test]
    fn test_keyword_entries_start_sections() {
        let entries = vec![
            TocEntry {
                title: "Chapter 1".into(),
                page: 10,
            },
            TocEntry {
                title: "1.1 Basics".into(),
                page: 11,
            },
            TocEntry {
                title: "1.2 More".into(),
                page: 13,
            },
            TocEntry {
                title: "Chapter 2".into(),
                page: 20,
            },
        ];
        let sections = group_sections(entries, &default_keywords(), SECTION_PAGE_GAP);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Chapter 1");
        assert_eq!(sections[0].entries.len(), 2);
        assert_eq!(sections[1].title, "Chapter 2");
        assert!(sections[1].entries.is_empty());
    }

    #[test]
    fn test_page_gap_starts_a_section_without_keyword() {
        let entries = vec![
            TocEntry {
                title: "Foo".into(),
                page: 1,
            },
            TocEntry {
                title: "Bar".into(),
                page: 50,
            },
        ];
        let sections = group_sections(entries, &default_keywords(), SECTION_PAGE_GAP);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "Bar");
    }

    #[test]
    fn test_gap_exactly_at_threshold_stays_in_section() {
        let entries = vec![
            TocEntry {
                title: "Foo".into(),
                page: 1,
            },
            TocEntry {
                title: "Bar".into(),
                page: 6,
            },
        ];
        let sections = group_sections(entries, &default_keywords(), SECTION_PAGE_GAP);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].entries.len(), 1);
    }

    #[test]
    fn test_flattened_sections_preserve_page_order() {
        let entries = parse_lines(&lines(&[
            "Chapter 1 ..... 3",
            "First steps ..... 4",
            "Chapter 2 ..... 9",
            "Deep dive ..... 11",
        ]));
        let sections = group_sections(entries, &default_keywords(), SECTION_PAGE_GAP);
        let mut flattened = Vec::new();
        for section in &sections {
            flattened.push(section.page);
            flattened.extend(section.entries.iter().map(|e| e.page));
        }
        let mut sorted = flattened.clone();
        sorted.sort_unstable();
        assert_eq!(flattened, sorted);
    }
}
