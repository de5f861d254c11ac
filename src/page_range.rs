use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: PageRef,
    pub end: Option<PageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Number(u32),
    End,
}

impl PageRange {
    /// Parse a page range specification like "5", "1-5", "9-6", or "3-end".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page range"));
        }

        if let Some(dash_pos) = s.find('-') {
            // a leading dash would be a negative number, not a range
            if dash_pos == 0 {
                return Err(anyhow!("Invalid page range: {}", s));
            }

            let start = parse_page_ref(&s[..dash_pos])?;
            let end = parse_page_ref(&s[dash_pos + 1..])?;

            Ok(PageRange {
                start,
                end: Some(end),
            })
        } else {
            Ok(PageRange {
                start: parse_page_ref(s)?,
                end: None,
            })
        }
    }

    /// Expand this range into a list of 1-based page numbers.
    pub fn expand(&self, total_pages: u32) -> Result<Vec<u32>> {
        let start = match &self.start {
            PageRef::Number(n) => *n,
            PageRef::End => total_pages,
        };

        let end = match &self.end {
            Some(PageRef::Number(n)) => *n,
            Some(PageRef::End) => total_pages,
            None => start,
        };

        if start == 0 || end == 0 {
            return Err(anyhow!("Page numbers must be >= 1"));
        }
        if start > total_pages {
            return Err(anyhow!(
                "Start page {} exceeds total pages {}",
                start,
                total_pages
            ));
        }
        if end > total_pages {
            return Err(anyhow!(
                "End page {} exceeds total pages {}",
                end,
                total_pages
            ));
        }

        let pages: Vec<u32> = if start <= end {
            (start..=end).collect()
        } else {
            (end..=start).rev().collect()
        };

        Ok(pages)
    }
}

fn parse_page_ref(s: &str) -> Result<PageRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(PageRef::End)
    } else {
        s.parse::<u32>()
            .map(PageRef::Number)
            .map_err(|_| anyhow!("Invalid page number: {}", s))
    }
}

/// Expand a comma-separated range string like "1-5,10,15-end" into 1-based
/// page numbers.
pub fn expand_page_ranges(s: &str, total_pages: u32) -> Result<Vec<u32>> {
    let mut pages = Vec::new();
    for part in s.split(',') {
        let range = PageRange::parse(part.trim())?;
        pages.extend(range.expand(total_pages)?);
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        let range = PageRange::parse("5").unwrap();
        assert_eq!(range.start, PageRef::Number(5));
        assert_eq!(range.end, None);
        assert_eq!(range.expand(10).unwrap(), vec![5]);
    }

    #[test]
    fn test_page_range() {
        let range = PageRange::parse("1-5").unwrap();
        assert_eq!(range.expand(10).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_reverse_range() {
        let range = PageRange::parse("5-1").unwrap();
        assert_eq!(range.expand(10).unwrap(), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_end_keyword() {
        let range = PageRange::parse("5-end").unwrap();
        assert_eq!(range.expand(10).unwrap(), vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_comma_separated() {
        let pages = expand_page_ranges("1-3,7,9-10", 10).unwrap();
        assert_eq!(pages, vec![1, 2, 3, 7, 9, 10]);
    }

    #[test]
    fn test_invalid_page_zero() {
        let range = PageRange::parse("0").unwrap();
        assert!(range.expand(10).is_err());
    }

    #[test]
    fn test_page_exceeds_total() {
        let range = PageRange::parse("15").unwrap();
        assert!(range.expand(10).is_err());
    }

    #[test]
    fn test_leading_dash_is_invalid() {
        assert!(PageRange::parse("-5").is_err());
    }
}
