//! Native page label decoding.
//!
//! Documents may declare how their pages are numbered through the catalog's
//! `/PageLabels` number tree (front matter in roman numerals, content
//! restarting at 1, prefixed appendix pages). These labels describe what the
//! producer *intended* to print; the page-map resolver deliberately ignores
//! them and reads what is actually typeset, but showing both side by side is
//! a useful diagnostic.

use anyhow::Result;
use lopdf::{Document, Object};

use crate::pdf::document::decode_text;

#[derive(Debug, Clone)]
pub struct PageLabel {
    /// 1-based physical page index.
    pub physical_page: u32,
    /// The label as the document declares it, e.g. "iv", "7", "A-2".
    pub logical_label: String,
}

#[derive(Debug, Clone)]
struct LabelRange {
    /// 0-indexed physical page where this range starts.
    start_page: u32,
    style: LabelStyle,
    prefix: String,
    start_value: u32,
}

#[derive(Debug, Clone, Copy)]
enum LabelStyle {
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
    PrefixOnly,
}

/// Decode the document's declared page labels, one per physical page.
///
/// Documents without a `/PageLabels` tree get the default decimal identity
/// labeling ("1", "2", ...).
pub fn extract_page_labels(doc: &Document) -> Result<Vec<PageLabel>> {
    let total_pages = doc.get_pages().len() as u32;

    let catalog = doc.catalog()?;
    let tree = match catalog.get(b"PageLabels") {
        Ok(Object::Reference(r)) => doc.get_dictionary(*r).ok(),
        Ok(Object::Dictionary(d)) => Some(d),
        _ => None,
    };

    let mut ranges = Vec::new();
    if let Some(tree) = tree {
        collect_ranges(doc, tree, &mut ranges);
        ranges.sort_by_key(|r| r.start_page);
    }

    Ok((1..=total_pages)
        .map(|physical| PageLabel {
            physical_page: physical,
            logical_label: label_for(&ranges, physical - 1),
        })
        .collect())
}

/// Walk a `/PageLabels` number tree, flattening leaf `Nums` pairs into
/// ranges. Malformed pairs are skipped, never fatal.
fn collect_ranges(doc: &Document, node: &lopdf::Dictionary, ranges: &mut Vec<LabelRange>) {
    if let Ok(Object::Array(nums)) = node.get(b"Nums") {
        for pair in nums.chunks(2) {
            let [Object::Integer(start_page), value] = pair else {
                continue;
            };
            if *start_page < 0 {
                continue;
            }
            let label = match value {
                Object::Dictionary(d) => d,
                Object::Reference(r) => match doc.get_dictionary(*r) {
                    Ok(d) => d,
                    Err(_) => continue,
                },
                _ => continue,
            };
            ranges.push(LabelRange {
                start_page: *start_page as u32,
                style: style_of(label),
                prefix: match label.get(b"P") {
                    Ok(Object::String(bytes, _)) => decode_text(bytes),
                    _ => String::new(),
                },
                start_value: match label.get(b"St") {
                    Ok(Object::Integer(n)) if *n >= 1 => *n as u32,
                    _ => 1,
                },
            });
        }
    }

    if let Ok(Object::Array(kids)) = node.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_ref) = kid {
                if let Ok(kid_dict) = doc.get_dictionary(*kid_ref) {
                    collect_ranges(doc, kid_dict, ranges);
                }
            }
        }
    }
}

fn style_of(label: &lopdf::Dictionary) -> LabelStyle {
    match label.get(b"S") {
        Ok(Object::Name(name)) => match name.as_slice() {
            b"D" => LabelStyle::Decimal,
            b"r" => LabelStyle::LowerRoman,
            b"R" => LabelStyle::UpperRoman,
            b"a" => LabelStyle::LowerAlpha,
            b"A" => LabelStyle::UpperAlpha,
            _ => LabelStyle::Decimal,
        },
        _ => LabelStyle::PrefixOnly,
    }
}

fn label_for(ranges: &[LabelRange], page_index: u32) -> String {
    let Some(range) = ranges.iter().rev().find(|r| r.start_page <= page_index) else {
        return (page_index + 1).to_string();
    };

    let value = range.start_value + (page_index - range.start_page);
    let rendered = match range.style {
        LabelStyle::Decimal => value.to_string(),
        LabelStyle::LowerRoman => to_roman(value).to_lowercase(),
        LabelStyle::UpperRoman => to_roman(value),
        LabelStyle::LowerAlpha => to_alpha(value).to_lowercase(),
        LabelStyle::UpperAlpha => to_alpha(value),
        LabelStyle::PrefixOnly => String::new(),
    };

    format!("{}{}", range.prefix, rendered)
}

fn to_roman(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let values = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut result = String::new();
    for (value, numeral) in values {
        while n >= value {
            result.push_str(numeral);
            n -= value;
        }
    }
    result
}

fn to_alpha(n: u32) -> String {
    if n == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut remaining = n - 1;

    loop {
        let letter = ((remaining % 26) as u8 + b'A') as char;
        result.insert(0, letter);
        if remaining < 26 {
            break;
        }
        remaining = remaining / 26 - 1;
    }

    result
}
