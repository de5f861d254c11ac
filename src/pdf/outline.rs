//! Native outline adaptation.
//!
//! When a document carries an `/Outlines` tree there is nothing to guess:
//! the tree is walked as-is and each item's destination is resolved to a
//! physical page index. Resolution is isolated per node: a dangling or
//! malformed destination leaves that one node without a target (rendered but
//! not navigable) while its siblings and children resolve normally.

use anyhow::{Context, Result};
use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

use crate::pdf::document::decode_text;

#[derive(Debug, Clone)]
pub struct OutlineNode {
    pub title: String,
    /// Resolved physical page index; `None` when the destination could not
    /// be resolved.
    pub page: Option<u32>,
    pub level: u32,
    pub children: Vec<OutlineNode>,
}

/// Flattened view for list-shaped surfaces (CLI, MCP).
#[derive(Debug, Clone)]
pub struct FlatOutlineEntry {
    pub title: String,
    pub page: Option<u32>,
    pub level: u32,
}

/// Extract the document's native outline, empty when it has none.
pub fn extract_outline(doc: &Document) -> Result<Vec<OutlineNode>> {
    let catalog = doc.catalog().context("Document has no catalog")?;

    let Ok(Object::Reference(outlines_ref)) = catalog.get(b"Outlines") else {
        return Ok(Vec::new());
    };
    let Ok(outlines) = doc.get_dictionary(*outlines_ref) else {
        return Ok(Vec::new());
    };
    let Ok(Object::Reference(first)) = outlines.get(b"First") else {
        return Ok(Vec::new());
    };

    let pages = page_index(doc);
    Ok(walk_siblings(doc, *first, &pages, 0))
}

pub fn flatten_outline(nodes: &[OutlineNode]) -> Vec<FlatOutlineEntry> {
    let mut flat = Vec::new();
    push_flat(nodes, &mut flat);
    flat
}

fn push_flat(nodes: &[OutlineNode], flat: &mut Vec<FlatOutlineEntry>) {
    for node in nodes {
        flat.push(FlatOutlineEntry {
            title: node.title.clone(),
            page: node.page,
            level: node.level,
        });
        push_flat(&node.children, flat);
    }
}

/// Page object id → 1-based physical index.
fn page_index(doc: &Document) -> HashMap<ObjectId, u32> {
    doc.get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect()
}

fn walk_siblings(
    doc: &Document,
    first: ObjectId,
    pages: &HashMap<ObjectId, u32>,
    level: u32,
) -> Vec<OutlineNode> {
    let mut nodes = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = Some(first);

    while let Some(id) = cursor {
        // malformed Next chains can loop back on themselves
        if !seen.insert(id) {
            break;
        }
        let Ok(item) = doc.get_dictionary(id) else {
            break;
        };

        let title = match item.get(b"Title") {
            Ok(Object::String(bytes, _)) => decode_text(bytes),
            _ => "Untitled".to_string(),
        };

        let page = resolve_item_target(doc, item, pages);
        if page.is_none() {
            debug!("outline item {:?} has no resolvable destination", title);
        }

        let children = match item.get(b"First") {
            Ok(Object::Reference(child)) => walk_siblings(doc, *child, pages, level + 1),
            _ => Vec::new(),
        };

        nodes.push(OutlineNode {
            title,
            page,
            level,
            children,
        });

        cursor = match item.get(b"Next") {
            Ok(Object::Reference(next)) => Some(*next),
            _ => None,
        };
    }

    nodes
}

/// Destination of one outline item: direct `/Dest`, or the `/D` of a `GoTo`
/// action (inline or referenced).
fn resolve_item_target(
    doc: &Document,
    item: &Dictionary,
    pages: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    if let Ok(dest) = item.get(b"Dest") {
        return target_of_dest(doc, dest, pages);
    }

    let action = match item.get(b"A") {
        Ok(Object::Reference(action_ref)) => doc.get_dictionary(*action_ref).ok(),
        Ok(Object::Dictionary(action)) => Some(action),
        _ => None,
    }?;

    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind == b"GoTo" => {
            target_of_dest(doc, action.get(b"D").ok()?, pages)
        }
        _ => None,
    }
}

fn target_of_dest(doc: &Document, dest: &Object, pages: &HashMap<ObjectId, u32>) -> Option<u32> {
    match dest {
        // named destination, looked up through the catalog
        Object::String(name, _) | Object::Name(name) => named_target(doc, name, pages),
        // explicit [page /XYZ ...] array
        Object::Array(parts) => match parts.first() {
            Some(Object::Reference(page_ref)) => pages.get(page_ref).copied(),
            _ => None,
        },
        // some producers wrap the array in a {D: [...]} dictionary
        Object::Dictionary(dict) => target_of_dest(doc, dict.get(b"D").ok()?, pages),
        Object::Reference(r) => target_of_dest(doc, doc.get_object(*r).ok()?, pages),
        _ => None,
    }
}

fn named_target(doc: &Document, name: &[u8], pages: &HashMap<ObjectId, u32>) -> Option<u32> {
    let catalog = doc.catalog().ok()?;

    // modern Names/Dests name tree
    if let Ok(Object::Reference(names_ref)) = catalog.get(b"Names") {
        if let Ok(names) = doc.get_dictionary(*names_ref) {
            if let Ok(Object::Reference(dests_ref)) = names.get(b"Dests") {
                if let Some(page) = name_tree_lookup(doc, *dests_ref, name, pages) {
                    return Some(page);
                }
            }
        }
    }

    // legacy catalog-level Dests dictionary
    if let Ok(Object::Reference(dests_ref)) = catalog.get(b"Dests") {
        if let Ok(dests) = doc.get_dictionary(*dests_ref) {
            if let Ok(dest) = dests.get(name) {
                return target_of_dest(doc, dest, pages);
            }
        }
    }

    None
}

fn name_tree_lookup(
    doc: &Document,
    node_id: ObjectId,
    name: &[u8],
    pages: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    let node = doc.get_dictionary(node_id).ok()?;

    if let Ok(Object::Array(names)) = node.get(b"Names") {
        for pair in names.chunks(2) {
            if let [Object::String(key, _), value] = pair {
                if key == name {
                    return target_of_dest(doc, value, pages);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = node.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_ref) = kid {
                if let Some(page) = name_tree_lookup(doc, *kid_ref, name, pages) {
                    return Some(page);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    /// Two-page document with a three-item outline: the first item points at
    /// page 2, the second at a dangling object, and the second's child at
    /// page 1.
    fn sample_doc() -> Document {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let page1 = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        let page2 = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page1), Object::Reference(page2)],
                "Count" => 2,
            }),
        );

        let outlines_id = doc.new_object_id();
        let item1_id = doc.new_object_id();
        let item2_id = doc.new_object_id();
        let child_id = doc.new_object_id();
        let dangling = (9999, 0);

        doc.objects.insert(
            item1_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::String(b"Overview".to_vec(), StringFormat::Literal),
                "Parent" => outlines_id,
                "Next" => item2_id,
                "Dest" => vec![
                    Object::Reference(page2),
                    Object::Name(b"XYZ".to_vec()),
                ],
            }),
        );
        doc.objects.insert(
            item2_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::String(b"Broken".to_vec(), StringFormat::Literal),
                "Parent" => outlines_id,
                "Prev" => item1_id,
                "First" => child_id,
                "Dest" => vec![
                    Object::Reference(dangling),
                    Object::Name(b"Fit".to_vec()),
                ],
            }),
        );
        doc.objects.insert(
            child_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::String(b"Detail".to_vec(), StringFormat::Literal),
                "Parent" => item2_id,
                "Dest" => vec![
                    Object::Reference(page1),
                    Object::Name(b"XYZ".to_vec()),
                ],
            }),
        );
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => item1_id,
                "Last" => item2_id,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "Outlines" => outlines_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc
    }

    #[test]
    fn test_resolves_pages_and_levels() {
        let outline = extract_outline(&sample_doc()).unwrap();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].title, "Overview");
        assert_eq!(outline[0].page, Some(2));
        assert_eq!(outline[0].level, 0);
        assert_eq!(outline[1].children[0].level, 1);
    }

    #[test]
    fn test_dangling_destination_only_affects_its_node() {
        let outline = extract_outline(&sample_doc()).unwrap();
        let broken = &outline[1];
        assert_eq!(broken.title, "Broken");
        assert_eq!(broken.page, None);
        // sibling and child still resolved
        assert_eq!(outline[0].page, Some(2));
        assert_eq!(broken.children[0].page, Some(1));
    }

    #[test]
    fn test_document_without_outline_is_empty_not_error() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page1 = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page1)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        assert!(extract_outline(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_flatten_preserves_depth_first_order() {
        let outline = extract_outline(&sample_doc()).unwrap();
        let flat = flatten_outline(&outline);
        let titles: Vec<&str> = flat.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Overview", "Broken", "Detail"]);
        assert_eq!(flat[2].level, 1);
    }
}
