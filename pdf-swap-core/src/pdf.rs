//! Thin helpers over the `lopdf` object model

use crate::error::{SwapError, SwapResult};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in damaged files
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when neither a page nor its ancestors define a MediaBox
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

pub fn load_principal(bytes: &[u8]) -> SwapResult<Document> {
    let document = Document::load_mem(bytes)
        .map_err(|e| SwapError::internal(format!("Error while opening principal ({e})")))?;
    if document.get_pages().is_empty() {
        return Err(SwapError::internal(
            "Error while opening principal (document has no pages)",
        ));
    }
    Ok(document)
}

pub fn load_annex(name: &str, bytes: &[u8]) -> SwapResult<Document> {
    let document = Document::load_mem(bytes).map_err(|e| {
        SwapError::internal(format!("Error while opening annexe \"{name}\" ({e})"))
    })?;
    if document.get_pages().is_empty() {
        return Err(SwapError::internal(format!(
            "Error while opening annexe \"{name}\" (document has no pages)"
        )));
    }
    Ok(document)
}

/// Page object ids in reading order.
pub fn page_ids(document: &Document) -> Vec<ObjectId> {
    document.get_pages().into_values().collect()
}

/// Copy inherited attributes onto every page so pages survive being detached
/// from their original page tree.
pub fn flatten_inheritance(document: &mut Document) {
    for page_id in page_ids(document) {
        let inherited = inherited_attributes(document, page_id);
        if inherited.is_empty() {
            continue;
        }
        if let Ok(Object::Dictionary(page)) = document.get_object_mut(page_id) {
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }
}

fn inherited_attributes(document: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found = Vec::new();
    let Ok(page) = document.get_dictionary(page_id) else {
        return found;
    };

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut parent = parent_of(page);
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = document.get_dictionary(parent_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = parent_of(node);
        depth += 1;
    }

    found
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

/// The page's MediaBox as `[x0, y0, x1, y1]`, resolving indirect arrays.
pub fn media_box(document: &Document, page: &Dictionary) -> [f32; 4] {
    page_box(document, page, b"MediaBox").unwrap_or(DEFAULT_MEDIA_BOX)
}

/// The area a viewer shows: the CropBox clipped to the MediaBox, or the
/// MediaBox when the page has no usable CropBox.
pub fn visible_box(document: &Document, page: &Dictionary) -> [f32; 4] {
    let media = media_box(document, page);
    let Some(crop) = page_box(document, page, b"CropBox") else {
        return media;
    };

    let clipped = [
        crop[0].max(media[0]),
        crop[1].max(media[1]),
        crop[2].min(media[2]),
        crop[3].min(media[3]),
    ];
    if clipped[0] < clipped[2] && clipped[1] < clipped[3] {
        clipped
    } else {
        media
    }
}

/// A rectangle entry normalised so that the first corner is the lower-left one.
fn page_box(document: &Document, page: &Dictionary, key: &[u8]) -> Option<[f32; 4]> {
    let array = match page.get(key) {
        Ok(Object::Array(array)) => array,
        Ok(Object::Reference(id)) => match document.get_object(*id) {
            Ok(Object::Array(array)) => array,
            _ => return None,
        },
        _ => return None,
    };

    let values: Vec<f32> = array.iter().filter_map(number).collect();
    match values.as_slice() {
        [ax, ay, bx, by] => Some([ax.min(*bx), ay.min(*by), ax.max(*bx), ay.max(*by)]),
        _ => None,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Resolve `object` into an owned dictionary, following one reference.
pub fn resolve_dictionary(document: &Document, object: Option<&Object>) -> Dictionary {
    match object {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(id)) => document
            .get_dictionary(*id)
            .cloned()
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    }
}
