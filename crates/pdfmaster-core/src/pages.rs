//! Page tree helpers shared by the transforms

use lopdf::xref::XrefType;
use lopdf::{Document, Object, ObjectId};

use crate::error::PdfError;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Keys a cross-reference stream leaves behind in the trailer dictionary
const XREF_STREAM_TRAILER_KEYS: [&[u8]; 8] = [
    b"Type",
    b"W",
    b"Index",
    b"Filter",
    b"DecodeParms",
    b"Length",
    b"XRefStm",
    b"Prev",
];

/// Guard against cyclic /Parent chains in damaged files
const MAX_TREE_DEPTH: usize = 64;

/// Look up a page attribute on the page itself or the nearest ancestor
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node_id = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Object id of the root /Pages node
pub(crate) fn root_pages_id(doc: &Document) -> Result<ObjectId, PdfError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::OperationError("No Root in trailer".into()))?;

    doc.get_dictionary(catalog_id)
        .map_err(|_| PdfError::OperationError("Catalog not found".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::OperationError("No Pages in catalog".into()))
}

/// Replace the page tree with a flat list of `page_ids` under the root node
///
/// Inherited attributes are copied onto each page first, so pages keep
/// their geometry and resources once detached from intermediate nodes or
/// from another document's tree.
pub(crate) fn rebuild_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<(), PdfError> {
    let pages_id = root_pages_id(doc)?;

    for &page_id in page_ids {
        let inherited: Vec<(&[u8], Object)> = INHERITABLE
            .iter()
            .filter_map(|key| {
                inherited_attribute(doc, page_id, key).map(|value| (*key, value.clone()))
            })
            .collect();

        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|_| PdfError::OperationError(format!("Page {:?} not found", page_id)))?;
        for (key, value) in inherited {
            if !page.has(key) {
                page.set(key.to_vec(), value);
            }
        }
        page.set("Parent", Object::Reference(pages_id));
    }

    let pages = doc
        .get_dictionary_mut(pages_id)
        .map_err(|_| PdfError::OperationError("Invalid pages dictionary".into()))?;
    pages.set(
        "Kids",
        Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages.set("Count", Object::Integer(page_ids.len() as i64));

    Ok(())
}

/// Drop object and cross-reference streams and switch to a classic xref table
///
/// lopdf expands compressed objects on load; the containers themselves are
/// dead weight once the file is written back with a classic xref table.
pub(crate) fn strip_object_streams(doc: &mut Document) {
    doc.reference_table.cross_reference_type = XrefType::CrossReferenceTable;

    doc.objects.retain(|_, object| {
        let stream_type = object
            .as_stream()
            .ok()
            .and_then(|stream| stream.dict.get(b"Type").ok())
            .and_then(|t| t.as_name().ok());
        !matches!(stream_type, Some(b"ObjStm") | Some(b"XRef"))
    });

    for key in XREF_STREAM_TRAILER_KEYS {
        doc.trailer.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_test_document;

    #[test]
    fn test_inherited_media_box_found_on_parent() {
        let doc = build_test_document(2, "Inherit");
        let page_id = *doc.get_pages().get(&1).unwrap();
        let media_box = inherited_attribute(&doc, page_id, b"MediaBox").unwrap();
        assert_eq!(media_box.as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_rebuild_materializes_inherited_attributes() {
        let mut doc = build_test_document(3, "Rebuild");
        let pages = doc.get_pages();
        let keep = vec![pages[&3], pages[&1]];

        rebuild_page_tree(&mut doc, &keep).unwrap();

        let new_pages = doc.get_pages();
        assert_eq!(new_pages.len(), 2);
        assert_eq!(new_pages[&1], keep[0]);
        assert_eq!(new_pages[&2], keep[1]);
        let page = doc.get_dictionary(keep[0]).unwrap();
        assert!(page.has(b"MediaBox"));
    }
}
