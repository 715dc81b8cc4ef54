//! PDF Merge
//!
//! Combines multiple PDFs into a single document, pages in input order.

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::PdfError;
use crate::pages::rebuild_page_tree;
use crate::{load_document, save_document};

/// Merge multiple PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. Load every input; the first becomes the destination
/// 3. For each remaining source:
///    a. Shift its object ids past the destination's current maximum
///    b. Import all objects with remapped references
///    c. Append its pages to the destination page list
/// 4. Rebuild the destination page tree as one flat list
/// 5. Prune the sources' orphaned catalogs and page nodes, compress, save
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>, PdfError> {
    if documents.is_empty() {
        return Err(PdfError::OperationError("No documents to merge".into()));
    }

    let mut loaded_docs = Vec::with_capacity(documents.len());
    for (i, doc_bytes) in documents.iter().enumerate() {
        let doc = load_document(doc_bytes).map_err(|e| {
            PdfError::ParseError(format!("Failed to load document {}: {}", i + 1, e))
        })?;
        loaded_docs.push(doc);
    }

    let mut sources = loaded_docs.into_iter();
    let mut dest = match sources.next() {
        Some(doc) => doc,
        None => return Err(PdfError::OperationError("No documents to merge".into())),
    };
    let mut dest_max_id = dest.max_id;
    let mut dest_page_refs = page_references(&dest);

    for source in sources {
        let id_offset = dest_max_id;
        let source_pages = page_references(&source);
        let source_max_id = source.max_id;

        for (old_id, mut object) in source.objects.into_iter() {
            shift_references(&mut object, id_offset);
            dest.objects.insert((old_id.0 + id_offset, old_id.1), object);
        }

        dest_page_refs.extend(
            source_pages
                .into_iter()
                .map(|(id, gen)| (id + id_offset, gen)),
        );

        dest_max_id = (source_max_id + id_offset).max(dest_max_id);
    }

    dest.max_id = dest_max_id;
    rebuild_page_tree(&mut dest, &dest_page_refs)?;

    debug!(pages = dest_page_refs.len(), "merged page tree rebuilt");

    dest.prune_objects();
    dest.compress();
    save_document(&mut dest)
}

/// All page object references of a document, in page order
fn page_references(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Recursively shift object references by `offset`
fn shift_references(object: &mut Object, offset: u32) {
    match object {
        Object::Reference(id) => id.0 += offset,
        Object::Array(items) => {
            for item in items.iter_mut() {
                shift_references(item, offset);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                shift_references(value, offset);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                shift_references(value, offset);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pdf, page_labels};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(&[]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No documents to merge"));
    }

    #[test]
    fn test_merge_single_document_keeps_pages() {
        let pdf = create_test_pdf(2, "Single");
        let result = merge_documents(&[pdf]).unwrap();
        assert_eq!(page_labels(&result), vec!["Single-Page-1", "Single-Page-2"]);
    }

    #[test]
    fn test_merge_two_documents_combines_pages() {
        let doc_a = create_test_pdf(2, "DocA");
        let doc_b = create_test_pdf(3, "DocB");

        let merged = merge_documents(&[doc_a, doc_b]).unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 5, "Merged document should have 5 pages");
    }

    #[test]
    fn test_merge_preserves_page_order() {
        let doc1 = create_test_pdf(2, "First");
        let doc2 = create_test_pdf(1, "Second");
        let doc3 = create_test_pdf(2, "Third");

        let merged = merge_documents(&[doc1, doc2, doc3]).unwrap();

        assert_eq!(
            page_labels(&merged),
            vec![
                "First-Page-1",
                "First-Page-2",
                "Second-Page-1",
                "Third-Page-1",
                "Third-Page-2",
            ]
        );
    }

    #[test]
    fn test_merged_pages_keep_inherited_media_box() {
        let merged =
            merge_documents(&[create_test_pdf(1, "A"), create_test_pdf(1, "B")]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        for page_id in doc.get_pages().values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            assert!(page.has(b"MediaBox"));
        }
    }

    #[test]
    fn test_merge_reports_which_input_failed() {
        let good = create_test_pdf(1, "Good");
        let err = merge_documents(&[good, b"garbage".to_vec()]).unwrap_err();
        assert!(err.to_string().contains("document 2"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Property: merged page count is the sum of the inputs' page counts
        #[test]
        fn merged_page_count_is_sum(counts in prop::collection::vec(1u32..5, 2..5)) {
            let docs: Vec<Vec<u8>> = counts
                .iter()
                .enumerate()
                .map(|(i, &n)| create_test_pdf(n, &format!("Doc{}", i)))
                .collect();

            let merged = merge_documents(&docs).unwrap();
            let total: u32 = counts.iter().sum();
            prop_assert_eq!(crate::get_page_count(&merged).unwrap(), total);
        }
    }
}
