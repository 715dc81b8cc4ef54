//! PDF transforms for the PDF Master backend
//!
//! Every operation takes raw PDF (or image) bytes and returns serialized
//! PDF bytes, delegating object-model work to lopdf:
//! - `merge_documents`: concatenate pages of several documents
//! - `split_document`: one document per inclusive page range
//! - `rotate_document`: add a rotation delta to selected pages
//! - `compress_document`: re-serialize without object streams
//! - `images_to_pdf`: one page per JPEG/PNG image
//! - `protect_document`: password protection written by qpdf

pub mod compress;
pub mod error;
pub mod images;
pub mod merge;
mod pages;
pub mod protect;
pub mod rotate;
pub mod split;

#[cfg(test)]
pub(crate) mod test_support;

pub use compress::{compress_document, CompressOutcome};
pub use error::PdfError;
pub use images::{images_to_pdf, ImageInput, ImageKind};
pub use merge::merge_documents;
pub use protect::{protect_document, OwnerPasswordPolicy, ProtectedDocument};
pub use rotate::{rotate_document, RotateRequest, DEFAULT_ROTATION};
pub use split::{split_document, SplitPart};

use lopdf::Document;

/// Parse PDF bytes into a document
pub fn load_document(bytes: &[u8]) -> Result<Document, PdfError> {
    Document::load_mem(bytes).map_err(|e| PdfError::ParseError(e.to_string()))
}

/// Serialize a document to bytes
pub fn save_document(doc: &mut Document) -> Result<Vec<u8>, PdfError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::OperationError(format!("Save failed: {}", e)))?;
    Ok(buffer)
}

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfError> {
    let doc = load_document(bytes)?;
    Ok(doc.get_pages().len() as u32)
}

/// Parse the `pageRanges` form field: a JSON array of `[start, end]` pairs
pub fn parse_page_ranges(json: &str) -> Result<Vec<(i64, i64)>, PdfError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse the `pages` form field: a JSON array of 0-indexed page numbers
pub fn parse_page_indices(json: &str) -> Result<Vec<i64>, PdfError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a human range list like "1-3, 5, 8-10" into `(start, end)` pairs
///
/// Order is preserved and duplicates are kept, since each pair becomes
/// its own output document.
pub fn parse_range_spec(input: &str) -> Result<Vec<(u32, u32)>, PdfError> {
    let mut ranges = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| PdfError::InvalidRange(format!("Invalid start: {}", start)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| PdfError::InvalidRange(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(PdfError::InvalidRange(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }
            ranges.push((start, end));
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| PdfError::InvalidRange(format!("Invalid page: {}", part)))?;
            ranges.push((page, page));
        }
    }

    Ok(ranges)
}
