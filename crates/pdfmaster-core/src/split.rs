//! PDF Split
//!
//! Extracts one document per inclusive page range using
//! "Construction by Whitelist": the kept pages become the whole page tree
//! and every object no longer reachable from the catalog is pruned.

use lopdf::Document;
use tracing::debug;

use crate::error::PdfError;
use crate::pages::rebuild_page_tree;
use crate::{load_document, save_document};

/// One output document of a split
#[derive(Debug, Clone)]
pub struct SplitPart {
    /// 1-based position of the range in the request
    pub index: usize,
    /// First page (1-indexed, inclusive)
    pub start: u32,
    /// Last page after clamping to the page count (inclusive)
    pub end: u32,
    pub bytes: Vec<u8>,
}

impl SplitPart {
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Split a PDF into one document per `[start, end]` range (1-indexed, inclusive)
///
/// - `end` is clamped to the page count
/// - a range whose `start` is past the last page is skipped
/// - `start < 1` or `start > end` fails the whole request before any
///   output is produced
///
/// With no ranges given, the whole document is one range.
pub fn split_document(
    bytes: &[u8],
    ranges: Option<Vec<(i64, i64)>>,
) -> Result<Vec<SplitPart>, PdfError> {
    let doc = load_document(bytes)?;
    let page_count = doc.get_pages().len() as u32;

    let ranges = ranges.unwrap_or_else(|| match page_count {
        0 => Vec::new(),
        n => vec![(1, n as i64)],
    });

    for &(start, end) in &ranges {
        if start < 1 {
            return Err(PdfError::InvalidRange(format!(
                "Page numbers must be >= 1 (got {})",
                start
            )));
        }
        if start > end {
            return Err(PdfError::InvalidRange(format!(
                "Start {} > end {}",
                start, end
            )));
        }
    }

    let mut parts = Vec::new();
    for (i, &(start, end)) in ranges.iter().enumerate() {
        if start > page_count as i64 {
            debug!(
                start,
                page_count, "skipping split range that starts past the last page"
            );
            continue;
        }

        let start = start as u32;
        let end = end.min(page_count as i64) as u32;
        let bytes = extract_pages(&doc, start, end)?;

        parts.push(SplitPart {
            index: i + 1,
            start,
            end,
            bytes,
        });
    }

    Ok(parts)
}

/// Build a document containing only pages `start..=end` of `doc`
fn extract_pages(doc: &Document, start: u32, end: u32) -> Result<Vec<u8>, PdfError> {
    let pages = doc.get_pages();
    let keep: Vec<_> = (start..=end)
        .filter_map(|page_number| pages.get(&page_number).copied())
        .collect();

    let mut new_doc = doc.clone();
    rebuild_page_tree(&mut new_doc, &keep)?;

    // Compress to remove orphaned objects
    new_doc.prune_objects();
    new_doc.compress();

    save_document(&mut new_doc)
}
