//! PDF "Compress"
//!
//! Re-serializes a document without object streams. No stream data is
//! recompressed, so the size change is often small and can be negative;
//! the outcome reports it as measured.

use crate::error::PdfError;
use crate::pages::strip_object_streams;
use crate::{load_document, save_document};

/// Result of re-serializing a document
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    pub bytes: Vec<u8>,
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressOutcome {
    /// Size reduction as a percentage of the original; negative when the file grew
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        let original = self.original_size as f64;
        (original - self.compressed_size as f64) / original * 100.0
    }

    /// Reduction formatted with two decimals and a percent sign, e.g. "12.50%"
    pub fn reduction_label(&self) -> String {
        format!("{:.2}%", self.reduction_percent())
    }
}

pub fn compress_document(bytes: &[u8]) -> Result<CompressOutcome, PdfError> {
    let mut doc = load_document(bytes)?;
    strip_object_streams(&mut doc);
    let output = save_document(&mut doc)?;

    Ok(CompressOutcome {
        original_size: bytes.len(),
        compressed_size: output.len(),
        bytes: output,
    })
}
