use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("Invalid rotation: {0} degrees is not a multiple of 90")]
    InvalidRotation(i64),

    #[error("Page index {index} is out of range (document has {page_count} pages)")]
    PageOutOfRange { index: i64, page_count: u32 },

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Document is already encrypted")]
    AlreadyEncrypted,

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PdfError {
    fn from(err: serde_json::Error) -> Self {
        PdfError::SerializationError(err.to_string())
    }
}
