//! HTTP handlers for the PDF Master API
//!
//! Every transform route follows the same pipeline: spool the uploads,
//! validate, run the transform on the blocking pool, write the output and
//! answer with its URL. Uploads are removed when the form is dropped.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use pdfmaster_core::{
    compress_document, images_to_pdf, merge_documents, parse_page_ranges, protect_document,
    rotate_document, split_document, ImageInput, PdfError, RotateRequest,
};
use shared_types::{HealthResponse, Operation, OperationResult, SplitFile};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult = Result<Json<OperationResult>, ApiError>;

const PDF_REQUIRED: &str = "PDF file required";

/// Run a CPU-bound transform off the async workers
async fn run_blocking<T, F>(transform: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, PdfError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(transform).await??)
}

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "PDF Master Pro API is running".to_string(),
    })
}

/// Handler: POST /api/pdf/merge
pub async fn merge(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult {
    let form = state.receive(multipart, Operation::Merge).await?;
    if form.files().len() < 2 {
        return Err(ApiError::BadRequest("At least 2 PDF files required".into()));
    }

    let inputs = form.read_all().await?;
    let merged = run_blocking(move || merge_documents(&inputs)).await?;
    let file = state
        .outputs
        .write(Operation::Merge.output_prefix(), &merged)
        .await?;

    info!(operation = %Operation::Merge, inputs = form.files().len(), output = %file, "Merged PDFs");
    Ok(Json(OperationResult::single(file)))
}

/// Handler: POST /api/pdf/split
pub async fn split(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult {
    let form = state.receive(multipart, Operation::Split).await?;
    let input = form.read_single(PDF_REQUIRED).await?;
    let ranges = form.field("pageRanges").map(parse_page_ranges).transpose()?;

    let parts = run_blocking(move || split_document(&input, ranges)).await?;
    let files = state.outputs.write_split(&parts).await?;

    info!(operation = %Operation::Split, outputs = files.len(), "Split PDF");
    Ok(Json(OperationResult::split(
        files.into_iter().map(SplitFile::new).collect(),
    )))
}

/// Handler: POST /api/pdf/rotate
pub async fn rotate(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult {
    let form = state.receive(multipart, Operation::Rotate).await?;
    let input = form.read_single(PDF_REQUIRED).await?;
    let request = RotateRequest::from_form(form.field("rotation"), form.field("pages"))?;
    let degrees = request.degrees;

    let rotated = run_blocking(move || rotate_document(&input, &request)).await?;
    let file = state
        .outputs
        .write(Operation::Rotate.output_prefix(), &rotated)
        .await?;

    info!(operation = %Operation::Rotate, degrees, output = %file, "Rotated PDF");
    Ok(Json(OperationResult::single(file)))
}

/// Handler: POST /api/pdf/compress
pub async fn compress(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult {
    let form = state.receive(multipart, Operation::Compress).await?;
    let input = form.read_single(PDF_REQUIRED).await?;

    let outcome = run_blocking(move || compress_document(&input)).await?;
    let file = state
        .outputs
        .write(Operation::Compress.output_prefix(), &outcome.bytes)
        .await?;

    info!(
        operation = %Operation::Compress,
        original = outcome.original_size,
        compressed = outcome.compressed_size,
        output = %file,
        "Compressed PDF"
    );
    Ok(Json(OperationResult::single(file).with_compression(
        outcome.original_size as u64,
        outcome.compressed_size as u64,
        outcome.reduction_label(),
    )))
}

/// Handler: POST /api/pdf/images-to-pdf
pub async fn images(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult {
    let form = state.receive(multipart, Operation::ImagesToPdf).await?;
    if form.files().is_empty() {
        return Err(ApiError::BadRequest("At least 1 image file required".into()));
    }

    let mut uploads = Vec::with_capacity(form.files().len());
    for file in form.files() {
        // A generic content type says nothing; let the bytes decide
        let mime_type = file
            .content_type
            .clone()
            .filter(|mime| mime != "application/octet-stream");
        uploads.push((file.read().await?, mime_type));
    }

    let pdf = run_blocking(move || {
        let inputs: Vec<ImageInput<'_>> = uploads
            .iter()
            .map(|(bytes, mime_type)| ImageInput {
                bytes,
                mime_type: mime_type.as_deref(),
            })
            .collect();
        images_to_pdf(&inputs)
    })
    .await?;
    let file = state
        .outputs
        .write(Operation::ImagesToPdf.output_prefix(), &pdf)
        .await?;

    info!(operation = %Operation::ImagesToPdf, inputs = form.files().len(), output = %file, "Converted images");
    Ok(Json(OperationResult::single(file)))
}

/// Handler: POST /api/pdf/protect
pub async fn protect(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult {
    let form = state.receive(multipart, Operation::Protect).await?;
    let password = match (form.files().first(), form.raw_field("password")) {
        (Some(_), Some(password)) => password.to_string(),
        _ => return Err(ApiError::BadRequest("PDF file and password required".into())),
    };
    let input = form.read_single(PDF_REQUIRED).await?;
    let policy = state.owner_password_policy;

    let protected = run_blocking(move || protect_document(&input, &password, policy)).await?;
    let file = state
        .outputs
        .write(Operation::Protect.output_prefix(), &protected.bytes)
        .await?;

    info!(operation = %Operation::Protect, policy = %policy, output = %file, "Protected PDF");
    Ok(Json(OperationResult::single(file)))
}
