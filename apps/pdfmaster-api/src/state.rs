//! Application state for the PDF Master API

use std::io;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use pdfmaster_core::OwnerPasswordPolicy;
use shared_types::Operation;

use crate::error::ApiError;
use crate::storage::OutputStore;
use crate::upload::{UploadForm, UploadSpec, MAX_IMAGE_FILES};

/// Headroom for multipart framing and text fields on top of the file payload
const BODY_OVERHEAD: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppState {
    pub upload_dir: PathBuf,
    pub outputs: OutputStore,
    pub max_file_size: u64,
    pub owner_password_policy: OwnerPasswordPolicy,
}

impl AppState {
    /// Create the upload and output directories and the shared state
    pub async fn new(
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        max_file_size: u64,
        owner_password_policy: OwnerPasswordPolicy,
    ) -> io::Result<Self> {
        let upload_dir = upload_dir.into();
        let output_dir = output_dir.into();
        tokio::fs::create_dir_all(&upload_dir).await?;
        tokio::fs::create_dir_all(&output_dir).await?;

        tracing::info!(
            "Uploads in {}, outputs in {}",
            upload_dir.display(),
            output_dir.display()
        );

        Ok(Self {
            upload_dir,
            outputs: OutputStore::new(output_dir),
            max_file_size,
            owner_password_policy,
        })
    }

    pub fn output_dir(&self) -> &Path {
        self.outputs.dir()
    }

    /// Largest request body any route can legitimately need
    pub fn body_limit(&self) -> usize {
        let limit = self
            .max_file_size
            .saturating_mul(MAX_IMAGE_FILES as u64)
            .saturating_add(BODY_OVERHEAD);
        usize::try_from(limit).unwrap_or(usize::MAX)
    }

    /// Spool the uploads of one request for `operation`
    pub async fn receive(
        &self,
        multipart: Multipart,
        operation: Operation,
    ) -> Result<UploadForm, ApiError> {
        let spec = UploadSpec::for_operation(operation, self.max_file_size);
        UploadForm::receive(multipart, &self.upload_dir, spec).await
    }
}
