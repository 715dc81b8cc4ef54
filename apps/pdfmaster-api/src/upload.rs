//! Multipart upload spooling
//!
//! File parts are streamed to the upload directory as they arrive and
//! text parts are kept in memory. The resulting [`UploadForm`] deletes its
//! files when dropped, so inputs are removed after every request whether
//! the transform succeeded or not.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use shared_types::Operation;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::storage::{create_unique, timestamp_millis};

pub const MAX_MERGE_FILES: usize = 10;
pub const MAX_IMAGE_FILES: usize = 20;

/// What a route accepts from a multipart body
#[derive(Debug, Clone, Copy)]
pub struct UploadSpec {
    pub field: &'static str,
    pub max_files: usize,
    pub max_file_size: u64,
}

impl UploadSpec {
    pub fn for_operation(operation: Operation, max_file_size: u64) -> Self {
        let max_files = match operation {
            Operation::Merge => MAX_MERGE_FILES,
            Operation::ImagesToPdf => MAX_IMAGE_FILES,
            _ => 1,
        };
        Self {
            field: operation.upload_field(),
            max_files,
            max_file_size,
        }
    }
}

/// A file part written to the upload directory
#[derive(Debug)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl UploadedFile {
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path).await
    }
}

#[derive(Debug, Default)]
pub struct UploadForm {
    files: Vec<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain a multipart body according to `spec`
    ///
    /// File parts under any other field name are discarded. Exceeding the
    /// file count is a 400, exceeding the per-file size a 413.
    pub async fn receive(
        mut multipart: Multipart,
        dir: &Path,
        spec: UploadSpec,
    ) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(original_name) = field.file_name().map(str::to_owned) else {
                let value = field.text().await?;
                form.fields.insert(name, value);
                continue;
            };

            if name != spec.field {
                debug!("Discarding file part under unexpected field '{}'", name);
                continue;
            }
            if form.files.len() >= spec.max_files {
                return Err(ApiError::BadRequest(format!(
                    "Too many files: at most {} allowed in '{}'",
                    spec.max_files, spec.field
                )));
            }

            let content_type = field.content_type().map(str::to_owned);
            let stamp = timestamp_millis();
            let safe_name = sanitize_file_name(&original_name);
            let (stored, mut file) = create_unique(dir, |n| match n {
                0 => format!("{}-{}", stamp, safe_name),
                n => format!("{}-{}-{}", stamp, n, safe_name),
            })
            .await?;

            // Registered before streaming so a failed part is still cleaned up
            form.files.push(UploadedFile {
                path: dir.join(stored),
                original_name,
                content_type,
                size: 0,
            });

            let mut size = 0u64;
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len() as u64;
                if size > spec.max_file_size {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "File exceeds the {} byte upload limit",
                        spec.max_file_size
                    )));
                }
                file.write_all(&chunk).await?;
            }
            file.flush().await?;

            if let Some(uploaded) = form.files.last_mut() {
                uploaded.size = size;
            }
        }

        Ok(form)
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// A text field to be parsed, treating a blank value as absent
    pub fn field(&self, name: &str) -> Option<&str> {
        self.raw_field(name).filter(|value| !value.trim().is_empty())
    }

    /// A text field taken verbatim; only an empty value counts as absent
    pub fn raw_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Contents of the first uploaded file, or a 400 with `missing` as message
    pub async fn read_single(&self, missing: &str) -> Result<Vec<u8>, ApiError> {
        match self.files.first() {
            Some(file) => Ok(file.read().await?),
            None => Err(ApiError::BadRequest(missing.to_string())),
        }
    }

    pub async fn read_all(&self) -> Result<Vec<Vec<u8>>, ApiError> {
        let mut contents = Vec::with_capacity(self.files.len());
        for file in &self.files {
            contents.push(file.read().await?);
        }
        Ok(contents)
    }
}

impl Drop for UploadForm {
    fn drop(&mut self) {
        for file in &self.files {
            match std::fs::remove_file(&file.path) {
                Ok(()) => debug!("Removed upload {}", file.path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove upload {}: {}", file.path.display(), e),
            }
        }
    }
}

/// Reduce a client-supplied file name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.trim_start_matches('.') {
        "" => "upload".to_string(),
        trimmed => trimmed.to_string(),
    }
}
