//! Async HTTP client for the PDF Master API

use std::path::Path;

use reqwest::header::CONTENT_LENGTH;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use shared_types::{ErrorBody, HealthResponse, Operation, OperationResult};
use tracing::{debug, info};

use crate::config::{ApiConfig, REQUEST_TIMEOUT};
use crate::error::ClientError;
use crate::normalize::normalize_result;

/// MIME type sent for an image upload, chosen from the file extension
pub fn image_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    }
}

async fn file_part(path: &Path, mime_type: &str) -> Result<Part, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(name).mime_str(mime_type)?)
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `GET /health` on the API origin
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.config.origin());
        let response = self.http.get(url).send().await?;
        parse_response(response).await
    }

    pub async fn merge(&self, paths: &[impl AsRef<Path>]) -> Result<OperationResult, ClientError> {
        let mut form = Form::new();
        for path in paths {
            form = form.part("files", file_part(path.as_ref(), "application/pdf").await?);
        }
        self.submit(Operation::Merge, form).await
    }

    /// Split by 1-indexed inclusive ranges; `None` lets the server split the whole document
    pub async fn split(
        &self,
        path: &Path,
        ranges: Option<&[(u32, u32)]>,
    ) -> Result<OperationResult, ClientError> {
        let mut form = Form::new().part("file", file_part(path, "application/pdf").await?);
        if let Some(ranges) = ranges {
            form = form.text("pageRanges", serde_json::to_string(ranges)?);
        }
        self.submit(Operation::Split, form).await
    }

    /// Rotate by `degrees`; `pages` are 0-indexed, `None` means every page
    pub async fn rotate(
        &self,
        path: &Path,
        degrees: i64,
        pages: Option<&[u32]>,
    ) -> Result<OperationResult, ClientError> {
        let mut form = Form::new()
            .part("file", file_part(path, "application/pdf").await?)
            .text("rotation", degrees.to_string());
        if let Some(pages) = pages {
            form = form.text("pages", serde_json::to_string(pages)?);
        }
        self.submit(Operation::Rotate, form).await
    }

    pub async fn compress(&self, path: &Path) -> Result<OperationResult, ClientError> {
        let form = Form::new().part("file", file_part(path, "application/pdf").await?);
        self.submit(Operation::Compress, form).await
    }

    pub async fn images_to_pdf(
        &self,
        paths: &[impl AsRef<Path>],
    ) -> Result<OperationResult, ClientError> {
        let mut form = Form::new();
        for path in paths {
            let path = path.as_ref();
            form = form.part("images", file_part(path, image_mime_type(path)).await?);
        }
        self.submit(Operation::ImagesToPdf, form).await
    }

    pub async fn protect(&self, path: &Path, password: &str) -> Result<OperationResult, ClientError> {
        let form = Form::new()
            .part("file", file_part(path, "application/pdf").await?)
            .text("password", password.to_string());
        self.submit(Operation::Protect, form).await
    }

    /// Fetch a produced file into `dest`, returning the number of bytes written
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, ClientError> {
        let url = self.config.file_url(url);
        let response = self.http.get(&url).send().await?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;

        info!("Downloaded {} ({} bytes) to {}", url, bytes.len(), dest.display());
        Ok(bytes.len() as u64)
    }

    /// Size of a produced file from a HEAD request; `None` when the server sends no length
    pub async fn file_size(&self, url: &str) -> Result<Option<u64>, ClientError> {
        let url = self.config.file_url(url);
        let response = ensure_success(self.http.head(&url).send().await?).await?;
        // content_length() reflects the empty HEAD body, so read the header
        Ok(response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok()))
    }

    async fn submit(&self, operation: Operation, form: Form) -> Result<OperationResult, ClientError> {
        let url = self.config.endpoint(&format!("pdf/{}", operation.route()))?;
        debug!("POST {}", url);

        let response = self.http.post(url).multipart(form).send().await?;
        let result: OperationResult = parse_response(response).await?;
        Ok(normalize_result(self.config.origin(), result))
    }
}

/// Turn a non-2xx response into `ClientError::Api`, preferring the server's `error` field
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
