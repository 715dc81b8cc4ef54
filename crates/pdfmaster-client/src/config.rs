//! API endpoint configuration

use std::time::Duration;

use url::Url;

use crate::error::ClientError;
use crate::normalize::absolute_url;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Uploads and transforms of large files are slow; one minute per request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Base URL of the API plus the origin that server-relative URLs resolve against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_url: Url,
    origin: String,
}

impl ApiConfig {
    pub fn new(api_url: &str) -> Result<Self, ClientError> {
        let url = Url::parse(api_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ClientError::InvalidUrl(format!(
                "{}: expected an http(s) URL with a host",
                api_url
            )));
        }

        let origin = url.origin().ascii_serialization();
        Ok(Self {
            api_url: url,
            origin,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Scheme, host and port of the API, e.g. `http://localhost:5000`
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `{api_url}/{path}`, keeping any path the API URL already has
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    /// Absolute URL for a server-relative file path such as `/output/x.pdf`
    pub fn file_url(&self, relative: &str) -> String {
        absolute_url(&self.origin, relative)
    }
}
