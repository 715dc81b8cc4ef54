//! Server-relative to absolute URL rewriting

use shared_types::OperationResult;
use url::Url;

/// Resolve `url` against `origin` unless it is already absolute
pub fn absolute_url(origin: &str, url: &str) -> String {
    if Url::parse(url).is_ok() {
        return url.to_string();
    }
    let origin = origin.trim_end_matches('/');
    match url.strip_prefix('/') {
        Some(path) => format!("{}/{}", origin, path),
        None => format!("{}/{}", origin, url),
    }
}

/// Rewrite the top-level `url` and every `files[].url` of a result
pub fn normalize_result(origin: &str, mut result: OperationResult) -> OperationResult {
    if let Some(url) = result.url.as_mut() {
        *url = absolute_url(origin, url);
    }
    for file in result.files.iter_mut().flatten() {
        file.url = absolute_url(origin, &file.url);
    }
    result
}
