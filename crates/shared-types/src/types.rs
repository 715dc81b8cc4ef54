use serde::{Deserialize, Serialize};

/// URL prefix under which output artifacts are served
pub const OUTPUT_URL_PREFIX: &str = "/output";

/// Response body of every successful operation
///
/// Single-output operations fill `file` and `url`; split fills `files`;
/// compress adds the size metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,
    /// Percentage with two decimals, e.g. "12.50%"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<SplitFile>>,
}

impl OperationResult {
    /// A result describing one output file served from the output directory
    pub fn single(file_name: impl Into<String>) -> Self {
        let file = file_name.into();
        Self {
            success: true,
            url: Some(output_url(&file)),
            file: Some(file),
            ..Default::default()
        }
    }

    /// A split result listing every produced file
    pub fn split(files: Vec<SplitFile>) -> Self {
        Self {
            success: true,
            files: Some(files),
            ..Default::default()
        }
    }

    pub fn with_compression(
        mut self,
        original_size: u64,
        compressed_size: u64,
        reduction: impl Into<String>,
    ) -> Self {
        self.original_size = Some(original_size);
        self.compressed_size = Some(compressed_size);
        self.reduction = Some(reduction.into());
        self
    }

    /// Every URL in the result, top-level first
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.url.as_deref().into_iter().chain(
            self.files
                .iter()
                .flatten()
                .map(|split| split.url.as_str()),
        )
    }
}

/// One file of a split result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitFile {
    pub file: String,
    pub url: String,
}

impl SplitFile {
    pub fn new(file_name: impl Into<String>) -> Self {
        let file = file_name.into();
        Self {
            url: output_url(&file),
            file,
        }
    }
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

fn output_url(file_name: &str) -> String {
    format!("{}/{}", OUTPUT_URL_PREFIX, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_single_result_shape() {
        let result = OperationResult::single("merged-1700000000000.pdf");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "file": "merged-1700000000000.pdf",
                "url": "/output/merged-1700000000000.pdf",
            })
        );
    }

    #[test]
    fn test_compress_result_uses_camel_case() {
        let result =
            OperationResult::single("compressed-1.pdf").with_compression(200, 150, "25.00%");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["originalSize"], 200);
        assert_eq!(value["compressedSize"], 150);
        assert_eq!(value["reduction"], "25.00%");
    }

    #[test]
    fn test_split_result_shape() {
        let result = OperationResult::split(vec![SplitFile::new("split-1-5.pdf")]);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "files": [{ "file": "split-1-5.pdf", "url": "/output/split-1-5.pdf" }],
            })
        );
    }

    #[test]
    fn test_urls_lists_top_level_and_split_urls() {
        let mut result =
            OperationResult::split(vec![SplitFile::new("a.pdf"), SplitFile::new("b.pdf")]);
        result.url = Some("/output/c.pdf".into());
        let urls: Vec<_> = result.urls().collect();
        assert_eq!(urls, vec!["/output/c.pdf", "/output/a.pdf", "/output/b.pdf"]);
    }
}
