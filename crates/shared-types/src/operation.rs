//! The PDF operations exposed by the server

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Merge,
    Split,
    Rotate,
    Compress,
    ImagesToPdf,
    Protect,
}

#[derive(Debug, Error)]
#[error("Unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Merge,
        Operation::Split,
        Operation::Rotate,
        Operation::Compress,
        Operation::ImagesToPdf,
        Operation::Protect,
    ];

    /// Route segment under the API base, e.g. "images-to-pdf"
    pub fn route(&self) -> &'static str {
        match self {
            Operation::Merge => "merge",
            Operation::Split => "split",
            Operation::Rotate => "rotate",
            Operation::Compress => "compress",
            Operation::ImagesToPdf => "images-to-pdf",
            Operation::Protect => "protect",
        }
    }

    /// File name prefix of the output artifact
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Operation::Merge => "merged",
            Operation::Split => "split",
            Operation::Rotate => "rotated",
            Operation::Compress => "compressed",
            Operation::ImagesToPdf => "images",
            Operation::Protect => "protected",
        }
    }

    /// Multipart field the operation reads its uploads from
    pub fn upload_field(&self) -> &'static str {
        match self {
            Operation::Merge => "files",
            Operation::ImagesToPdf => "images",
            _ => "file",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Operation::Merge => "Merge PDFs",
            Operation::Split => "Split PDF",
            Operation::Rotate => "Rotate PDF",
            Operation::Compress => "Compress PDF",
            Operation::ImagesToPdf => "Images to PDF",
            Operation::Protect => "Protect PDF",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.route() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}
