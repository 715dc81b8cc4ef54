//! Command-line and environment configuration

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use pdfmaster_core::OwnerPasswordPolicy;

const MIB: u64 = 1024 * 1024;

/// Command-line arguments for the PDF Master API server
///
/// Every flag falls back to an environment variable, and `.env` is loaded
/// before parsing.
#[derive(Parser, Debug, Clone)]
#[command(name = "pdfmaster-api")]
#[command(about = "PDF Master backend: merge, split, rotate, compress, images-to-PDF and protect")]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Directory uploaded files are spooled to while a request runs
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Directory output PDFs are written to and served from
    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Per-file upload limit in MiB
    #[arg(long, env = "MAX_FILE_SIZE_MB", default_value = "50")]
    pub max_file_size_mb: u64,

    /// Owner password policy for /protect: random or derived
    #[arg(long = "owner-password", env = "OWNER_PASSWORD_POLICY", default_value = "random")]
    pub owner_password_policy: OwnerPasswordPolicy,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(MIB)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
