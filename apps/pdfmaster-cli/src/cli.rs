use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdfmaster_client::DEFAULT_API_URL;
use pdfmaster_core::DEFAULT_ROTATION;

#[derive(Parser, Debug)]
#[command(name = "pdfmaster")]
#[command(version, about = "Merge, split, rotate, compress, convert and protect PDFs through a PDF Master server")]
pub struct Cli {
    /// Base URL of the API, including its /api path
    #[arg(long, env = "PDFMASTER_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Where recent files and preferences are kept
    #[arg(long, env = "PDFMASTER_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge 2 to 10 PDFs in the given order
    Merge {
        #[arg(required = true, num_args = 2..=10)]
        files: Vec<PathBuf>,
        /// Download the result to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Split a PDF into one file per page range
    Split {
        file: PathBuf,
        /// 1-indexed inclusive ranges, e.g. "1-3,5"; the whole document when omitted
        #[arg(long)]
        ranges: Option<String>,
        /// Download every part into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rotate pages by a multiple of 90 degrees
    Rotate {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_ROTATION, allow_negative_numbers = true)]
        degrees: i64,
        /// 0-indexed pages, comma separated; every page when omitted
        #[arg(long, value_delimiter = ',')]
        pages: Option<Vec<u32>>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Re-save a PDF without object streams and report the size change
    Compress {
        file: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build a PDF with one page per JPEG or PNG image
    Images {
        #[arg(required = true, num_args = 1..=20)]
        files: Vec<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Encrypt a PDF with a password
    Protect {
        file: PathBuf,
        #[arg(long, env = "PDFMASTER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show or clear recently produced files
    Recent {
        #[command(subcommand)]
        action: RecentAction,
    },
    /// Mark or unmark a recent file as favorite
    Favorite { id: String },
    /// Toggle the dark mode preference
    DarkMode,
    /// Check that the server is reachable
    Health,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentAction {
    List,
    Clear,
}
