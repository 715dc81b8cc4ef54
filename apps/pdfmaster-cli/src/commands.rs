//! Subcommand execution

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use pdfmaster_client::{ApiClient, ApiConfig, AppStore, FileStore, RecentFile};
use pdfmaster_core::parse_range_spec;
use shared_types::{Operation, OperationResult};
use tracing::debug;

use crate::cli::{Cli, Command, RecentAction};

const PDF_MIME: &str = "application/pdf";

/// `--data-dir`, else the platform data directory, else `./.pdfmaster`
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| dirs::data_dir().map(|dir| dir.join("pdfmaster")))
        .unwrap_or_else(|| PathBuf::from(".pdfmaster"))
}

pub async fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    debug!("Using data directory {}", data_dir.display());
    let mut store = AppStore::load(FileStore::new(data_dir));

    let config = ApiConfig::new(&cli.api_url)?;
    let client = ApiClient::new(config)?;

    match cli.command {
        Command::Merge { files, out } => {
            let result = client.merge(&files).await?;
            finish(&client, &mut store, Operation::Merge, result, out).await
        }
        Command::Split { file, ranges, out } => {
            let ranges = ranges.as_deref().map(parse_range_spec).transpose()?;
            let result = client.split(&file, ranges.as_deref()).await?;
            finish(&client, &mut store, Operation::Split, result, out).await
        }
        Command::Rotate {
            file,
            degrees,
            pages,
            out,
        } => {
            let result = client.rotate(&file, degrees, pages.as_deref()).await?;
            finish(&client, &mut store, Operation::Rotate, result, out).await
        }
        Command::Compress { file, out } => {
            let result = client.compress(&file).await?;
            if let (Some(original), Some(compressed), Some(reduction)) = (
                result.original_size,
                result.compressed_size,
                result.reduction.as_deref(),
            ) {
                println!("{} -> {} bytes ({})", original, compressed, reduction);
            }
            finish(&client, &mut store, Operation::Compress, result, out).await
        }
        Command::Images { files, out } => {
            let result = client.images_to_pdf(&files).await?;
            finish(&client, &mut store, Operation::ImagesToPdf, result, out).await
        }
        Command::Protect {
            file,
            password,
            out,
        } => {
            let result = client.protect(&file, &password).await?;
            finish(&client, &mut store, Operation::Protect, result, out).await
        }
        Command::Recent { action } => {
            match action {
                RecentAction::List => print_recent(&store),
                RecentAction::Clear => {
                    store.clear_recent_files();
                    println!("Recent files cleared");
                }
            }
            Ok(())
        }
        Command::Favorite { id } => {
            if store.toggle_favorite(&id) {
                println!("{} added to favorites", id);
            } else {
                println!("{} removed from favorites", id);
            }
            Ok(())
        }
        Command::DarkMode => {
            let enabled = store.toggle_dark_mode();
            println!("Dark mode {}", if enabled { "on" } else { "off" });
            Ok(())
        }
        Command::Health => {
            let health = client
                .health()
                .await
                .with_context(|| format!("{} is not reachable", client.config().origin()))?;
            println!("{}: {}", health.status, health.message);
            Ok(())
        }
    }
}

/// Every (file, url) pair a result names
fn outputs(result: &OperationResult) -> Vec<(String, String)> {
    match (&result.files, &result.file, &result.url) {
        (Some(files), _, _) => files
            .iter()
            .map(|f| (f.file.clone(), f.url.clone()))
            .collect(),
        (None, Some(file), Some(url)) => vec![(file.clone(), url.clone())],
        _ => Vec::new(),
    }
}

/// Where one output goes when `--out` is given
///
/// Split writes every part into the `--out` directory under the last
/// component of its server name; every other operation writes exactly to
/// `--out`.
fn destination(operation: Operation, out: &Path, file: &str) -> PathBuf {
    match operation {
        Operation::Split => {
            let name = Path::new(file)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("{}.pdf", operation.output_prefix())));
            out.join(name)
        }
        _ => out.to_path_buf(),
    }
}

async fn finish(
    client: &ApiClient,
    store: &mut AppStore<FileStore>,
    operation: Operation,
    result: OperationResult,
    out: Option<PathBuf>,
) -> Result<()> {
    let produced = outputs(&result);
    if produced.is_empty() {
        println!("{}: no output produced", operation.title());
        return Ok(());
    }

    if let (Operation::Split, Some(dir)) = (operation, out.as_deref()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    for (file, url) in produced {
        let size = match out.as_deref() {
            Some(out) => {
                let dest = destination(operation, out, &file);
                let size = client
                    .download(&url, &dest)
                    .await
                    .with_context(|| format!("downloading {}", url))?;
                println!("{} -> {}", url, dest.display());
                size
            }
            None => {
                println!("{}", url);
                match client.file_size(&url).await {
                    Ok(Some(size)) => size,
                    Ok(None) => 0,
                    Err(e) => {
                        debug!("No size for {}: {}", url, e);
                        0
                    }
                }
            }
        };

        store.add_recent_file(RecentFile::new(file, url, size, PDF_MIME, operation.title()));
    }

    Ok(())
}

fn print_recent(store: &AppStore<FileStore>) {
    if store.recent_files().is_empty() {
        println!("No recent files");
        return;
    }

    for file in store.recent_files() {
        let star = if store.is_favorite(&file.id) { "*" } else { " " };
        println!(
            "{} {}  {:<14} {}  ({})",
            star,
            file.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            file.operation,
            file.name,
            file.id
        );
    }
}
