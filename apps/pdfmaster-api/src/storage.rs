//! Output directory and collision-free file creation

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use pdfmaster_core::SplitPart;
use shared_types::Operation;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const MAX_NAME_ATTEMPTS: u32 = 100;

pub fn timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Create a file in `dir` that did not exist before
///
/// `name_for(0)` is tried first; each collision moves on to the next
/// attempt number, so an existing file is never truncated.
pub async fn create_unique<F>(dir: &Path, name_for: F) -> io::Result<(String, File)>
where
    F: Fn(u32) -> String,
{
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = name_for(attempt);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&name))
            .await
        {
            Ok(file) => return Ok((name, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} already exists, retrying", name);
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name after {} attempts", MAX_NAME_ATTEMPTS),
    ))
}

/// `{prefix}-{millis}.pdf`, with `-{attempt}` before the extension on collision
fn output_name(prefix: &str, stamp: i64, attempt: u32) -> String {
    match attempt {
        0 => format!("{}-{}.pdf", prefix, stamp),
        n => format!("{}-{}-{}.pdf", prefix, stamp, n),
    }
}

/// Write-once store for transform outputs
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one output and return its file name
    pub async fn write(&self, prefix: &str, bytes: &[u8]) -> io::Result<String> {
        self.write_at(prefix, timestamp_millis(), bytes).await
    }

    async fn write_at(&self, prefix: &str, stamp: i64, bytes: &[u8]) -> io::Result<String> {
        let (name, mut file) = create_unique(&self.dir, |n| output_name(prefix, stamp, n)).await?;

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            self.remove(&name).await;
            return Err(e);
        }
        Ok(name)
    }

    /// Write every part of a split as `split-{index}-{millis}.pdf`
    ///
    /// All parts share one timestamp. All or nothing: if one write fails,
    /// the parts already written by this call are removed again.
    pub async fn write_split(&self, parts: &[SplitPart]) -> io::Result<Vec<String>> {
        self.write_split_at(parts, timestamp_millis()).await
    }

    async fn write_split_at(&self, parts: &[SplitPart], stamp: i64) -> io::Result<Vec<String>> {
        let mut names = Vec::with_capacity(parts.len());
        for part in parts {
            let prefix = format!("{}-{}", Operation::Split.output_prefix(), part.index);
            match self.write_at(&prefix, stamp, &part.bytes).await {
                Ok(name) => names.push(name),
                Err(e) => {
                    for name in &names {
                        self.remove(name).await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(names)
    }

    async fn remove(&self, name: &str) {
        if let Err(e) = fs::remove_file(self.dir.join(name)).await {
            warn!("Failed to remove partial output {}: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_follow_prefix_and_timestamp() {
        assert_eq!(output_name("merged", 1700000000000, 0), "merged-1700000000000.pdf");
        assert_eq!(output_name("split-2", 17, 3), "split-2-17-3.pdf");
    }

    #[tokio::test]
    async fn create_unique_never_reuses_an_existing_name() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = create_unique(dir.path(), |n| output_name("a", 1, n)).await.unwrap();
        let (second, _) = create_unique(dir.path(), |n| output_name("a", 1, n)).await.unwrap();

        assert_eq!(first, "a-1.pdf");
        assert_eq!(second, "a-1-1.pdf");
    }

    fn part(index: usize, bytes: &[u8]) -> SplitPart {
        SplitPart {
            index,
            start: index as u32,
            end: index as u32,
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn write_split_names_every_part() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        let names = store
            .write_split_at(&[part(1, b"one"), part(2, b"two")], 42)
            .await
            .unwrap();

        assert_eq!(names, vec!["split-1-42.pdf", "split-2-42.pdf"]);
        assert_eq!(std::fs::read(dir.path().join("split-2-42.pdf")).unwrap(), b"two");
    }

    #[tokio::test]
    async fn failed_split_part_removes_earlier_parts() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        // Every candidate name for the second part is already taken
        let taken: Vec<String> = (0..MAX_NAME_ATTEMPTS)
            .map(|n| output_name("split-2", 7, n))
            .collect();
        for name in &taken {
            std::fs::write(dir.path().join(name), b"existing").unwrap();
        }

        let err = store
            .write_split_at(&[part(1, b"one"), part(2, b"two"), part(3, b"three")], 7)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        let mut expected = taken.clone();
        expected.sort();
        assert_eq!(left, expected);
        assert_eq!(std::fs::read(dir.path().join(&taken[0])).unwrap(), b"existing");
    }

    #[tokio::test]
    async fn write_keeps_earlier_outputs_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        let a = store.write("rotated", b"first").await.unwrap();
        let b = store.write("rotated", b"second").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(std::fs::read(dir.path().join(&a)).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.path().join(&b)).unwrap(), b"second");
    }
}
