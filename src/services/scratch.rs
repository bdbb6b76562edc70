//! Per-instance scratch directory holding the backing files of surfaces

use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Outcome of clearing a scratch directory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClearReport {
    /// Files deleted
    pub removed: usize,
    /// Files that could not be deleted
    pub failed: usize,
    /// Whether the directory itself was removed
    pub dir_removed: bool,
}

/// Scratch directory of one instance
#[derive(Debug, Clone)]
pub struct ScratchDir {
    dir: PathBuf,
}

impl ScratchDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist
    pub async fn ensure(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Create a new backing file for `source` line `line` holding `content`
    ///
    /// Named `<source name>_line_<n>_<created_at>.json`; a numeric suffix is
    /// added if that name is already taken.
    pub async fn create_surface(
        &self,
        source: &Path,
        line: usize,
        created_at: i64,
        content: &str,
    ) -> io::Result<PathBuf> {
        self.ensure().await?;

        let base = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "record".to_string());

        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{}_line_{}_{}.json", base, line, created_at)
            } else {
                format!("{}_line_{}_{}-{}.json", base, line, created_at, attempt)
            };
            let path = self.dir.join(name);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Delete a backing file; returns `false` if it was already gone
    pub async fn remove_surface(path: &Path) -> io::Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete every file in the directory, then the directory if it is empty
    ///
    /// Per-file failures are logged and counted, never returned. A missing
    /// directory is not an error.
    pub async fn clear(&self) -> io::Result<ClearReport> {
        let mut report = ClearReport::default();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Scratch directory does not exist, nothing to clean: {:?}", self.dir);
                return Ok(report);
            }
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_file = match entry.file_type().await {
                Ok(file_type) => file_type.is_file(),
                Err(e) => {
                    tracing::warn!("Failed to stat scratch entry {:?}: {}", path, e);
                    report.failed += 1;
                    continue;
                }
            };
            if !is_file {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!("Deleted scratch file {:?}", path);
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete scratch file {:?}: {}", path, e);
                    report.failed += 1;
                }
            }
        }

        // Never forced: anything left behind keeps the directory alive
        let mut remaining = tokio::fs::read_dir(&self.dir).await?;
        if remaining.next_entry().await?.is_none() {
            match tokio::fs::remove_dir(&self.dir).await {
                Ok(()) => report.dir_removed = true,
                Err(e) => tracing::warn!("Failed to remove scratch directory {:?}: {}", self.dir, e),
            }
        } else {
            tracing::info!("Scratch directory not empty, leaving it: {:?}", self.dir);
        }

        Ok(report)
    }
}
