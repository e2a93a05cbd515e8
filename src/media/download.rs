use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Host-level save action
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Save `bytes` under `filename`; returns where it landed
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String>;
}

/// Saves into a directory, never overwriting an existing file
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.dir.join(filename);
        if !exists(&candidate).await {
            return candidate;
        }

        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut n = 1;
        loop {
            let candidate = self.dir.join(format!("{} ({}){}", stem, n, ext));
            if !exists(&candidate).await {
                return candidate;
            }
            n += 1;
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[async_trait::async_trait]
impl Downloader for DirectoryDownloader {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {:?}", self.dir))?;

        let path = self.free_path(filename).await;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;

        info!("Saved {} bytes to {:?}", bytes.len(), path);
        Ok(path.to_string_lossy().into_owned())
    }
}
