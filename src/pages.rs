//! Access to cached course pages.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{page_url, PAGE_EXTENSION};
use crate::error::{Result, ScraperError};

/// Markup of one course page together with the URL it was fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub name: String,
    pub url: String,
    pub markup: String,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Names of every available page.
    async fn list(&self) -> Result<Vec<String>>;

    async fn fetch(&self, name: &str) -> Result<Page>;
}

/// Reads `<name>.html` files from a directory filled by the page downloader.
pub struct DirectoryPageSource {
    dir: PathBuf,
    base_url: String,
}

impl DirectoryPageSource {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PAGE_EXTENSION}"))
    }
}

#[async_trait]
impl PageSource for DirectoryPageSource {
    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read pages directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        debug!("found {} cached pages in {}", names.len(), self.dir.display());
        Ok(names)
    }

    async fn fetch(&self, name: &str) -> Result<Page> {
        let markup = tokio::fs::read_to_string(self.path_for(name)).await?;
        Ok(Page {
            name: name.to_string(),
            url: page_url(&self.base_url, name),
            markup,
        })
    }
}
