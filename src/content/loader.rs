//! Content loader - reads raw documents from the source directory

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::RawDocument;
use crate::config::SiteConfig;

/// Loads raw documents from a directory tree
pub struct ContentLoader<'a> {
    config: &'a SiteConfig,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Load every content file under `source_dir`, sorted by source path.
    ///
    /// Directories and files starting with `_` or `.` are skipped.
    pub fn load(&self, source_dir: &Path) -> Result<Vec<RawDocument>> {
        if !source_dir.exists() {
            tracing::warn!("Source directory {:?} does not exist", source_dir);
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()));

        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {:?}", source_dir))?;
            let path = entry.path();
            if !entry.file_type().is_file() || !self.config.is_content_file(path) {
                continue;
            }

            let text =
                fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
            let source = source_identity(source_dir, path);
            tracing::debug!("Loaded {}", source);
            documents.push(RawDocument::new(source, text));
        }

        documents.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(documents)
    }
}

fn is_hidden(name: Option<&str>) -> bool {
    name.map(|n| n.starts_with('_') || n.starts_with('.'))
        .unwrap_or(false)
}

/// Path relative to the source directory, always with `/` separators
fn source_identity(source_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(source_dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
