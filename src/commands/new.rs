//! Create a new document

use anyhow::{Context, Result};
use chrono::Local;
use indexmap::IndexMap;
use std::fs;

use crate::content::{self, Document};
use crate::Site;

/// Options for a new document
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub draft: bool,
    /// File name without extension; defaults to the slugified title
    pub path: Option<String>,
}

/// Write a new `.mdx` document into the source directory
pub fn create(site: &Site, options: NewDocument) -> Result<std::path::PathBuf> {
    if options.title.trim().is_empty() {
        anyhow::bail!("A new document needs a title");
    }
    let name = options
        .path
        .clone()
        .unwrap_or_else(|| slug::slugify(&options.title));
    let source = format!("{}.mdx", name);
    let slug = content::slug_from_source(&source, &content::SOURCE_EXTENSIONS)
        .with_context(|| format!("`{}` does not yield a usable slug", name))?;

    let summary = if options.summary.trim().is_empty() {
        options.title.clone()
    } else {
        options.summary
    };

    let doc = Document {
        slug,
        source: source.clone(),
        title: options.title,
        summary,
        publish_date: Local::now().date_naive(),
        tags: options.tags.into_iter().collect(),
        draft: options.draft,
        authors: Vec::new(),
        layout: None,
        images: None,
        canonical_url: None,
        body: String::new(),
        code_blocks: Vec::new(),
        extra: IndexMap::new(),
    };

    let file_path = site.source_dir.join(&source);
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&file_path, content::serialize(&doc)?)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse, RawDocument};

    #[test]
    fn test_create_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let path = create(
            &site,
            NewDocument {
                title: "Perfect Forwarding".to_string(),
                summary: "std::forward explained".to_string(),
                tags: vec!["cpp".to_string()],
                draft: true,
                path: None,
            },
        )
        .unwrap();
        assert!(path.ends_with("perfect-forwarding.mdx"));

        let text = fs::read_to_string(&path).unwrap();
        let doc = parse(&RawDocument::new("perfect-forwarding.mdx", text)).unwrap();
        assert_eq!(doc.title, "Perfect Forwarding");
        assert!(doc.draft);
        assert!(doc.tags.contains("cpp"));

        let again = create(
            &site,
            NewDocument {
                title: "Perfect Forwarding".to_string(),
                ..Default::default()
            },
        );
        assert!(again.is_err());
    }
}
