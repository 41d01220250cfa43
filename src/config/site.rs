//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    /// Authors used for documents that declare none
    pub default_authors: Vec<String>,

    // URL
    pub url: String,
    pub root: String,
    /// Path prefix under which documents are served; links starting with
    /// it are treated as cross-references
    pub link_prefix: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    /// File extensions picked up by the loader
    pub extensions: Vec<String>,

    // Writing
    pub render_drafts: bool,

    // Listings
    /// Number of entries in the `latest` listing
    pub latest: usize,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Notes".to_string(),
            default_authors: vec!["default".to_string()],

            url: "http://example.com".to_string(),
            root: "/".to_string(),
            link_prefix: "/blog/".to_string(),

            source_dir: "data/blog".to_string(),
            public_dir: "public".to_string(),
            extensions: vec!["md".to_string(), "mdx".to_string(), "markdown".to_string()],

            render_drafts: false,

            latest: 5,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Public URL of a document, e.g. `http://example.com/blog/cpp/auto`
    pub fn document_url(&self, slug: &str) -> String {
        format!(
            "{}/{}{}{}",
            self.url.trim_end_matches('/'),
            self.root.trim_matches('/'),
            if self.root.trim_matches('/').is_empty() {
                ""
            } else {
                "/"
            },
            join_path(&self.link_prefix, slug)
        )
    }

    /// Whether `path` has one of the configured content extensions
    pub fn is_content_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

fn join_path(prefix: &str, slug: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        slug.to_string()
    } else {
        format!("{}/{}", prefix, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.source_dir, "data/blog");
        assert_eq!(config.link_prefix, "/blog/");
        assert_eq!(config.default_authors, vec!["default"]);
        assert_eq!(config.latest, 5);
        assert!(!config.render_drafts);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
url: https://blog.example.org/
default_authors: [kevin]
latest: 3
analytics: plausible
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.default_authors, vec!["kevin"]);
        assert_eq!(config.latest, 3);
        assert_eq!(config.public_dir, "public");
        assert!(config.extra.contains_key("analytics"));
    }

    #[test]
    fn test_document_url() {
        let mut config = SiteConfig {
            url: "https://blog.example.org/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.document_url("cpp/auto"),
            "https://blog.example.org/blog/cpp/auto"
        );

        config.root = "/site/".to_string();
        config.link_prefix = "/".to_string();
        assert_eq!(
            config.document_url("auto"),
            "https://blog.example.org/site/auto"
        );
    }

    #[test]
    fn test_is_content_file() {
        let config = SiteConfig::default();
        assert!(config.is_content_file(Path::new("a/b.mdx")));
        assert!(config.is_content_file(Path::new("a/b.MD")));
        assert!(!config.is_content_file(Path::new("a/b.png")));
    }
}
