//! Generator module - writes a build to the public directory as JSON
//!
//! The presentation layer reads these files; nothing here produces markup.
//! Documents live under `posts/`, apart from the listing file, so no slug
//! can shadow it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::Build;
use crate::render::RenderedOutput;

/// Name of the listing file at the root of the public directory
pub const INDEX_FILE: &str = "index.json";

/// Directory, relative to the public directory, holding one file per document
pub const POSTS_DIR: &str = "posts";

/// Listing data for index and tag pages
#[derive(Debug, Serialize)]
struct IndexData<'a> {
    latest: &'a [String],
    by_date: &'a [String],
    by_tag: BTreeMap<&'a str, &'a [String]>,
    tags: BTreeMap<&'a str, usize>,
}

/// Writes rendered documents and listings
pub struct Generator {
    public_dir: PathBuf,
    latest: usize,
}

impl Generator {
    /// Create a new generator
    pub fn new(public_dir: impl Into<PathBuf>, latest: usize) -> Self {
        Self {
            public_dir: public_dir.into(),
            latest,
        }
    }

    /// Write every output plus `index.json`. Returns the number of files written.
    ///
    /// Document files from earlier builds are removed first, so deleted or
    /// unpublished documents do not linger.
    pub fn generate(&self, build: &Build) -> Result<usize> {
        let posts_dir = self.public_dir.join(POSTS_DIR);
        if posts_dir.exists() {
            fs::remove_dir_all(&posts_dir)
                .with_context(|| format!("failed to clear {:?}", posts_dir))?;
        }
        fs::create_dir_all(&posts_dir)
            .with_context(|| format!("failed to create {:?}", posts_dir))?;

        for output in &build.outputs {
            self.write_document(output)?;
        }

        let index = build.corpus.index();
        let data = IndexData {
            latest: index.latest(self.latest),
            by_date: index.by_date(),
            by_tag: index
                .all_tags()
                .iter()
                .map(|tag| (tag.as_str(), index.by_tag(tag)))
                .collect(),
            tags: index.tag_counts(),
        };
        write_json(&self.public_dir.join(INDEX_FILE), &data)?;

        tracing::info!(
            "Wrote {} documents to {:?}",
            build.outputs.len(),
            self.public_dir
        );
        Ok(build.outputs.len() + 1)
    }

    /// Path of the JSON file for a slug; nested slugs become directories
    pub fn document_path(&self, slug: &str) -> PathBuf {
        self.public_dir.join(POSTS_DIR).join(format!("{}.json", slug))
    }

    fn write_document(&self, output: &RenderedOutput) -> Result<()> {
        let path = self.document_path(&output.slug);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json(&path, output)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {:?}", path))?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::RawDocument;
    use crate::pipeline::Pipeline;

    fn build() -> Build {
        let raws = vec![
            RawDocument::new(
                "cpp/auto.mdx",
                "---\ntitle: auto\nsummary: S\ndate: 2024-03-24\ntags: [cpp]\n---\n```cpp\nauto x = 1;\n```\n",
            ),
            RawDocument::new(
                "exec.md",
                "---\ntitle: exec\nsummary: S\ndate: 2023-01-01\ntags: [os]\n---\nSee [[cpp/auto]].\n",
            ),
        ];
        Pipeline::new(SiteConfig::default()).run(raws).unwrap()
    }

    #[test]
    fn test_generate_writes_documents_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(dir.path(), 1);
        let written = generator.generate(&build()).unwrap();
        assert_eq!(written, 3);

        let auto: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("posts/cpp/auto.json")).unwrap())
                .unwrap();
        assert_eq!(auto["nodes"][0]["type"], "code");
        assert_eq!(auto["nodes"][0]["language"], "cpp");
        assert_eq!(auto["publish_date"], "2024-03-24");

        let index: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap())
                .unwrap();
        assert_eq!(index["latest"], serde_json::json!(["cpp/auto"]));
        assert_eq!(index["by_date"], serde_json::json!(["cpp/auto", "exec"]));
        assert_eq!(index["by_tag"]["os"], serde_json::json!(["exec"]));
        assert_eq!(index["tags"]["cpp"], 1);
    }

    #[test]
    fn test_output_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(dir.path(), 5);

        generator.generate(&build()).unwrap();
        let first = fs::read_to_string(dir.path().join("posts/exec.json")).unwrap();
        generator.generate(&build()).unwrap();
        let second = fs::read_to_string(dir.path().join("posts/exec.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_index_slug_does_not_shadow_listing() {
        let raws = vec![RawDocument::new(
            "index.md",
            "---\ntitle: Home\nsummary: S\ndate: 2024-01-01\n---\nWelcome.\n",
        )];
        let build = Pipeline::new(SiteConfig::default()).run(raws).unwrap();
        let dir = tempfile::tempdir().unwrap();
        Generator::new(dir.path(), 5).generate(&build).unwrap();

        let home: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("posts/index.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(home["slug"], "index");
        assert!(home["nodes"].is_array());

        let listing: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap())
                .unwrap();
        assert_eq!(listing["by_date"], serde_json::json!(["index"]));
        assert!(listing.get("nodes").is_none());
    }

    #[test]
    fn test_removed_documents_do_not_linger() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(dir.path(), 5);
        generator.generate(&build()).unwrap();
        assert!(generator.document_path("exec").exists());

        let raws = vec![RawDocument::new(
            "cpp/auto.mdx",
            "---\ntitle: auto\nsummary: S\ndate: 2024-03-24\n---\nBody\n",
        )];
        let smaller = Pipeline::new(SiteConfig::default()).run(raws).unwrap();
        generator.generate(&smaller).unwrap();

        assert!(!generator.document_path("exec").exists());
        assert!(generator.document_path("cpp/auto").exists());
    }
}
