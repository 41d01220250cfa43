//! mdx-corpus: parse, index and render a corpus of Markdown/MDX articles
//!
//! The core is three stages:
//!
//! 1. Parsing raw documents (front matter + body) into [`content::Document`]s
//! 2. Indexing the parsed set into tag and date listings ([`index::CorpusIndex`])
//! 3. Rendering each document into a typed node tree ([`render::Renderer`])
//!
//! [`pipeline::Pipeline`] runs the three stages over a whole corpus. Reading
//! files and writing the result are boundary concerns handled by
//! [`content::loader`] and [`generator`].

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod index;
pub mod pipeline;
pub mod render;
pub mod report;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// A site rooted at a directory
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Set to abort a running build, e.g. on Ctrl+C
    cancelled: Arc<AtomicBool>,
}

impl Site {
    /// Open a site directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            source_dir,
            public_dir,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that cancels builds of this site; shared by clones
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Use `flag` instead of this site's own cancellation flag
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    /// Load, parse, index and render the whole corpus.
    ///
    /// When a duplicate slug aborts the run, the problems found before the
    /// abort are printed too, so one run shows all of them.
    pub fn build(&self) -> Result<pipeline::Build> {
        let raws = content::loader::ContentLoader::new(&self.config).load(&self.source_dir)?;
        let pipeline = pipeline::Pipeline::new(self.config.clone())
            .with_cancel_flag(self.cancel_handle());

        match pipeline.run(raws) {
            Ok(build) => Ok(build),
            Err(e) => {
                if let Some(report) = e.report().filter(|r| !r.is_empty()) {
                    eprintln!("{}", report);
                }
                Err(e.into())
            }
        }
    }

    /// Build and write the output
    pub fn generate(&self) -> Result<pipeline::Build> {
        commands::build::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
