//! Document and code block models

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Raw input handed over by a document source (filesystem walker, CMS, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Source identity, e.g. `cpp/auto.mdx`
    pub source: String,
    /// Full text: front matter followed by the body
    pub text: String,
}

impl RawDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A parsed article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier derived from the source identity
    pub slug: String,

    /// Source identity the document was parsed from
    pub source: String,

    pub title: String,

    pub summary: String,

    /// Publication date
    pub publish_date: NaiveDate,

    /// Tags (empty allowed)
    pub tags: BTreeSet<String>,

    /// Unpublished documents are left out of every listing
    pub draft: bool,

    /// Authors in declared order; empty means "use the site default"
    pub authors: Vec<String>,

    /// Layout hint for the presentation layer
    pub layout: Option<String>,

    /// Images for social cards
    pub images: Option<Vec<String>>,

    /// Canonical URL override
    pub canonical_url: Option<String>,

    /// Raw body: prose and fenced code
    pub body: String,

    /// Fenced code blocks of the body, in order of appearance
    pub code_blocks: Vec<CodeBlock>,

    /// Front-matter fields this crate does not interpret
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Document {
    /// Whether the document shows up in public listings
    pub fn is_published(&self) -> bool {
        !self.draft
    }

    /// Authors, falling back to `defaults` when none are declared
    pub fn authors_or<'a>(&'a self, defaults: &'a [String]) -> &'a [String] {
        if self.authors.is_empty() {
            defaults
        } else {
            &self.authors
        }
    }
}

/// A fenced code segment owned by its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language tag from the fence info string, empty when unspecified
    pub language: String,
    /// Verbatim content, without the fence lines
    pub content: String,
    /// Zero-based position within the document
    pub ordinal: usize,
}
