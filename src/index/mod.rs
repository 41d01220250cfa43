//! Corpus index - tag and date listings over a set of documents
//!
//! The index stores slugs and a little per-document metadata, never content.
//! It is built in one pass and never mutated; any change to the document
//! set means building a new one.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::content::Document;
use crate::error::{DuplicateSlugError, NotFound};

/// What the index knows about a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub slug: String,
    pub title: String,
    pub publish_date: NaiveDate,
    pub draft: bool,
    /// Position of the document in the slice the index was built from
    #[serde(skip)]
    pub position: usize,
}

/// Listings over the published documents of a corpus
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    entries: HashMap<String, IndexEntry>,
    by_date: Vec<String>,
    by_tag: BTreeMap<String, Vec<String>>,
    all_tags: BTreeSet<String>,
    drafts: BTreeSet<String>,
}

impl CorpusIndex {
    /// Build the index. Fails without returning anything if two documents
    /// share a slug.
    pub fn build(documents: &[Document]) -> Result<Self, DuplicateSlugError> {
        let mut entries: HashMap<String, IndexEntry> = HashMap::with_capacity(documents.len());

        for (position, doc) in documents.iter().enumerate() {
            if let Some(existing) = entries.get(&doc.slug) {
                return Err(DuplicateSlugError {
                    slug: doc.slug.clone(),
                    first: documents[existing.position].source.clone(),
                    second: doc.source.clone(),
                });
            }
            entries.insert(
                doc.slug.clone(),
                IndexEntry {
                    slug: doc.slug.clone(),
                    title: doc.title.clone(),
                    publish_date: doc.publish_date,
                    draft: doc.draft,
                    position,
                },
            );
        }

        let mut published: Vec<&Document> = documents.iter().filter(|d| !d.draft).collect();
        published.sort_by(|a, b| newest_first(a, b));

        let mut by_tag: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for doc in &published {
            for tag in &doc.tags {
                by_tag.entry(tag.clone()).or_default().push(doc.slug.clone());
            }
        }

        let all_tags = by_tag.keys().cloned().collect();
        let by_date = published.iter().map(|d| d.slug.clone()).collect();
        let drafts = documents
            .iter()
            .filter(|d| d.draft)
            .map(|d| d.slug.clone())
            .collect();

        tracing::debug!(
            "Indexed {} documents ({} drafts, {} tags)",
            documents.len(),
            documents.len() - published.len(),
            by_tag.len()
        );

        Ok(Self {
            entries,
            by_date,
            by_tag,
            all_tags,
            drafts,
        })
    }

    /// Published slugs carrying `tag`, newest first. Unknown tags yield an
    /// empty slice.
    pub fn by_tag(&self, tag: &str) -> &[String] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All published slugs, newest first
    pub fn by_date(&self) -> &[String] {
        &self.by_date
    }

    /// The `n` most recent published slugs
    pub fn latest(&self, n: usize) -> &[String] {
        &self.by_date[..n.min(self.by_date.len())]
    }

    /// Every tag used by a published document
    pub fn all_tags(&self) -> &BTreeSet<String> {
        &self.all_tags
    }

    /// Number of published documents per tag
    pub fn tag_counts(&self) -> BTreeMap<&str, usize> {
        self.by_tag
            .iter()
            .map(|(tag, slugs)| (tag.as_str(), slugs.len()))
            .collect()
    }

    /// Slugs of draft documents, for preview lookups
    pub fn drafts(&self) -> &BTreeSet<String> {
        &self.drafts
    }

    /// Look up any document, draft or not
    pub fn resolve(&self, slug: &str) -> Option<&IndexEntry> {
        self.entries.get(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Date descending, then slug ascending so equal dates still order totally
fn newest_first(a: &Document, b: &Document) -> Ordering {
    b.publish_date
        .cmp(&a.publish_date)
        .then_with(|| a.slug.cmp(&b.slug))
}

/// Documents together with their index
///
/// This is the read-only snapshot shared by render tasks.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    index: CorpusIndex,
}

impl Corpus {
    pub fn build(documents: Vec<Document>) -> Result<Self, DuplicateSlugError> {
        let index = CorpusIndex::build(&documents)?;
        Ok(Self { documents, index })
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    /// Fetch a document by slug, drafts included
    pub fn get(&self, slug: &str) -> Result<&Document, NotFound> {
        self.index
            .resolve(slug)
            .map(|entry| &self.documents[entry.position])
            .ok_or_else(|| NotFound(slug.to_string()))
    }

    /// All documents in load order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Published documents, newest first
    pub fn published(&self) -> impl Iterator<Item = &Document> + '_ {
        self.index
            .by_date()
            .iter()
            .filter_map(move |slug| self.get(slug).ok())
    }
}
