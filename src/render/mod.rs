//! Render pipeline - turns a document body into an ordered node tree
//!
//! The tree alternates prose and code nodes in source order. Highlighting
//! and templating are left to the presentation layer; this module only
//! guarantees that code blocks keep their language tag and ordinal, and
//! that cross-references are resolved against the injected index.

mod prose;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::SiteConfig;
use crate::content::fence::{self, Segment};
use crate::content::Document;
use crate::error::RenderError;
use crate::index::{CorpusIndex, IndexEntry};

use prose::normalize_prefix;

/// Presentation-ready form of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedOutput {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub publish_date: NaiveDate,
    pub tags: Vec<String>,
    /// Declared authors, or the site default
    pub authors: Vec<String>,
    pub draft: bool,
    pub layout: Option<String>,
    pub images: Option<Vec<String>>,
    pub canonical_url: Option<String>,
    /// Front-matter fields passed through for the presentation layer
    pub extra: IndexMap<String, serde_yaml::Value>,
    pub nodes: Vec<Node>,
    pub toc: Vec<TocEntry>,
    /// Prose before the `<!-- more -->` marker
    pub excerpt: Option<String>,
    pub word_count: usize,
    pub warnings: Vec<UnresolvedReference>,
}

impl RenderedOutput {
    /// Code nodes in order
    pub fn code_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| matches!(n, Node::Code { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Prose { spans: Vec<Span> },
    Code {
        language: String,
        content: String,
        ordinal: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Span {
    /// Raw Markdown/MDX text
    Text { text: String },
    /// Cross-reference resolved to another document
    Link {
        text: String,
        slug: String,
        href: String,
    },
    /// Cross-reference that could not be resolved, kept as literal text
    Unresolved { text: String, reference: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub depth: usize,
    pub text: String,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No document has this slug
    NotFound,
    /// The target is a draft and drafts are not rendered
    Draft,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("no such document"),
            Self::Draft => f.write_str("target is a draft"),
        }
    }
}

/// Non-fatal: a cross-reference that degraded to literal text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    /// Document containing the reference
    pub slug: String,
    /// Reference as written
    pub reference: String,
    /// 1-based body line
    pub line: usize,
    pub reason: UnresolvedReason,
}

/// Renders documents against a fixed index snapshot
pub struct Renderer<'a> {
    index: &'a CorpusIndex,
    config: &'a SiteConfig,
    link_prefix: String,
}

impl<'a> Renderer<'a> {
    pub fn new(index: &'a CorpusIndex, config: &'a SiteConfig) -> Self {
        Self {
            index,
            config,
            link_prefix: normalize_prefix(&config.link_prefix),
        }
    }

    /// Render one document
    pub fn render(&self, doc: &Document) -> Result<RenderedOutput, RenderError> {
        let segments = fence::segments(&doc.body).map_err(|source| RenderError::Body {
            slug: doc.slug.clone(),
            source,
        })?;

        let mut nodes = Vec::with_capacity(segments.len());
        let mut warnings = Vec::new();
        let mut toc = Vec::new();
        let mut anchors = Anchors::default();
        let mut word_count = 0;
        let mut excerpt = None;
        let mut code_seen = 0;

        for segment in segments {
            match segment {
                Segment::Prose { text, offset, line } => {
                    if text.trim().is_empty() {
                        continue;
                    }

                    let scan = prose::scan(text, &self.config.link_prefix);
                    if excerpt.is_none() {
                        if let Some(pos) = scan.more {
                            excerpt = Some(doc.body[..offset + pos].trim().to_string());
                        }
                    }
                    word_count += scan.words;
                    toc.extend(scan.headings.into_iter().map(|h| TocEntry {
                        depth: h.depth,
                        id: anchors.claim(h.id.unwrap_or_else(|| slug::slugify(&h.text))),
                        text: h.text,
                    }));

                    let mut spans = Vec::new();
                    let mut cursor = 0;
                    for reference in scan.references {
                        push_text(&mut spans, &text[cursor..reference.range.start]);
                        cursor = reference.range.end;

                        match self.resolve(&reference.slug) {
                            Ok(entry) => spans.push(Span::Link {
                                text: reference.text.unwrap_or_else(|| entry.title.clone()),
                                href: format!(
                                    "{}{}{}",
                                    self.link_prefix, entry.slug, reference.suffix
                                ),
                                slug: entry.slug.clone(),
                            }),
                            Err(reason) => {
                                tracing::debug!(
                                    "Unresolved reference `{}` in {}: {}",
                                    reference.target,
                                    doc.slug,
                                    reason
                                );
                                warnings.push(UnresolvedReference {
                                    slug: doc.slug.clone(),
                                    reference: reference.target.clone(),
                                    line: line + text[..reference.range.start].matches('\n').count(),
                                    reason,
                                });
                                spans.push(Span::Unresolved {
                                    text: reference.text.unwrap_or_else(|| reference.slug.clone()),
                                    reference: reference.target,
                                });
                            }
                        }
                    }
                    push_text(&mut spans, &text[cursor..]);

                    nodes.push(Node::Prose { spans });
                }
                Segment::Code { block, .. } => {
                    if doc.code_blocks.get(block.ordinal) != Some(&block) {
                        return Err(RenderError::CodeBlockMismatch {
                            slug: doc.slug.clone(),
                            ordinal: block.ordinal,
                        });
                    }
                    code_seen += 1;
                    nodes.push(Node::Code {
                        language: block.language,
                        content: block.content,
                        ordinal: block.ordinal,
                    });
                }
            }
        }

        if code_seen != doc.code_blocks.len() {
            return Err(RenderError::CodeBlockMismatch {
                slug: doc.slug.clone(),
                ordinal: code_seen,
            });
        }

        Ok(RenderedOutput {
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            summary: doc.summary.clone(),
            publish_date: doc.publish_date,
            tags: doc.tags.iter().cloned().collect(),
            authors: doc.authors_or(&self.config.default_authors).to_vec(),
            draft: doc.draft,
            layout: doc.layout.clone(),
            images: doc.images.clone(),
            canonical_url: self.canonical_url(doc),
            extra: doc.extra.clone(),
            nodes,
            toc,
            excerpt,
            word_count,
            warnings,
        })
    }

    fn resolve(&self, slug: &str) -> Result<&'a IndexEntry, UnresolvedReason> {
        match self.index.resolve(slug) {
            None => Err(UnresolvedReason::NotFound),
            Some(entry) if entry.draft && !self.config.render_drafts => {
                Err(UnresolvedReason::Draft)
            }
            Some(entry) => Ok(entry),
        }
    }

    /// An explicit override always wins; drafts get no computed URL
    fn canonical_url(&self, doc: &Document) -> Option<String> {
        match &doc.canonical_url {
            Some(url) => Some(url.clone()),
            None if doc.draft => None,
            None => Some(self.config.document_url(&doc.slug)),
        }
    }
}

fn push_text(spans: &mut Vec<Span>, text: &str) {
    if !text.is_empty() {
        spans.push(Span::Text {
            text: text.to_string(),
        });
    }
}

/// Hands out unique heading anchors, suffixing repeats with `-1`, `-2`, ...
#[derive(Default)]
struct Anchors {
    seen: HashMap<String, usize>,
}

impl Anchors {
    fn claim(&mut self, base: String) -> String {
        let count = self.seen.entry(base.clone()).or_insert(0);
        let id = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        id
    }
}
