//! Prose scanning: cross-references, headings and word counts

use lazy_static::lazy_static;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use std::ops::Range;

use crate::content::fence::markdown_options;

/// Marker separating the excerpt from the rest of a post
pub(crate) const MORE_MARKER: &str = "<!-- more -->";

lazy_static! {
    /// `[[slug]]` or `[[slug|text]]`
    static ref WIKI_LINK: Regex =
        Regex::new(r"\[\[([^\[\]|\n]+)(?:\|([^\[\]\n]+))?\]\]").unwrap();
}

/// A cross-reference found in a prose segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    /// Byte range of the whole construct within the segment
    pub range: Range<usize>,
    /// The reference as written (link destination or wiki target)
    pub target: String,
    /// Slug the reference points at
    pub slug: String,
    /// Fragment or query kept from the destination, e.g. `#usage`
    pub suffix: String,
    /// Link text; `None` for bare `[[slug]]`
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Heading {
    pub depth: usize,
    pub text: String,
    /// Explicit `{#id}` attribute
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct ProseScan {
    pub references: Vec<Reference>,
    pub headings: Vec<Heading>,
    pub words: usize,
    /// Byte offset of a `<!-- more -->` marker written as HTML, not as code
    pub more: Option<usize>,
}

struct OpenLink {
    start: usize,
    dest: String,
    text: String,
}

/// Scan one prose segment. References come back ordered by position.
pub(crate) fn scan(text: &str, link_prefix: &str) -> ProseScan {
    let mut scan = ProseScan::default();
    // Ranges whose contents are verbatim: inline code, indented code, links
    let mut opaque: Vec<Range<usize>> = Vec::new();
    let mut link: Option<OpenLink> = None;
    let mut heading: Option<Heading> = None;
    let mut code_block_start: Option<usize> = None;

    for (event, range) in Parser::new_ext(text, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Link { dest_url, .. }) => {
                link = Some(OpenLink {
                    start: range.start,
                    dest: dest_url.to_string(),
                    text: String::new(),
                });
            }
            Event::End(TagEnd::Link) => {
                if let Some(open) = link.take() {
                    let whole = open.start..range.end;
                    opaque.push(whole.clone());
                    if let Some((slug, suffix)) = split_target(&open.dest, link_prefix) {
                        scan.references.push(Reference {
                            range: whole,
                            target: open.dest.clone(),
                            slug,
                            suffix,
                            text: Some(open.text),
                        });
                    }
                }
            }
            Event::Start(Tag::Heading { level, id, .. }) => {
                heading = Some(Heading {
                    depth: level as usize,
                    text: String::new(),
                    id: id.map(|id| id.to_string()),
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(h) = heading.take() {
                    scan.headings.push(Heading {
                        text: h.text.trim().to_string(),
                        ..h
                    });
                }
            }
            Event::Start(Tag::CodeBlock(_)) => code_block_start = Some(range.start),
            Event::End(TagEnd::CodeBlock) => {
                if let Some(start) = code_block_start.take() {
                    opaque.push(start..range.end);
                }
            }
            Event::Text(t) if code_block_start.is_none() => {
                scan.words += t.split_whitespace().count();
                append(&mut link, &mut heading, &t);
            }
            Event::Html(_) | Event::InlineHtml(_) if scan.more.is_none() => {
                scan.more = text[range.clone()]
                    .find(MORE_MARKER)
                    .map(|i| range.start + i);
            }
            Event::Code(t) => {
                opaque.push(range);
                scan.words += t.split_whitespace().count();
                append(&mut link, &mut heading, &t);
            }
            _ => {}
        }
    }

    for caps in WIKI_LINK.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let range = whole.range();
        if opaque.iter().any(|o| overlaps(o, &range)) {
            continue;
        }
        let target = caps[1].trim().to_string();
        let (slug, suffix) = split_fragment(&target);
        if slug.is_empty() {
            continue;
        }
        scan.references.push(Reference {
            range,
            slug,
            suffix,
            text: caps.get(2).map(|m| m.as_str().trim().to_string()),
            target,
        });
    }

    scan.references.sort_by_key(|r| r.range.start);
    scan
}

fn append(link: &mut Option<OpenLink>, heading: &mut Option<Heading>, text: &str) {
    if let Some(open) = link.as_mut() {
        open.text.push_str(text);
    }
    if let Some(h) = heading.as_mut() {
        h.text.push_str(text);
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Normalize a link prefix to `/segment/` form (`/` for the site root)
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Split a link destination under `link_prefix` into slug and suffix.
/// Destinations outside the prefix are not cross-references.
fn split_target(dest: &str, link_prefix: &str) -> Option<(String, String)> {
    let rest = dest.strip_prefix(normalize_prefix(link_prefix).as_str())?;
    let (slug, suffix) = split_fragment(rest);
    (!slug.is_empty()).then_some((slug, suffix))
}

fn split_fragment(target: &str) -> (String, String) {
    let cut = target.find(['#', '?']).unwrap_or(target.len());
    (
        target[..cut].trim_end_matches('/').to_string(),
        target[cut..].to_string(),
    )
}
