//! Document parsing: raw text in, typed `Document` out
//!
//! Parsing is a pure transformation. Reading files is the loader's job.

use super::frontmatter::RawFrontMatter;
use super::{fence, Document, FrontMatter, RawDocument};
use crate::error::ParseError;

/// Extensions stripped from the source identity when deriving a slug
pub const SOURCE_EXTENSIONS: [&str; 3] = ["md", "mdx", "markdown"];

/// Parse a raw document into a `Document`
pub fn parse(raw: &RawDocument) -> Result<Document, ParseError> {
    parse_with(raw, &SOURCE_EXTENSIONS)
}

/// Parse a raw document, stripping any of `extensions` when deriving the slug
pub fn parse_with<S: AsRef<str>>(
    raw: &RawDocument,
    extensions: &[S],
) -> Result<Document, ParseError> {
    let slug = slug_from_source(&raw.source, extensions).ok_or_else(|| {
        ParseError::validation(
            "slug",
            format!("source `{}` does not yield a usable slug", raw.source),
        )
    })?;

    let (yaml, body) = FrontMatter::split(&raw.text)?;
    let raw_fm = match yaml {
        Some(yaml) => RawFrontMatter::decode(yaml)?,
        None => RawFrontMatter::default(),
    };
    // Presence first, so a missing title is reported before a bad date
    raw_fm.check_required()?;
    let fm = raw_fm.convert()?;

    let title = required("title", fm.title)?;
    let summary = required("summary", fm.summary)?;
    let publish_date = fm
        .date
        .ok_or_else(|| ParseError::validation("date", "required field is missing"))?;

    let code_blocks = fence::code_blocks(body)?;

    Ok(Document {
        slug,
        source: raw.source.clone(),
        title,
        summary,
        publish_date,
        tags: fm.tags.into_iter().collect(),
        draft: fm.draft,
        authors: fm.authors,
        layout: fm.layout,
        images: fm.images,
        canonical_url: fm.canonical_url,
        body: body.to_string(),
        code_blocks,
        extra: fm.extra,
    })
}

/// Write a document back to its source form: front matter, then body
pub fn serialize(doc: &Document) -> Result<String, serde_yaml::Error> {
    let fm = FrontMatter {
        title: Some(doc.title.clone()),
        summary: Some(doc.summary.clone()),
        date: Some(doc.publish_date),
        tags: doc.tags.iter().cloned().collect(),
        draft: doc.draft,
        authors: doc.authors.clone(),
        layout: doc.layout.clone(),
        images: doc.images.clone(),
        canonical_url: doc.canonical_url.clone(),
        extra: doc.extra.clone(),
    };
    let yaml = serde_yaml::to_string(&fm)?;
    Ok(format!("---\n{}---\n\n{}", yaml, doc.body))
}

/// Derive a slug from a source identity such as `cpp/Move Semantics.mdx`.
///
/// Every path component is slugified; the result keeps `/` between them.
pub fn slug_from_source<S: AsRef<str>>(source: &str, extensions: &[S]) -> Option<String> {
    let components: Vec<&str> = source
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    let (last, dirs) = components.split_last()?;

    let stem = match last.rsplit_once('.') {
        Some((stem, ext))
            if extensions
                .iter()
                .any(|known| known.as_ref().eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => last,
    };

    let parts: Vec<String> = dirs
        .iter()
        .copied()
        .chain(std::iter::once(stem))
        .map(slug::slugify)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, ParseError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ParseError::validation(field, "required field is empty")),
        None => Err(ParseError::validation(field, "required field is missing")),
    }
}
