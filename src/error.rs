//! Error types for the parse, index and render stages

use thiserror::Error;

use crate::report::BuildReport;

/// Why a single document could not be parsed.
///
/// Both variants are fatal to that document only: the pipeline drops it
/// from the corpus and records the problem in the build report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Missing or malformed metadata
    #[error("invalid `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Unbalanced structural markers (front-matter delimiters, code fences)
    #[error("malformed document at {location}: {message}")]
    Malformed { location: String, message: String },
}

impl ParseError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Field or position the error points at
    pub fn location(&self) -> &str {
        match self {
            Self::Validation { field, .. } => field,
            Self::Malformed { location, .. } => location,
        }
    }
}

/// Two documents derived the same slug. Aborts the whole index build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate slug `{slug}`: `{first}` and `{second}`")]
pub struct DuplicateSlugError {
    pub slug: String,
    /// Source identity of the entry seen first
    pub first: String,
    /// Source identity of the colliding entry
    pub second: String,
}

/// Lookup of a slug the corpus does not contain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no document with slug `{0}`")]
pub struct NotFound(pub String);

/// Rendering failures. Unresolved references are not errors; they are
/// reported as warnings on the output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("body of `{slug}` no longer parses: {source}")]
    Body {
        slug: String,
        #[source]
        source: ParseError,
    },

    #[error("code block {ordinal} of `{slug}` does not match the parsed document")]
    CodeBlockMismatch { slug: String, ordinal: usize },
}

/// Errors that abort a whole pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `report` holds the per-document problems found before the abort
    #[error("{error}")]
    DuplicateSlug {
        error: DuplicateSlugError,
        report: BuildReport,
    },

    #[error("build cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Problems collected before the run was aborted
    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            Self::DuplicateSlug { report, .. } => Some(report),
            Self::Cancelled => None,
        }
    }
}
