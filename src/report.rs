//! Build report - every per-document problem of a run, collected in one place

use serde::Serialize;
use std::fmt;

use crate::error::ParseError;
use crate::render::UnresolvedReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    Validation,
    MalformedDocument,
    Render,
    UnresolvedReference,
}

impl ProblemKind {
    /// Warnings are reported but do not fail a build
    pub fn is_warning(self) -> bool {
        matches!(self, Self::UnresolvedReference)
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation error",
            Self::MalformedDocument => "malformed document",
            Self::Render => "render error",
            Self::UnresolvedReference => "unresolved reference",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Source identity of the document
    pub source: String,
    /// Slug, when one could be derived
    pub slug: Option<String>,
    pub kind: ProblemKind,
    /// Field name or body position
    pub location: String,
    pub message: String,
}

impl Problem {
    pub fn from_parse(source: &str, slug: Option<String>, err: &ParseError) -> Self {
        let (kind, message) = match err {
            ParseError::Validation { message, .. } => (ProblemKind::Validation, message),
            ParseError::Malformed { message, .. } => (ProblemKind::MalformedDocument, message),
        };
        Self {
            source: source.to_string(),
            slug,
            kind,
            location: err.location().to_string(),
            message: message.clone(),
        }
    }

    pub fn from_unresolved(source: &str, warning: &UnresolvedReference) -> Self {
        Self {
            source: source.to_string(),
            slug: Some(warning.slug.clone()),
            kind: ProblemKind::UnresolvedReference,
            location: format!("body line {}", warning.line),
            message: format!("`{}`: {}", warning.reference, warning.reason),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}: {}",
            self.source,
            self.slug.as_deref().unwrap_or("-"),
            self.location,
            self.kind,
            self.message
        )
    }
}

/// Problems of one build, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    problems: Vec<Problem>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| !p.kind.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.kind.is_warning())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for problem in &self.problems {
            writeln!(f, "{}", problem)?;
        }
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.errors().count(),
            self.warnings().count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::UnresolvedReason;

    #[test]
    fn test_report_display() {
        let mut report = BuildReport::new();
        report.push(Problem::from_parse(
            "cpp/auto.mdx",
            Some("cpp/auto".to_string()),
            &ParseError::validation("title", "required field is missing"),
        ));
        report.push(Problem::from_unresolved(
            "exec.md",
            &UnresolvedReference {
                slug: "exec".to_string(),
                reference: "/blog/fork".to_string(),
                line: 12,
                reason: UnresolvedReason::NotFound,
            },
        ));

        assert!(report.has_errors());
        assert_eq!(report.warnings().count(), 1);

        let text = report.to_string();
        assert!(text.contains(
            "cpp/auto.mdx [cpp/auto] title: validation error: required field is missing"
        ));
        assert!(text.contains("exec.md [exec] body line 12: unresolved reference"));
        assert!(text.ends_with("1 error(s), 1 warning(s)"));
    }

    #[test]
    fn test_warnings_only_is_not_an_error() {
        let mut report = BuildReport::new();
        report.push(Problem {
            source: "a.md".to_string(),
            slug: Some("a".to_string()),
            kind: ProblemKind::UnresolvedReference,
            location: "body line 1".to_string(),
            message: "`x`: no such document".to_string(),
        });
        assert!(!report.has_errors());
        assert!(!report.is_empty());
    }
}
