//! Build pipeline - parse, index and render a whole corpus
//!
//! Parsing and rendering run on the rayon pool, one task per document.
//! Every task writes only its own output slot and results are collected in
//! input order, so the outcome does not depend on scheduling. Building the
//! index is the one synchronization point between the two parallel phases.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::SiteConfig;
use crate::content::{self, Document, RawDocument};
use crate::error::{ParseError, PipelineError, RenderError};
use crate::index::Corpus;
use crate::render::{RenderedOutput, Renderer};
use crate::report::{BuildReport, Problem, ProblemKind};

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Build {
    pub corpus: Corpus,
    /// Rendered documents in load order
    pub outputs: Vec<RenderedOutput>,
    pub report: BuildReport,
}

pub struct Pipeline {
    config: SiteConfig,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share `flag` as the cancellation flag; setting it aborts a running
    /// build at the next task boundary
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancelled.load(Ordering::Relaxed) {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run all three phases over `raws`
    pub fn run(&self, raws: Vec<RawDocument>) -> Result<Build, PipelineError> {
        let start = Instant::now();
        let mut report = BuildReport::new();

        let documents = self.parse_all(&raws, &mut report)?;
        tracing::info!(
            "Parsed {} of {} documents",
            documents.len(),
            raws.len()
        );

        let corpus = match Corpus::build(documents) {
            Ok(corpus) => corpus,
            Err(error) => return Err(PipelineError::DuplicateSlug { error, report }),
        };
        tracing::info!(
            "Indexed {} published documents, {} drafts, {} tags",
            corpus.index().by_date().len(),
            corpus.index().drafts().len(),
            corpus.index().all_tags().len()
        );

        let outputs = self.render_all(&corpus, &mut report)?;

        tracing::info!(
            "Rendered {} documents in {:.2}s ({} errors, {} warnings)",
            outputs.len(),
            start.elapsed().as_secs_f64(),
            report.errors().count(),
            report.warnings().count()
        );

        Ok(Build {
            corpus,
            outputs,
            report,
        })
    }

    fn parse_all(
        &self,
        raws: &[RawDocument],
        report: &mut BuildReport,
    ) -> Result<Vec<Document>, PipelineError> {
        let results: Vec<Result<Document, ParseError>> = raws
            .par_iter()
            .map(|raw| {
                self.check_cancelled()?;
                Ok(content::parse_with(raw, &self.config.extensions))
            })
            .collect::<Result<_, PipelineError>>()?;

        let mut documents = Vec::with_capacity(results.len());
        for (raw, result) in raws.iter().zip(results) {
            match result {
                Ok(doc) => {
                    tracing::debug!("Parsed {} as {}", raw.source, doc.slug);
                    documents.push(doc);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", raw.source, e);
                    report.push(Problem::from_parse(
                        &raw.source,
                        content::slug_from_source(&raw.source, &self.config.extensions),
                        &e,
                    ));
                }
            }
        }
        Ok(documents)
    }

    fn render_all(
        &self,
        corpus: &Corpus,
        report: &mut BuildReport,
    ) -> Result<Vec<RenderedOutput>, PipelineError> {
        let renderer = Renderer::new(corpus.index(), &self.config);
        let render_drafts = self.config.render_drafts;

        let results: Vec<(&Document, Result<RenderedOutput, RenderError>)> = corpus
            .documents()
            .par_iter()
            .filter(|doc| doc.is_published() || render_drafts)
            .map(|doc| {
                self.check_cancelled()?;
                Ok((doc, renderer.render(doc)))
            })
            .collect::<Result<_, PipelineError>>()?;

        let mut outputs = Vec::with_capacity(results.len());
        for (doc, result) in results {
            match result {
                Ok(output) => {
                    for warning in &output.warnings {
                        tracing::warn!(
                            "{}: unresolved reference `{}` ({})",
                            doc.source,
                            warning.reference,
                            warning.reason
                        );
                        report.push(Problem::from_unresolved(&doc.source, warning));
                    }
                    outputs.push(output);
                }
                Err(e) => {
                    tracing::warn!("Failed to render {}: {}", doc.source, e);
                    report.push(Problem {
                        source: doc.source.clone(),
                        slug: Some(doc.slug.clone()),
                        kind: ProblemKind::Render,
                        location: "body".to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Node;

    fn raw(source: &str, date: &str, extra: &str, body: &str) -> RawDocument {
        RawDocument::new(
            source,
            format!("---\ntitle: {source}\nsummary: S\ndate: {date}\n{extra}---\n{body}"),
        )
    }

    #[test]
    fn test_bad_documents_are_reported_not_fatal() {
        let raws = vec![
            raw("good.md", "2024-01-01", "tags: [cpp]\n", "See [[missing]].\n"),
            RawDocument::new("untitled.md", "---\nsummary: S\ndate: 2024-01-01\n---\n"),
            raw("broken.md", "2024-01-01", "", "```cpp\nint a;\n"),
            raw("baddate.md", "2024-02-30", "", ""),
        ];
        let build = Pipeline::new(SiteConfig::default()).run(raws).unwrap();

        assert_eq!(build.corpus.documents().len(), 1);
        assert_eq!(build.outputs.len(), 1);

        let problems = build.report.problems();
        assert_eq!(problems.len(), 4);
        assert_eq!(problems[0].source, "untitled.md");
        assert_eq!(problems[0].kind, ProblemKind::Validation);
        assert_eq!(problems[0].location, "title");
        assert_eq!(problems[0].slug.as_deref(), Some("untitled"));
        assert_eq!(problems[1].kind, ProblemKind::MalformedDocument);
        assert_eq!(problems[2].location, "date");
        assert_eq!(problems[3].kind, ProblemKind::UnresolvedReference);
        assert!(build.report.has_errors());
    }

    #[test]
    fn test_duplicate_slug_aborts_and_keeps_report() {
        let raws = vec![
            RawDocument::new("a.md", "---\nsummary: S\ndate: 2024-01-01\n---\n"),
            raw("auto.md", "2024-01-01", "", ""),
            raw("AUTO.mdx", "2024-01-02", "", ""),
        ];
        let err = Pipeline::new(SiteConfig::default()).run(raws).unwrap_err();
        match &err {
            PipelineError::DuplicateSlug { error, report } => {
                assert_eq!(error.slug, "auto");
                assert_eq!(error.first, "auto.md");
                assert_eq!(error.second, "AUTO.mdx");

                assert_eq!(report.problems().len(), 1);
                assert_eq!(report.problems()[0].source, "a.md");
                assert_eq!(report.problems()[0].location, "title");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.report().is_some());
    }

    #[test]
    fn test_configured_extensions_shape_slugs() {
        let config = SiteConfig {
            extensions: vec!["txt".to_string()],
            ..Default::default()
        };
        let build = Pipeline::new(config)
            .run(vec![raw("notes.txt", "2024-01-01", "", "")])
            .unwrap();
        assert_eq!(build.outputs[0].slug, "notes");
    }

    #[test]
    fn test_outputs_keep_input_order() {
        let raws: Vec<_> = (0..64)
            .map(|i| {
                raw(
                    &format!("post-{i:02}.md"),
                    "2024-01-01",
                    "",
                    &format!("Body {i}\n\n```cpp\nint v = {i};\n```\n"),
                )
            })
            .collect();
        let build = Pipeline::new(SiteConfig::default()).run(raws).unwrap();

        assert_eq!(build.outputs.len(), 64);
        for (i, output) in build.outputs.iter().enumerate() {
            assert_eq!(output.slug, format!("post-{i:02}"));
            let code: Vec<_> = output.code_nodes().collect();
            assert_eq!(
                code,
                vec![&Node::Code {
                    language: "cpp".to_string(),
                    content: format!("int v = {i};"),
                    ordinal: 0,
                }]
            );
        }
        assert!(build.report.is_empty());
    }

    #[test]
    fn test_drafts_rendered_only_in_preview() {
        let raws = || {
            vec![
                raw("a.md", "2024-01-01", "", ""),
                raw("b.md", "2024-01-01", "draft: true\n", ""),
            ]
        };
        let build = Pipeline::new(SiteConfig::default()).run(raws()).unwrap();
        assert_eq!(build.outputs.len(), 1);
        assert!(build.corpus.get("b").unwrap().draft);

        let config = SiteConfig {
            render_drafts: true,
            ..Default::default()
        };
        let build = Pipeline::new(config).run(raws()).unwrap();
        assert_eq!(build.outputs.len(), 2);
    }

    #[test]
    fn test_cancelled_build() {
        let flag = Arc::new(AtomicBool::new(false));
        let pipeline = Pipeline::new(SiteConfig::default()).with_cancel_flag(Arc::clone(&flag));
        flag.store(true, Ordering::Relaxed);
        let result = pipeline.run(vec![raw("a.md", "2024-01-01", "", "")]);
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }
}
