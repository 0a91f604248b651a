//! Per-page pipeline driver and the bounded worker pool over a page source.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{Config, NonTargetMode};
use crate::error::{PipelineFailure, Result, ScraperError};
use crate::metrics::{PageMetrics, PageTimer};
use crate::pages::PageSource;
use crate::parser::{FieldExtractor, HtmlFieldExtractor};
use crate::pipeline::processing::normalize::{
    LexiconTagger, NormalizationPipeline, StaticWordSet, Tagger, WordSet,
};
use crate::storage::RecordSink;
use crate::types::{CourseRecord, FieldValue, RawFieldBag};
use crate::vocabulary::VocabularyTables;

const FACULTY_KEY: &str = "contracting faculty";
/// Failure stage of a page whose worker task panicked or was cancelled.
const WORKER_STAGE: &str = "worker";

/// What became of one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Parsed(CourseRecord),
    /// The course belongs to another faculty. Carries the translated bag so a
    /// secondary sink can keep it.
    Skipped { faculty: String, bag: RawFieldBag },
    Failed(PipelineFailure),
}

/// Counts of a batch run plus every failure in it.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub parsed: usize,
    pub skipped: usize,
    pub failures: Vec<PipelineFailure>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.parsed + self.skipped + self.failed()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub workers: usize,
    pub non_target: NonTargetMode,
}

pub struct PipelineOrchestrator {
    extractor: Arc<dyn FieldExtractor>,
    vocabulary: Arc<VocabularyTables>,
    pipeline: NormalizationPipeline,
    target_faculty: String,
}

impl PipelineOrchestrator {
    pub fn new(
        vocabulary: Arc<VocabularyTables>,
        tagger: Arc<dyn Tagger>,
        words: Arc<dyn WordSet>,
        target_faculty: impl Into<String>,
    ) -> Self {
        Self {
            extractor: Arc::new(HtmlFieldExtractor::new()),
            pipeline: NormalizationPipeline::new(vocabulary.clone(), tagger, words),
            vocabulary,
            target_faculty: target_faculty.into(),
        }
    }

    /// Builds an orchestrator with the vocabulary and word list named by the
    /// configuration, falling back to the built-in ones.
    pub fn from_config(config: &Config) -> Result<Self> {
        let vocabulary = match &config.vocabulary {
            Some(path) => VocabularyTables::load(path)?,
            None => VocabularyTables::default(),
        };
        let words = match &config.word_list {
            Some(path) => StaticWordSet::load(path)?,
            None => StaticWordSet::embedded(),
        };
        debug!("word list holds {} entries", words.len());
        Ok(Self::new(
            Arc::new(vocabulary),
            Arc::new(LexiconTagger::default()),
            Arc::new(words),
            config.target_faculty.clone(),
        ))
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn FieldExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn target_faculty(&self) -> &str {
        &self.target_faculty
    }

    /// Renames every field through the field-name table. When two raw names
    /// map to the same canonical name the later value wins.
    pub fn translate_keys(&self, bag: RawFieldBag) -> RawFieldBag {
        bag.into_iter()
            .map(|(key, value)| (self.vocabulary.field_name(&key).to_string(), value))
            .collect()
    }

    /// Runs extraction, the faculty filter and normalization for one page.
    #[instrument(skip(self, markup), fields(source = %source_id))]
    pub fn process_page(&self, source_id: &str, url: &str, markup: &str) -> PageOutcome {
        let _timer = PageTimer::start();

        let bag = match self.extractor.extract(url, markup) {
            Ok(bag) => bag,
            Err(e) => return self.fail(PipelineFailure::new(source_id, "extract", e)),
        };
        let mut bag = self.translate_keys(bag);

        let faculty = bag
            .get(FACULTY_KEY)
            .and_then(FieldValue::first_text)
            .map(|raw| self.vocabulary.faculty(raw).to_string())
            .unwrap_or_default();
        if !faculty.is_empty() {
            bag.insert(FACULTY_KEY, FieldValue::Text(faculty.clone()));
        }

        if faculty != self.target_faculty {
            debug!("skipping course of {faculty:?}");
            PageMetrics::record_skipped();
            return PageOutcome::Skipped { faculty, bag };
        }

        match self.pipeline.run(bag) {
            Ok(record) => {
                PageMetrics::record_parsed();
                PageOutcome::Parsed(record)
            }
            Err(failure) => self.fail(PipelineFailure::new(
                source_id,
                failure.stage,
                failure.error,
            )),
        }
    }

    fn fail(&self, failure: PipelineFailure) -> PageOutcome {
        error!("{}", failure);
        PageMetrics::record_failed(&failure.stage);
        PageOutcome::Failed(failure)
    }

    /// Processes every page of `source` with at most `options.workers` pages
    /// in flight. A failing page never stops the batch.
    #[instrument(skip_all, fields(workers = options.workers))]
    pub async fn run_batch(
        self: Arc<Self>,
        source: Arc<dyn PageSource>,
        sink: Arc<dyn RecordSink>,
        options: BatchOptions,
    ) -> Result<BatchSummary> {
        let names = source.list().await?;
        info!("processing {} pages", names.len());

        let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
        let mut workers = Vec::with_capacity(names.len());
        for name in names {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ScraperError::Config(format!("worker pool closed: {e}")))?;
            let orchestrator = Arc::clone(&self);
            let source = Arc::clone(&source);
            let sink = Arc::clone(&sink);
            let page = name.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                orchestrator
                    .run_page(&page, source.as_ref(), sink.as_ref(), options.non_target)
                    .await
            });
            workers.push((name, handle));
        }

        // A lost worker only costs its own page.
        let mut summary = BatchSummary::default();
        for (name, handle) in workers {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => self.fail(PipelineFailure::new(name, WORKER_STAGE, e)),
            };
            match outcome {
                PageOutcome::Parsed(_) => summary.parsed += 1,
                PageOutcome::Skipped { .. } => summary.skipped += 1,
                PageOutcome::Failed(failure) => summary.failures.push(failure),
            }
        }
        summary.failures.sort_by(|a, b| a.source_id.cmp(&b.source_id));

        info!(
            "batch done: {} parsed, {} skipped, {} failed",
            summary.parsed,
            summary.skipped,
            summary.failed()
        );
        Ok(summary)
    }

    async fn run_page(
        self: Arc<Self>,
        name: &str,
        source: &dyn PageSource,
        sink: &dyn RecordSink,
        non_target: NonTargetMode,
    ) -> PageOutcome {
        let page = match source.fetch(name).await {
            Ok(page) => page,
            Err(e) => return self.fail(PipelineFailure::new(name, "fetch", e)),
        };

        // Parsing is CPU-bound; keep it off the async workers.
        let orchestrator = Arc::clone(&self);
        let outcome = match tokio::task::spawn_blocking(move || {
            orchestrator.process_page(&page.name, &page.url, &page.markup)
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(PipelineFailure::new(name, WORKER_STAGE, e)),
        };

        let written = match &outcome {
            PageOutcome::Parsed(record) => sink.write_record(record).await,
            PageOutcome::Skipped { bag, .. } if non_target == NonTargetMode::Secondary => {
                sink.write_secondary(name, bag).await
            }
            _ => Ok(()),
        };
        match written {
            Ok(()) => outcome,
            Err(e) => {
                warn!("could not write output for {name}");
                self.fail(PipelineFailure::new(name, "write", e))
            }
        }
    }
}
