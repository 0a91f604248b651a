//! Normalization of a raw field bag into a [`CourseRecord`].
//!
//! Stages run strictly in order. Each one takes the bag by value and returns
//! the evolved bag, or a [`StageError`] that is fatal to the page.

use std::sync::Arc;

use tracing::debug;

use crate::error::StageError;
use crate::types::{CourseRecord, RawFieldBag};
use crate::vocabulary::VocabularyTables;

pub mod assemble;
pub mod stages;
pub mod tagging;

pub use assemble::FinalAssembler;
pub use tagging::{LexiconTagger, PosTag, StaticWordSet, Tagger, WordSet};

/// One pure transform of the field bag.
pub trait Stage: Send + Sync {
    /// Name reported when the stage fails.
    fn name(&self) -> &'static str;

    fn apply(&self, bag: RawFieldBag) -> Result<RawFieldBag, StageError>;
}

/// A stage error tagged with the stage that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: &'static str,
    pub error: StageError,
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageFailure {}

pub struct NormalizationPipeline {
    stages: Vec<Box<dyn Stage>>,
    assembler: FinalAssembler,
}

impl NormalizationPipeline {
    pub fn new(
        vocabulary: Arc<VocabularyTables>,
        tagger: Arc<dyn Tagger>,
        words: Arc<dyn WordSet>,
    ) -> Self {
        Self {
            stages: stages::standard(vocabulary, tagger, words),
            assembler: FinalAssembler,
        }
    }

    /// Stage names in execution order, assembly last.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(FinalAssembler::NAME))
            .collect()
    }

    /// Runs every stage before assembly.
    pub fn normalize(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageFailure> {
        for stage in &self.stages {
            debug!(stage = stage.name(), "applying stage");
            bag = stage.apply(bag).map_err(|error| StageFailure {
                stage: stage.name(),
                error,
            })?;
        }
        Ok(bag)
    }

    pub fn run(&self, bag: RawFieldBag) -> Result<CourseRecord, StageFailure> {
        let bag = self.normalize(bag)?;
        self.assembler.assemble(bag).map_err(|error| StageFailure {
            stage: FinalAssembler::NAME,
            error,
        })
    }
}
