//! The individual normalization stages, grouped by the concern they touch.

use std::sync::Arc;

use super::tagging::{Tagger, WordSet};
use super::Stage;
use crate::vocabulary::VocabularyTables;

pub mod calendar;
pub mod exam;
pub mod scalar;
pub mod schedule;
pub mod text;
pub mod workload;

pub use calendar::DurationBlockExtractor;
pub use exam::{parse_minutes, ExamKeyNormalizer, ExamTypeNormalizer};
pub use scalar::{CreditParser, LevelClassifier};
pub use schedule::ScheduleGroupClassifier;
pub use text::{ContentTidier, LanguageNormalizer, TitleFixer};
pub use workload::{WorkloadNormalizer, WorkloadTranslator};

/// Field names of the free-text sections that end up as description segments.
pub const CONTENT_SECTIONS: [&str; 3] = [
    "Content",
    "Learning Outcome",
    "Recommended Academic Qualifications",
];

/// Every stage before assembly, in execution order.
pub fn standard(
    vocabulary: Arc<VocabularyTables>,
    tagger: Arc<dyn Tagger>,
    words: Arc<dyn WordSet>,
) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(ExamKeyNormalizer::new(vocabulary.clone())),
        Box::new(WorkloadNormalizer),
        Box::new(WorkloadTranslator::new(vocabulary.clone())),
        Box::new(TitleFixer),
        Box::new(LanguageNormalizer),
        Box::new(ContentTidier),
        Box::new(CreditParser),
        Box::new(LevelClassifier),
        Box::new(ExamTypeNormalizer::new(vocabulary.clone())),
        Box::new(DurationBlockExtractor::new(vocabulary)),
        Box::new(ScheduleGroupClassifier::new(tagger, words)),
    ]
}
