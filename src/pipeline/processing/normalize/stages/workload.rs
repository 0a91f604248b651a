use std::sync::Arc;

use tracing::debug;

use crate::common::text::snake_case;
use crate::error::StageError;
use crate::pipeline::processing::normalize::Stage;
use crate::types::{FieldMap, FieldValue, RawFieldBag};
use crate::vocabulary::VocabularyTables;

pub const WORKLOAD_KEY: &str = "Workload";
/// The anchored course-load block, read when the workload section is absent.
pub const COURSE_LOAD_KEY: &str = "course load";

/// Leading `category`/`hours` header cells of the workload list.
const HEADER_CELLS: usize = 2;

/// Turns the alternating category/hours cells into a category to hours mapping.
pub struct WorkloadNormalizer;

impl Stage for WorkloadNormalizer {
    fn name(&self) -> &'static str {
        "WorkloadNormalizer"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let course_load = bag.remove(COURSE_LOAD_KEY);
        let cells = match bag.get(WORKLOAD_KEY) {
            None => match course_load {
                Some(block @ FieldValue::List(_)) => {
                    debug!("no workload section, reading the course load block");
                    Some(block.texts())
                }
                _ => {
                    debug!("no workload section");
                    None
                }
            },
            Some(FieldValue::List(items)) => match items.first() {
                Some(first @ FieldValue::List(_)) => Some(first.texts()),
                _ => return Err(StageError::UnexpectedShape { field: WORKLOAD_KEY }),
            },
            // Already a mapping: nothing left to pair up.
            Some(FieldValue::Map(_)) => None,
            Some(_) => return Err(StageError::UnexpectedShape { field: WORKLOAD_KEY }),
        };
        let Some(cells) = cells else {
            return Ok(bag);
        };

        let mut hours = FieldMap::new();
        let mut rest = cells.into_iter().skip(HEADER_CELLS);
        while let Some(category) = rest.next() {
            let value = rest
                .next()
                .ok_or_else(|| StageError::MalformedWorkload(category.clone()))?;
            hours.insert(category, FieldValue::Number(parse_hours(&value)?));
        }

        bag.insert(WORKLOAD_KEY, FieldValue::Map(hours));
        Ok(bag)
    }
}

fn parse_hours(token: &str) -> Result<f64, StageError> {
    token
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| StageError::MalformedWorkload(token.to_string()))
}

/// Translates workload categories and snake_cases them.
pub struct WorkloadTranslator {
    vocabulary: Arc<VocabularyTables>,
}

impl WorkloadTranslator {
    pub fn new(vocabulary: Arc<VocabularyTables>) -> Self {
        Self { vocabulary }
    }
}

impl Stage for WorkloadTranslator {
    fn name(&self) -> &'static str {
        "WorkloadTranslator"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let Some(FieldValue::Map(hours)) = bag.remove(WORKLOAD_KEY) else {
            return Ok(bag);
        };
        let translated: FieldMap = hours
            .into_iter()
            .map(|(category, value)| {
                (snake_case(self.vocabulary.workload_category(&category)), value)
            })
            .collect();
        bag.insert(WORKLOAD_KEY, FieldValue::Map(translated));
        Ok(bag)
    }
}
