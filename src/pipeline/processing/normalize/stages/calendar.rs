use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::common::text::{collapse_whitespace, fix_string};
use crate::error::StageError;
use crate::pipeline::processing::normalize::Stage;
use crate::types::{FieldValue, RawFieldBag};
use crate::vocabulary::VocabularyTables;

pub const DURATION_KEY: &str = "duration";
pub const PLACEMENT_KEY: &str = "placement";
pub const START_BLOCK_KEY: &str = "start_block";

static NOT_DURATION_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9, ]").expect("static pattern is valid"));
static BLOCK_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d) block").expect("static pattern is valid"));
static SEMESTER_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d) semest(?:er|re)").expect("static pattern is valid"));
static MULTI_OPTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?block ((\d+\+\d+, )*(\d+\+\d+ or \d+\+\d+))\)?")
        .expect("static pattern is valid")
});
/// Teaching blocks run from 1 to 5, the fifth being the summer block.
static START_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"block ([1-5])\b").expect("static pattern is valid"));

/// Seasons checked in this order when no block number is given.
const SEASON_BLOCKS: [(&str, u8); 3] = [("spring", 3), ("summer", 5), ("autumn", 1)];

/// Reads the block count from the duration and the first block from the placement.
pub struct DurationBlockExtractor {
    vocabulary: Arc<VocabularyTables>,
}

impl DurationBlockExtractor {
    pub fn new(vocabulary: Arc<VocabularyTables>) -> Self {
        Self { vocabulary }
    }

    /// Block count of a duration text; a semester counts as two blocks.
    pub fn duration_blocks(&self, text: &str) -> Option<u32> {
        let text = collapse_whitespace(&text.to_lowercase()).replace("blok", "block");
        let text = NOT_DURATION_CHAR.replace_all(&text, "");

        if let Some(caps) = BLOCK_COUNT.captures(&text) {
            return caps[1].parse().ok();
        }
        SEMESTER_COUNT
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .map(|semesters| semesters * 2)
    }

    /// First block of a placement text. Placements offering several start
    /// options have no single start block.
    pub fn start_block(&self, text: &str) -> Option<u8> {
        let mut text = fix_string(&text.to_lowercase());
        for (danish, english) in &self.vocabulary.time_words {
            text = text.replace(danish.as_str(), english);
        }

        if MULTI_OPTION_START.is_match(&text) {
            debug!("ambiguous placement {text:?}");
            return None;
        }
        if let Some(caps) = START_BLOCK.captures(&text) {
            return caps[1].parse().ok();
        }
        SEASON_BLOCKS
            .iter()
            .find(|(season, _)| text.contains(season))
            .map(|(_, block)| *block)
    }
}

impl Stage for DurationBlockExtractor {
    fn name(&self) -> &'static str {
        "DurationBlockExtractor"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        if let Some(duration) = bag.get(DURATION_KEY) {
            let blocks = match duration {
                FieldValue::Number(n) => Some(*n as u32),
                other => self.duration_blocks(&other.joined_text()),
            };
            if blocks.is_none() {
                debug!("unparseable duration {duration:?}");
            }
            bag.insert(
                DURATION_KEY,
                blocks.map_or(FieldValue::Null, |b| FieldValue::Number(f64::from(b))),
            );
        }

        if let Some(placement) = bag.remove(PLACEMENT_KEY) {
            let start = self.start_block(&placement.joined_text());
            bag.insert(
                START_BLOCK_KEY,
                start.map_or(FieldValue::Null, |b| FieldValue::Number(f64::from(b))),
            );
        }
        Ok(bag)
    }
}
