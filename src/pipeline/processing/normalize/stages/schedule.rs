use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::common::text::fix_string;
use crate::error::StageError;
use crate::pipeline::processing::normalize::tagging::{PosTag, Tagger, WordSet};
use crate::pipeline::processing::normalize::Stage;
use crate::types::{FieldValue, RawFieldBag};

pub const SCHEDULE_KEY: &str = "schedule";
pub const SCHEDULE_GROUP_KEY: &str = "schedule_group";

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern is valid")
}

static GROUP_BCD: Lazy<Regex> = Lazy::new(|| pattern(r"\b([BCD])\d?\b"));
static GROUP_A_DIGIT: Lazy<Regex> = Lazy::new(|| pattern(r"\b(A)\d\b"));
static GROUP_A_PUNCT: Lazy<Regex> = Lazy::new(|| pattern(r"\b(A)[.,!?]"));
static GROUP_A_WORD: Lazy<Regex> = Lazy::new(|| pattern(r"\b(A)\s([a-z]+)"));
static GROUP_A_BARE: Lazy<Regex> = Lazy::new(|| pattern(r"\b(A)\b"));

/// Pulls the schedule-group letters out of the free-text schedule cell.
///
/// Every pass removes what it matched before the next one runs. An `A`
/// followed by a lower-case word may just be the English article, so it only
/// counts when the word reads as an annotation: an adposition, a conjunction,
/// or a noun that is not ordinary English.
pub struct ScheduleGroupClassifier {
    tagger: Arc<dyn Tagger>,
    words: Arc<dyn WordSet>,
}

impl ScheduleGroupClassifier {
    pub fn new(tagger: Arc<dyn Tagger>, words: Arc<dyn WordSet>) -> Self {
        Self { tagger, words }
    }

    pub fn groups(&self, text: &str) -> Vec<String> {
        let mut text = fix_string(text);
        let mut letters = BTreeSet::new();

        for pass in [&*GROUP_BCD, &*GROUP_A_DIGIT, &*GROUP_A_PUNCT] {
            letters.extend(pass.captures_iter(&text).map(|c| c[1].to_string()));
            text = pass.replace_all(&text, "").into_owned();
        }

        for caps in GROUP_A_WORD.captures_iter(&text) {
            if self.annotates(&caps[2]) {
                letters.insert(caps[1].to_string());
            } else {
                debug!("rejecting {:?} as prose", &caps[0]);
            }
        }
        text = GROUP_A_WORD.replace_all(&text, "").into_owned();

        letters.extend(GROUP_A_BARE.captures_iter(&text).map(|c| c[1].to_string()));
        letters.into_iter().collect()
    }

    fn annotates(&self, word: &str) -> bool {
        match self.tagger.tag(word) {
            PosTag::Adposition | PosTag::Conjunction => true,
            PosTag::Noun => !self.words.contains(word),
            _ => false,
        }
    }
}

impl Stage for ScheduleGroupClassifier {
    fn name(&self) -> &'static str {
        "ScheduleGroupClassifier"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let Some(schedule) = bag.remove(SCHEDULE_KEY) else {
            return Ok(bag);
        };
        let groups = schedule
            .first_text()
            .map(|text| self.groups(text))
            .unwrap_or_default();
        bag.insert(
            SCHEDULE_GROUP_KEY,
            FieldValue::List(groups.into_iter().map(FieldValue::Text).collect()),
        );
        Ok(bag)
    }
}
