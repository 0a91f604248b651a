use crate::common::text::fix_string;
use crate::error::StageError;
use crate::pipeline::processing::normalize::Stage;
use crate::types::{FieldValue, RawFieldBag};

pub const CREDIT_KEY: &str = "credit";
pub const LEVEL_KEY: &str = "level";
pub const STUDY_LEVEL_KEY: &str = "study_level";

/// Parses `"7,5 ECTS"` style credit text into a number.
pub struct CreditParser;

impl Stage for CreditParser {
    fn name(&self) -> &'static str {
        "CreditParser"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let credits = match bag.get(CREDIT_KEY) {
            None => return Err(StageError::MissingField(CREDIT_KEY)),
            Some(FieldValue::Number(n)) if n.is_finite() => *n,
            Some(value) => {
                let raw = value.joined_text();
                parse_credit(&raw).ok_or(StageError::NonNumericCredit(raw))?
            }
        };
        bag.insert(CREDIT_KEY, FieldValue::Number(credits));
        Ok(bag)
    }
}

/// `inf` and `NaN` parse as floats but are not credit values.
pub fn parse_credit(raw: &str) -> Option<f64> {
    fix_string(&raw.to_lowercase())
        .replace(',', ".")
        .replace("ects", "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|credits| credits.is_finite())
}

/// Classifies the level text as `Bachelor` or `Master`.
pub struct LevelClassifier;

impl Stage for LevelClassifier {
    fn name(&self) -> &'static str {
        "LevelClassifier"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let level = bag
            .remove(LEVEL_KEY)
            .ok_or(StageError::MissingField(LEVEL_KEY))?
            .joined_text();
        let lowered = level.to_lowercase();

        let study_level = if lowered.contains("master") || lowered.contains("kandidat") {
            "Master"
        } else if lowered.contains("bachelor") {
            "Bachelor"
        } else {
            return Err(StageError::UndeterminedLevel(level));
        };
        bag.insert(STUDY_LEVEL_KEY, FieldValue::text(study_level));
        Ok(bag)
    }
}
