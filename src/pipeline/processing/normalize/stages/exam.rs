use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::common::text::{fix_string, snake_case};
use crate::error::StageError;
use crate::pipeline::processing::normalize::Stage;
use crate::types::{FieldMap, FieldValue, RawFieldBag};
use crate::vocabulary::VocabularyTables;

pub const EXAM_KEY: &str = "Exam";
pub const ASSESSMENT_KEY: &str = "Type of assessment";
const EXAM_PREFIXES: [&str; 2] = ["Exam", "Eksa"];
/// The anchored exam table, read when no exam section is present.
pub const EXAM_TABLE_KEY: &str = "exams";

/// Renames the single exam section to `Exam` and translates its sub-keys.
pub struct ExamKeyNormalizer {
    vocabulary: Arc<VocabularyTables>,
}

impl ExamKeyNormalizer {
    pub fn new(vocabulary: Arc<VocabularyTables>) -> Self {
        Self { vocabulary }
    }
}

impl Stage for ExamKeyNormalizer {
    fn name(&self) -> &'static str {
        "ExamKeyNormalizer"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let exam_table = bag.remove(EXAM_TABLE_KEY);
        let mut candidates: Vec<String> = bag
            .keys()
            .filter(|k| EXAM_PREFIXES.iter().any(|p| k.starts_with(p)))
            .map(str::to_string)
            .collect();
        if candidates.len() > 1 {
            return Err(StageError::AmbiguousExamKey(candidates));
        }

        let section = match candidates.pop() {
            Some(key) => bag.remove(&key).unwrap_or(FieldValue::Null),
            None => match exam_table {
                Some(table @ FieldValue::Map(_)) => {
                    debug!("no exam section, reading the exam table");
                    table
                }
                _ => return Err(StageError::MissingExamKey),
            },
        };

        // The section body is a list whose first table holds the exam details.
        let table = match &section {
            FieldValue::Map(map) => map,
            FieldValue::List(items) => items
                .iter()
                .find_map(FieldValue::as_map)
                .ok_or(StageError::UnexpectedShape { field: EXAM_KEY })?,
            _ => return Err(StageError::UnexpectedShape { field: EXAM_KEY }),
        };

        let translated: FieldMap = table
            .iter()
            .map(|(k, v)| (self.vocabulary.exam_field(k).to_string(), v.clone()))
            .collect();
        debug!("exam section has {} fields", translated.len());

        bag.insert(EXAM_KEY, FieldValue::Map(translated));
        Ok(bag)
    }
}

/// Splits the assessment cell into typed `{exam_type, minutes}` entries.
pub struct ExamTypeNormalizer {
    vocabulary: Arc<VocabularyTables>,
}

impl ExamTypeNormalizer {
    pub fn new(vocabulary: Arc<VocabularyTables>) -> Self {
        Self { vocabulary }
    }

    fn entry(&self, raw: &str) -> FieldValue {
        let mut parts = raw.split(',');
        let label = parts.next().unwrap_or_default().trim();
        let minutes = parts.next().and_then(|clause| parse_minutes(&fix_string(clause)));
        if minutes.is_none() {
            debug!("no exam duration in {raw:?}");
        }

        let mut entry = FieldMap::new();
        entry.insert(
            "exam_type",
            FieldValue::Text(snake_case(self.vocabulary.exam_type(label))),
        );
        entry.insert(
            "minutes",
            minutes.map_or(FieldValue::Null, |m| FieldValue::Number(f64::from(m))),
        );
        FieldValue::Map(entry)
    }
}

impl Stage for ExamTypeNormalizer {
    fn name(&self) -> &'static str {
        "ExamTypeNormalizer"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let Some(FieldValue::Map(mut exam)) = bag.remove(EXAM_KEY) else {
            return Err(StageError::UnexpectedShape { field: EXAM_KEY });
        };

        let entries = match exam.get(ASSESSMENT_KEY) {
            Some(value) => value.texts().iter().map(|raw| self.entry(raw)).collect(),
            None => {
                debug!("exam section has no assessment type");
                Vec::new()
            }
        };
        exam.insert(ASSESSMENT_KEY, FieldValue::List(entries));

        bag.insert(EXAM_KEY, FieldValue::Map(exam));
        Ok(bag)
    }
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern is valid")
}

static DECIMAL_HOURS: Lazy<Regex> = Lazy::new(|| pattern(r"(\d+\.\d+)"));
static MULTIPLIED_HOURS: Lazy<Regex> = Lazy::new(|| pattern(r"(\d+)\*(\d+)"));
static REPETITIONS: Lazy<Regex> = Lazy::new(|| pattern(r"(\d+) gange (\d+)"));
static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| pattern(r"^(\d+)$"));

const NUMBER_WORDS: [(&str, u64); 10] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// Unit spellings and their length in minutes, tried in this order.
static UNITS: Lazy<Vec<(Regex, Regex, u64)>> = Lazy::new(|| {
    let words = NUMBER_WORDS.map(|(w, _)| w).join("|");
    [
        (r"(min|minutes|minutter|minuts?)\.?", 1),
        (r"(h|hour|timer|time)\.?", 60),
        (r"(d|day|dage)\.?", 24 * 60),
        (r"(w|week|uger)\.?", 7 * 24 * 60),
    ]
    .into_iter()
    .map(|(unit, factor)| {
        (
            pattern(&format!(r"(\d+) ?{unit}")),
            pattern(&format!(r"(?i)({words}) ?{unit}")),
            factor,
        )
    })
    .collect()
});

fn capture_u64(caps: &regex::Captures, group: usize) -> Option<u64> {
    caps.get(group)?.as_str().parse().ok()
}

/// Reads an exam duration clause as minutes. The first matching rule wins:
/// decimal hours, `N*M` hours, `N gange M` minutes, a number or number word
/// with a unit, and finally a bare number of minutes.
pub fn parse_minutes(clause: &str) -> Option<u32> {
    let minutes = if let Some(caps) = DECIMAL_HOURS.captures(clause) {
        let hours: f64 = caps[1].parse().ok()?;
        Some((hours * 60.0).round() as u64)
    } else if let Some(caps) = MULTIPLIED_HOURS.captures(clause) {
        capture_u64(&caps, 1)?
            .checked_mul(capture_u64(&caps, 2)?)?
            .checked_mul(60)
    } else if let Some(caps) = REPETITIONS.captures(clause) {
        capture_u64(&caps, 1)?.checked_mul(capture_u64(&caps, 2)?)
    } else {
        unit_minutes(clause).or_else(|| {
            BARE_NUMBER
                .captures(clause)
                .and_then(|caps| capture_u64(&caps, 1))
        })
    };
    minutes.and_then(|m| u32::try_from(m).ok())
}

fn unit_minutes(clause: &str) -> Option<u64> {
    for (numeric, spelled, factor) in UNITS.iter() {
        if let Some(caps) = numeric.captures(clause) {
            return capture_u64(&caps, 1)?.checked_mul(*factor);
        }
        if let Some(caps) = spelled.captures(clause) {
            let word = caps[1].to_lowercase();
            let value = NUMBER_WORDS.iter().find(|(w, _)| *w == word)?.1;
            return Some(value * factor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Arc<VocabularyTables> {
        Arc::new(VocabularyTables::default())
    }

    fn exam_bag(key: &str) -> RawFieldBag {
        let mut table = FieldMap::new();
        table.insert(
            "Prøveform",
            FieldValue::Multi(vec![
                "Skriftlig prøve, 4 timer".into(),
                "Mundtlig prøve, 20 min".into(),
            ]),
        );
        table.insert("Censurform", FieldValue::text("Intern censur"));
        let mut bag = RawFieldBag::new();
        bag.insert(key, FieldValue::List(vec![FieldValue::Map(table)]));
        bag
    }

    #[test]
    fn test_minutes_examples() {
        assert_eq!(parse_minutes("2 timer"), Some(120));
        assert_eq!(parse_minutes("1.5"), Some(90));
        assert_eq!(parse_minutes("3*2"), Some(360));
        assert_eq!(parse_minutes("2 gange 3"), Some(6));
    }

    #[test]
    fn test_minutes_units_and_words() {
        assert_eq!(parse_minutes("20 min"), Some(20));
        assert_eq!(parse_minutes("30 minutter"), Some(30));
        assert_eq!(parse_minutes("Two hours"), Some(120));
        assert_eq!(parse_minutes("3 dage"), Some(3 * 1440));
        assert_eq!(parse_minutes("1 week"), Some(10080));
        assert_eq!(parse_minutes("45"), Some(45));
        assert_eq!(parse_minutes("under invigilation"), None);
        assert_eq!(parse_minutes(""), None);
    }

    #[test]
    fn test_exam_key_renamed_and_subkeys_translated() {
        let bag = ExamKeyNormalizer::new(vocab()).apply(exam_bag("Eksamen")).unwrap();
        assert!(!bag.contains_key("Eksamen"));
        let exam = bag.get("Exam").and_then(FieldValue::as_map).unwrap();
        let keys: Vec<&str> = exam.keys().collect();
        assert_eq!(keys, vec!["Type of assessment", "Censorship form"]);
    }

    #[test]
    fn test_exam_key_missing_or_ambiguous() {
        let stage = ExamKeyNormalizer::new(vocab());
        assert_eq!(
            stage.apply(RawFieldBag::new()),
            Err(StageError::MissingExamKey)
        );

        let mut bag = exam_bag("Eksamen");
        bag.insert("Exam (re-exam)", FieldValue::Null);
        assert_eq!(
            stage.apply(bag),
            Err(StageError::AmbiguousExamKey(vec![
                "Eksamen".to_string(),
                "Exam (re-exam)".to_string()
            ]))
        );
    }

    #[test]
    fn test_exam_table_stands_in_for_missing_section() {
        let mut table = FieldMap::new();
        table.insert("Prøveform", FieldValue::text("Mundtlig prøve, 30 minutter"));
        let mut bag = RawFieldBag::new();
        bag.insert(EXAM_TABLE_KEY, FieldValue::Map(table));

        let bag = ExamKeyNormalizer::new(vocab()).apply(bag).unwrap();
        assert!(!bag.contains_key(EXAM_TABLE_KEY));
        let exam = bag.get(EXAM_KEY).and_then(FieldValue::as_map).unwrap();
        assert_eq!(
            exam.get(ASSESSMENT_KEY),
            Some(&FieldValue::text("Mundtlig prøve, 30 minutter"))
        );
    }

    #[test]
    fn test_exam_section_wins_over_exam_table() {
        let mut bag = exam_bag("Eksamen");
        bag.insert(EXAM_TABLE_KEY, FieldValue::Map(FieldMap::new()));
        let bag = ExamKeyNormalizer::new(vocab()).apply(bag).unwrap();
        assert!(!bag.contains_key(EXAM_TABLE_KEY));
        let exam = bag.get(EXAM_KEY).and_then(FieldValue::as_map).unwrap();
        assert_eq!(exam.len(), 2);
    }

    #[test]
    fn test_exam_types_split_and_timed() {
        let bag = ExamKeyNormalizer::new(vocab()).apply(exam_bag("Exam")).unwrap();
        let bag = ExamTypeNormalizer::new(vocab()).apply(bag).unwrap();
        let exam = bag.get("Exam").and_then(FieldValue::as_map).unwrap();
        let Some(FieldValue::List(entries)) = exam.get(ASSESSMENT_KEY) else {
            panic!("assessment entries missing");
        };

        let first = entries[0].as_map().unwrap();
        assert_eq!(first.get("exam_type"), Some(&FieldValue::text("written_examination")));
        assert_eq!(first.get("minutes"), Some(&FieldValue::Number(240.0)));
        let second = entries[1].as_map().unwrap();
        assert_eq!(second.get("exam_type"), Some(&FieldValue::text("oral_examination")));
        assert_eq!(second.get("minutes"), Some(&FieldValue::Number(20.0)));
    }

    #[test]
    fn test_untimed_exam_keeps_null_minutes() {
        let mut table = FieldMap::new();
        table.insert(ASSESSMENT_KEY, FieldValue::text("Portfolio"));
        let mut bag = RawFieldBag::new();
        bag.insert(EXAM_KEY, FieldValue::Map(table));

        let bag = ExamTypeNormalizer::new(vocab()).apply(bag).unwrap();
        let exam = bag.get("Exam").and_then(FieldValue::as_map).unwrap();
        let Some(FieldValue::List(entries)) = exam.get(ASSESSMENT_KEY) else {
            panic!("assessment entries missing");
        };
        let entry = entries[0].as_map().unwrap();
        assert_eq!(entry.get("exam_type"), Some(&FieldValue::text("portfolio")));
        assert_eq!(entry.get("minutes"), Some(&FieldValue::Null));
    }
}
