use crate::common::text::{collapse_whitespace, fix_string};
use crate::error::StageError;
use crate::pipeline::processing::normalize::Stage;
use crate::types::{FieldMap, FieldValue, RawFieldBag};

use super::CONTENT_SECTIONS;

pub const TITLE_KEY: &str = "primary title";
pub const LANGUAGE_KEY: &str = "language";

/// Anchored body blocks that stand in for a missing course-item section.
const SECTION_FALLBACKS: [(&str, &str); 2] = [
    ("Content", "course content"),
    ("Recommended Academic Qualifications", "recommended prerequisites"),
];

/// Width of the course-code prefix in front of the page title.
const CODE_PREFIX_CHARS: usize = 11;

/// Drops the course-code prefix from the title.
pub struct TitleFixer;

impl Stage for TitleFixer {
    fn name(&self) -> &'static str {
        "TitleFixer"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        if let Some(raw) = bag.get(TITLE_KEY).and_then(FieldValue::as_text) {
            let title: String = raw.chars().skip(CODE_PREFIX_CHARS).collect();
            bag.insert(TITLE_KEY, FieldValue::Text(collapse_whitespace(&title)));
        }
        Ok(bag)
    }
}

/// Reduces the language description to `da` or `en`.
pub struct LanguageNormalizer;

impl Stage for LanguageNormalizer {
    fn name(&self) -> &'static str {
        "LanguageNormalizer"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        let Some(language) = bag
            .get(LANGUAGE_KEY)
            .and_then(FieldValue::first_text)
            .map(str::to_lowercase)
        else {
            return Ok(bag);
        };

        if language.starts_with("da") {
            bag.insert(LANGUAGE_KEY, FieldValue::text("da"));
        } else if language.starts_with("en") {
            bag.insert(LANGUAGE_KEY, FieldValue::text("en"));
        } else {
            tracing::debug!("unrecognised language {language:?}");
        }
        Ok(bag)
    }
}

/// Strips empty entries from the free-text sections and fixes their whitespace.
pub struct ContentTidier;

impl Stage for ContentTidier {
    fn name(&self) -> &'static str {
        "ContentTidier"
    }

    fn apply(&self, mut bag: RawFieldBag) -> Result<RawFieldBag, StageError> {
        for (section, block_key) in SECTION_FALLBACKS {
            let block = bag.remove(block_key);
            if bag.contains_key(section) {
                continue;
            }
            let Some(text) = block
                .as_ref()
                .and_then(FieldValue::as_text)
                .map(collapse_whitespace)
                .filter(|t| !t.is_empty())
            else {
                continue;
            };
            tracing::debug!("{section} section missing, reading {block_key:?}");
            bag.insert(section, FieldValue::List(vec![FieldValue::Text(text)]));
        }

        for key in CONTENT_SECTIONS {
            if let Some(section) = bag.remove(key) {
                bag.insert(key, tidy(section).unwrap_or(FieldValue::List(Vec::new())));
            }
        }
        Ok(bag)
    }
}

/// `None` means the value is empty and should be dropped from its parent.
fn tidy(value: FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Null => None,
        FieldValue::Text(s) => {
            let s = fix_string(&s);
            (!s.is_empty()).then_some(FieldValue::Text(s))
        }
        FieldValue::Multi(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|s| fix_string(s))
                .filter(|s| !s.is_empty())
                .collect();
            (!items.is_empty()).then_some(FieldValue::Multi(items))
        }
        FieldValue::List(items) => {
            let items: Vec<FieldValue> = items.into_iter().filter_map(tidy).collect();
            (!items.is_empty()).then_some(FieldValue::List(items))
        }
        FieldValue::Map(map) => {
            let map: FieldMap = map
                .into_iter()
                .filter_map(|(k, v)| tidy(v).map(|v| (fix_string(&k), v)))
                .collect();
            (!map.is_empty()).then_some(FieldValue::Map(map))
        }
        number @ FieldValue::Number(_) => Some(number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prefix_removed() {
        let mut bag = RawFieldBag::new();
        bag.insert(TITLE_KEY, FieldValue::text("NDAB15009U  Diskret\n  matematik"));
        let bag = TitleFixer.apply(bag).unwrap();
        assert_eq!(bag.get(TITLE_KEY), Some(&FieldValue::text("Diskret matematik")));
    }

    #[test]
    fn test_language_prefixes() {
        for (raw, expected) in [("Dansk", "da"), ("English - Partially in Danish", "en"), ("Engelsk", "en")] {
            let mut bag = RawFieldBag::new();
            bag.insert(LANGUAGE_KEY, FieldValue::text(raw));
            let bag = LanguageNormalizer.apply(bag).unwrap();
            assert_eq!(bag.get(LANGUAGE_KEY), Some(&FieldValue::text(expected)));
        }

        let mut bag = RawFieldBag::new();
        bag.insert(LANGUAGE_KEY, FieldValue::text("Tysk"));
        let bag = LanguageNormalizer.apply(bag).unwrap();
        assert_eq!(bag.get(LANGUAGE_KEY), Some(&FieldValue::text("Tysk")));
    }

    #[test]
    fn test_content_tidied_recursively() {
        let mut bag = RawFieldBag::new();
        bag.insert(
            "Content",
            FieldValue::List(vec![
                FieldValue::text("Graphs\u{a0}and trees\n"),
                FieldValue::Null,
                FieldValue::text("   "),
                FieldValue::List(vec![FieldValue::text(""), FieldValue::text(" Induction ")]),
                FieldValue::List(vec![FieldValue::Null]),
            ]),
        );
        let bag = ContentTidier.apply(bag).unwrap();
        assert_eq!(
            bag.get("Content"),
            Some(&FieldValue::List(vec![
                FieldValue::text("Graphs and trees"),
                FieldValue::List(vec![FieldValue::text("Induction")]),
            ]))
        );
    }

    #[test]
    fn test_anchored_blocks_fill_missing_sections() {
        let mut bag = RawFieldBag::new();
        bag.insert("Content", FieldValue::List(vec![FieldValue::text("Graphs")]));
        bag.insert("course content", FieldValue::text("Graphs and more"));
        bag.insert(
            "recommended prerequisites",
            FieldValue::text("Linear\n   algebra"),
        );

        let bag = ContentTidier.apply(bag).unwrap();
        assert!(!bag.contains_key("course content"));
        assert!(!bag.contains_key("recommended prerequisites"));
        assert_eq!(
            bag.get("Content"),
            Some(&FieldValue::List(vec![FieldValue::text("Graphs")]))
        );
        assert_eq!(
            bag.get("Recommended Academic Qualifications"),
            Some(&FieldValue::List(vec![FieldValue::text("Linear algebra")]))
        );
    }

    #[test]
    fn test_empty_anchored_block_is_ignored() {
        let mut bag = RawFieldBag::new();
        bag.insert("recommended prerequisites", FieldValue::Null);
        bag.insert("course content", FieldValue::text("  "));
        let bag = ContentTidier.apply(bag).unwrap();
        assert!(bag.is_empty());
    }
}
