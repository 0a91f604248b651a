//! Extraction of the raw field bag from a course page.
//!
//! Two sub-extractions run over the same document: the metadata panel
//! (`panel`) and the main content region (`content`). Their bags are merged
//! with body fields taking precedence.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ExtractError;
use crate::types::{FieldMap, FieldValue, RawFieldBag};

pub mod content;
pub mod deobfuscate;
pub mod panel;

pub use deobfuscate::deobfuscate;

/// Turns page markup into a raw field bag.
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, url: &str, markup: &str) -> Result<RawFieldBag, ExtractError>;
}

/// Extractor for the course-catalogue page template family.
#[derive(Debug, Default, Clone)]
pub struct HtmlFieldExtractor;

impl HtmlFieldExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for HtmlFieldExtractor {
    fn extract(&self, url: &str, markup: &str) -> Result<RawFieldBag, ExtractError> {
        debug!("extracting {url} ({} bytes)", markup.len());
        let document = Html::parse_document(markup);
        let panel = panel::extract_panel(&document, url)?;
        let body = content::extract_body(&document)?;
        Ok(merge(panel, body))
    }
}

/// Later bags win on key collisions.
pub fn merge(first: FieldMap, second: FieldMap) -> FieldMap {
    first.into_iter().chain(second).collect()
}

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static DIV: Lazy<Selector> = Lazy::new(|| selector("div"));

/// Trimmed concatenation of every text node below `element`.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Value of a definition-list cell. A cell holding block-level children keeps
/// one string per child instead of collapsing them into a single text.
pub(crate) fn cell_value(cell: ElementRef<'_>) -> FieldValue {
    let blocks: Vec<String> = cell.select(&DIV).map(element_text).collect();
    if blocks.is_empty() {
        FieldValue::Text(element_text(cell))
    } else {
        FieldValue::Multi(blocks)
    }
}

/// Trimmed, non-empty text nodes that are direct children of `element`.
pub(crate) fn own_text_nodes(element: ElementRef<'_>) -> impl Iterator<Item = String> + '_ {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'a>(doc: &'a Html, css: &'static str) -> ElementRef<'a> {
        doc.select(&selector(css)).next().unwrap()
    }

    #[test]
    fn test_cell_value_keeps_block_children_apart() {
        let doc = Html::parse_fragment(
            "<dl><dd><div>Skriftlig prøve, 4 timer</div><div>Mundtlig prøve, 20 minutter</div></dd></dl>",
        );
        assert_eq!(
            cell_value(first(&doc, "dd")),
            FieldValue::Multi(vec![
                "Skriftlig prøve, 4 timer".to_string(),
                "Mundtlig prøve, 20 minutter".to_string(),
            ])
        );
    }

    #[test]
    fn test_cell_value_plain_text() {
        let doc = Html::parse_fragment("<dl><dd>  7,5 ECTS </dd></dl>");
        assert_eq!(cell_value(first(&doc, "dd")), FieldValue::text("7,5 ECTS"));
    }

    #[test]
    fn test_merge_prefers_second_bag() {
        let mut a = FieldMap::new();
        a.insert("title", FieldValue::text("panel"));
        a.insert("credit", FieldValue::text("7,5"));
        let mut b = FieldMap::new();
        b.insert("title", FieldValue::text("body"));

        let merged = merge(a, b);
        assert_eq!(merged.get("title"), Some(&FieldValue::text("body")));
        assert_eq!(merged.len(), 2);
    }
}
