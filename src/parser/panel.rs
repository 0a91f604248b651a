use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::{cell_value, deobfuscate, element_text, own_text_nodes, selector};
use crate::common::text::fix_string;
use crate::constants::COORDINATOR_LABELS;
use crate::error::ExtractError;
use crate::types::{FieldMap, FieldValue};

static PANEL_BODY: Lazy<Selector> = Lazy::new(|| selector("div.panel-body"));
static H5: Lazy<Selector> = Lazy::new(|| selector("h5"));
static DEFINITION_LIST: Lazy<Selector> = Lazy::new(|| selector("dl.dl-horizontal"));
static DT: Lazy<Selector> = Lazy::new(|| selector("dt"));
static DD: Lazy<Selector> = Lazy::new(|| selector("dd"));
static LI: Lazy<Selector> = Lazy::new(|| selector("li"));
static OBFUSCATED_SPAN: Lazy<Selector> = Lazy::new(|| selector("span[onclick]"));
static LAST_MODIFIED: Lazy<Selector> = Lazy::new(|| selector("div.last-modified"));

/// The panel with the most subsection headers; the first one wins a tie.
fn select_panel(document: &Html) -> Option<ElementRef<'_>> {
    let mut best: Option<(usize, ElementRef<'_>)> = None;
    for panel in document.select(&PANEL_BODY) {
        let headers = panel.select(&H5).count();
        if best.map_or(true, |(count, _)| headers > count) {
            best = Some((headers, panel));
        }
    }
    best.map(|(_, panel)| panel)
}

pub fn extract_panel(document: &Html, url: &str) -> Result<FieldMap, ExtractError> {
    let panel = select_panel(document).ok_or(ExtractError::MissingAnchor("metadata panel"))?;
    let mut fields = FieldMap::new();
    fields.insert("url", FieldValue::text(url));

    if let Some(list) = panel.select(&DEFINITION_LIST).next() {
        for (term, cell) in list.select(&DT).zip(list.select(&DD)) {
            fields.insert(element_text(term).to_lowercase(), cell_value(cell));
        }
    } else {
        debug!("panel has no definition list");
    }

    for header in panel.select(&H5) {
        let key = element_text(header).to_lowercase();
        let items = following_items(header);
        let value = if COORDINATOR_LABELS.contains(&key.as_str()) {
            FieldValue::List(items.into_iter().filter_map(coordinator).collect())
        } else {
            FieldValue::List(
                items
                    .into_iter()
                    .map(|item| FieldValue::Text(element_text(item)))
                    .collect(),
            )
        };
        fields.insert(key, value);
    }

    let last_modified = panel
        .select(&LAST_MODIFIED)
        .next()
        .map(|el| FieldValue::Text(element_text(el)))
        .unwrap_or(FieldValue::Null);
    fields.insert("last-modified", last_modified);

    Ok(fields)
}

/// Items listed under a subsection header: the `li`s of the next sibling list,
/// or the sibling itself when it is not a list.
fn following_items(header: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let Some(sibling) = header.next_siblings().find_map(ElementRef::wrap) else {
        return Vec::new();
    };
    if sibling.value().name() == "ul" {
        sibling.select(&LI).collect()
    } else {
        vec![sibling]
    }
}

/// A coordinator entry: the item's own text is the name, the address hides in
/// the `onclick` handler of a span.
fn coordinator(item: ElementRef<'_>) -> Option<FieldValue> {
    let Some(name) = own_text_nodes(item).next() else {
        warn!("coordinator entry without a name: {:?}", element_text(item));
        return None;
    };

    let email = item
        .select(&OBFUSCATED_SPAN)
        .next()
        .and_then(|span| span.value().attr("onclick"))
        .and_then(|handler| handler.split('\'').nth(1))
        .and_then(deobfuscate);
    if email.is_none() {
        debug!("no address recovered for coordinator {name:?}");
    }

    let mut entry = FieldMap::new();
    entry.insert("full_name", FieldValue::Text(fix_string(&name)));
    entry.insert(
        "email",
        email.map(|e| FieldValue::Text(fix_string(&e))).unwrap_or(FieldValue::Null),
    );
    Some(FieldValue::Map(entry))
}
