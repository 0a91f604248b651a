use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::{cell_value, element_text, own_text_nodes, selector};
use crate::error::ExtractError;
use crate::types::{FieldMap, FieldValue};

static MAIN_CONTENT: Lazy<Selector> = Lazy::new(|| selector(r#"div[class*="main-content"]"#));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static ENGLISH_TITLE: Lazy<Selector> = Lazy::new(|| selector("div#course-language"));
static COURSE_CONTENT: Lazy<Selector> = Lazy::new(|| selector("div#course-content"));
static SKILLS: Lazy<Selector> = Lazy::new(|| selector("div#course-skills"));
static PREREQUISITES: Lazy<Selector> = Lazy::new(|| selector("div#course-prerequisites"));
static EXAM_TABLE: Lazy<Selector> = Lazy::new(|| selector("div#course-exams1 dl"));
static COURSE_LOAD_ITEMS: Lazy<Selector> = Lazy::new(|| selector("div#course-load li"));
static COURSE_ITEM: Lazy<Selector> = Lazy::new(|| selector("div.course-item"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static DIV: Lazy<Selector> = Lazy::new(|| selector("div"));
static DT: Lazy<Selector> = Lazy::new(|| selector("dt"));
static DD: Lazy<Selector> = Lazy::new(|| selector("dd"));

pub fn extract_body(document: &Html) -> Result<FieldMap, ExtractError> {
    let main = document
        .select(&MAIN_CONTENT)
        .next()
        .ok_or(ExtractError::MissingAnchor("main content region"))?;
    let title = main
        .select(&H1)
        .next()
        .ok_or(ExtractError::MissingAnchor("title"))?;

    let mut fields = FieldMap::new();
    fields.insert("primary title", FieldValue::Text(element_text(title)));
    fields.insert("english title", text_of(main, &ENGLISH_TITLE));
    fields.insert("course content", text_of(main, &COURSE_CONTENT));

    let prerequisites = match text_of(main, &SKILLS) {
        FieldValue::Null => text_of(main, &PREREQUISITES),
        found => found,
    };
    fields.insert("recommended prerequisites", prerequisites);
    fields.insert(
        "exams",
        main.select(&EXAM_TABLE)
            .next()
            .map(|dl| FieldValue::Map(definition_list(dl)))
            .unwrap_or(FieldValue::Null),
    );
    fields.insert("course load", course_load(main));

    for item in main.select(&COURSE_ITEM) {
        if let Some((key, value)) = course_item(item) {
            fields.insert(key, value);
        }
    }

    Ok(fields)
}

fn text_of(scope: ElementRef<'_>, selector: &Selector) -> FieldValue {
    scope
        .select(selector)
        .next()
        .map(|el| FieldValue::Text(element_text(el)))
        .unwrap_or(FieldValue::Null)
}

/// The course-load block lists a header pair followed by alternating
/// category and hours cells.
fn course_load(scope: ElementRef<'_>) -> FieldValue {
    let cells: Vec<FieldValue> = scope
        .select(&COURSE_LOAD_ITEMS)
        .map(|li| FieldValue::Text(element_text(li)))
        .collect();
    if cells.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::List(cells)
    }
}

/// One collapsible section: its anchor text names it, the first inner `div`
/// holds the content.
fn course_item(item: ElementRef<'_>) -> Option<(String, FieldValue)> {
    let Some(anchor) = item.select(&ANCHOR).next() else {
        warn!("course item without a heading anchor, skipping");
        return None;
    };
    let key = element_text(anchor);
    let Some(body) = item.select(&DIV).next() else {
        return Some((key, FieldValue::List(Vec::new())));
    };

    let mut values: Vec<FieldValue> = body
        .children()
        .filter_map(ElementRef::wrap)
        .map(typed_element)
        .collect();
    values.extend(own_text_nodes(body).map(FieldValue::Text));

    Some((key, FieldValue::List(values)))
}

fn typed_element(element: ElementRef<'_>) -> FieldValue {
    match element.value().name() {
        "p" | "h3" | "h4" | "h5" | "h6" | "a" | "div" => FieldValue::Text(element_text(element)),
        "ul" | "ol" => list_items(element),
        "dl" => FieldValue::Map(definition_list(element)),
        other => {
            warn!("unrecognised content element <{other}>");
            FieldValue::Null
        }
    }
}

/// Each item contributes its own text, followed by any nested list one level deeper.
fn list_items(list: ElementRef<'_>) -> FieldValue {
    let mut values = Vec::new();
    for item in list
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "li")
    {
        let mut text = String::new();
        let mut nested = Vec::new();
        for child in item.children() {
            if let Some(t) = child.value().as_text() {
                text.push_str(t);
            } else if let Some(el) = ElementRef::wrap(child) {
                match el.value().name() {
                    "ul" | "ol" => nested.push(list_items(el)),
                    _ => text.extend(el.text()),
                }
            }
        }
        values.push(FieldValue::Text(text.trim().to_string()));
        values.extend(nested);
    }
    FieldValue::List(values)
}

fn definition_list(dl: ElementRef<'_>) -> FieldMap {
    dl.select(&DT)
        .zip(dl.select(&DD))
        .map(|(term, cell)| (element_text(term), cell_value(cell)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r##"
        <div class="col-xs-12 main-content">
          <h1>NDAB15009U  Diskret matematik</h1>
          <div id="course-language">Discrete Mathematics</div>
          <div id="course-prerequisites">Linear algebra</div>
          <div id="course-load"><ul>
            <li>Forelæsninger</li><li>28</li>
            <li>I alt</li><li>206</li>
          </ul></div>
          <div class="course-item">
            <a href="#">Kursusindhold</a>
            <div>
              <p>Grafer og kombinatorik.</p>
              <ul>
                <li>Induktion
                  <ul><li>Stærk induktion</li></ul>
                </li>
                <li>Rekursion</li>
              </ul>
              <table><tr><td>x</td></tr></table>
              Afsluttende bemærkning
            </div>
          </div>
          <div class="course-item">
            <a href="#">Eksamen</a>
            <div>
              <dl>
                <dt>Prøveform</dt>
                <dd><div>Skriftlig prøve, 4 timer</div><div>Mundtlig prøve, 20 min</div></dd>
                <dt>Censurform</dt><dd>Intern censur</dd>
              </dl>
            </div>
          </div>
        </div>"##;

    fn body() -> FieldMap {
        extract_body(&Html::parse_document(BODY)).unwrap()
    }

    #[test]
    fn test_anchored_fields() {
        let fields = body();
        assert_eq!(
            fields.get("primary title"),
            Some(&FieldValue::text("NDAB15009U  Diskret matematik"))
        );
        assert_eq!(fields.get("english title"), Some(&FieldValue::text("Discrete Mathematics")));
        assert_eq!(fields.get("course content"), Some(&FieldValue::Null));
        assert_eq!(
            fields.get("recommended prerequisites"),
            Some(&FieldValue::text("Linear algebra"))
        );

        let Some(FieldValue::List(load)) = fields.get("course load") else {
            panic!("course load missing");
        };
        assert_eq!(load.len(), 4);
        assert_eq!(load[3], FieldValue::text("206"));
    }

    #[test]
    fn test_course_item_keeps_structure() {
        let fields = body();
        let Some(FieldValue::List(content)) = fields.get("Kursusindhold") else {
            panic!("content section missing");
        };
        assert_eq!(
            content,
            &vec![
                FieldValue::text("Grafer og kombinatorik."),
                FieldValue::List(vec![
                    FieldValue::text("Induktion"),
                    FieldValue::List(vec![FieldValue::text("Stærk induktion")]),
                    FieldValue::text("Rekursion"),
                ]),
                FieldValue::Null,
                FieldValue::text("Afsluttende bemærkning"),
            ]
        );
    }

    #[test]
    fn test_exam_section_keeps_multiple_assessments() {
        let fields = body();
        let Some(FieldValue::List(exam)) = fields.get("Eksamen") else {
            panic!("exam section missing");
        };
        let table = exam[0].as_map().unwrap();
        assert_eq!(
            table.get("Prøveform"),
            Some(&FieldValue::Multi(vec![
                "Skriftlig prøve, 4 timer".into(),
                "Mundtlig prøve, 20 min".into(),
            ]))
        );
    }

    #[test]
    fn test_missing_title_is_fatal() {
        let doc = Html::parse_document(r#"<div class="main-content"><p>x</p></div>"#);
        assert_eq!(extract_body(&doc), Err(ExtractError::MissingAnchor("title")));
    }
}
