use tracing::debug;

use super::stages::calendar::{DURATION_KEY, START_BLOCK_KEY};
use super::stages::exam::{ASSESSMENT_KEY, EXAM_KEY};
use super::stages::scalar::{CREDIT_KEY, STUDY_LEVEL_KEY};
use super::stages::schedule::SCHEDULE_GROUP_KEY;
use super::stages::text::{LANGUAGE_KEY, TITLE_KEY};
use super::stages::workload::WORKLOAD_KEY;
use super::stages::CONTENT_SECTIONS;
use crate::common::text::collapse_whitespace;
use crate::error::StageError;
use crate::types::{
    Coordinator, CourseLanguage, CourseRecord, Exam, ExamDetails, FieldMap, FieldValue,
    RawFieldBag, Schedule, ScheduleType, Segment, SegmentType, StudyLevel, Workload,
};

const COURSE_CODE_KEY: &str = "course code";
const FACULTY_KEY: &str = "contracting faculty";
const DEPARTMENTS_KEY: &str = "contracting departments";
const STUDY_BOARD_KEY: &str = "study board";
const COORDINATORS_KEY: &str = "course coordinators";
const LECTURERS_KEY: &str = "lecturers";
const CAPACITY_KEY: &str = "course capacity";
const ENGLISH_TITLE_KEY: &str = "english title";
const URL_KEY: &str = "url";
const LAST_MODIFIED_KEY: &str = "last-modified";
const TOTAL_WORKLOAD: &str = "total";

/// Builds the canonical record from a fully normalized bag.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinalAssembler;

impl FinalAssembler {
    pub const NAME: &'static str = "assemble";

    pub fn assemble(&self, bag: RawFieldBag) -> Result<CourseRecord, StageError> {
        let [content, outcome, qualifications] = CONTENT_SECTIONS.map(|key| {
            bag.get(key).map(segments)
        });

        let raw_description = [&content, &outcome, &qualifications]
            .into_iter()
            .flatten()
            .flatten()
            .map(|s| s.string.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let record = CourseRecord {
            course_id: required_text(&bag, COURSE_CODE_KEY)?,
            title: required_text(&bag, TITLE_KEY)?,
            english_title: optional_text(&bag, ENGLISH_TITLE_KEY),
            course_language: bag
                .get(LANGUAGE_KEY)
                .and_then(FieldValue::as_text)
                .and_then(|code| match code {
                    "da" => Some(CourseLanguage::Da),
                    "en" => Some(CourseLanguage::En),
                    _ => None,
                }),
            credits: bag
                .get(CREDIT_KEY)
                .and_then(FieldValue::as_number)
                .ok_or(StageError::MissingField(CREDIT_KEY))?,
            study_level: match bag.get(STUDY_LEVEL_KEY).and_then(FieldValue::as_text) {
                Some("Master") => StudyLevel::Master,
                Some("Bachelor") => StudyLevel::Bachelor,
                _ => return Err(StageError::MissingField(STUDY_LEVEL_KEY)),
            },
            contracting_faculty: required_text(&bag, FACULTY_KEY)?,
            contracting_departments: texts(&bag, DEPARTMENTS_KEY),
            study_board: texts(&bag, STUDY_BOARD_KEY),
            coordinators: coordinators(&bag),
            lecturers: texts(&bag, LECTURERS_KEY),
            course_capacity: optional_text(&bag, CAPACITY_KEY),
            duration: positive(&bag, DURATION_KEY).map(|n| n as u32),
            start_block: positive(&bag, START_BLOCK_KEY).map(|n| n as u8),
            schedules: texts(&bag, SCHEDULE_GROUP_KEY)
                .iter()
                .filter_map(|letter| ScheduleType::from_letter(letter))
                .map(|schedule_type| Schedule { schedule_type })
                .collect(),
            exams: exams(&bag)?,
            exam_details: exam_details(&bag),
            workloads: workloads(&bag),
            description: encode("description", &content.unwrap_or_default())?,
            learning_outcome: outcome
                .map(|s| encode("learning_outcome", &s))
                .transpose()?,
            recommended_qualifications: qualifications
                .map(|s| encode("recommended_qualifications", &s))
                .transpose()?,
            raw_description,
            url: required_text(&bag, URL_KEY)?,
            last_modified: optional_text(&bag, LAST_MODIFIED_KEY),
        };
        debug!(course_id = %record.course_id, "assembled record");
        Ok(record)
    }
}

fn required_text(bag: &RawFieldBag, key: &'static str) -> Result<String, StageError> {
    optional_text(bag, key).ok_or(StageError::MissingField(key))
}

fn optional_text(bag: &RawFieldBag, key: &str) -> Option<String> {
    bag.get(key)
        .and_then(FieldValue::first_text)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn texts(bag: &RawFieldBag, key: &str) -> Vec<String> {
    bag.get(key).map(FieldValue::texts).unwrap_or_default()
}

/// Zero counts as absent, as it does in the source data.
fn positive(bag: &RawFieldBag, key: &str) -> Option<f64> {
    bag.get(key)
        .and_then(FieldValue::as_number)
        .filter(|n| *n > 0.0)
}

fn coordinators(bag: &RawFieldBag) -> Vec<Coordinator> {
    let Some(FieldValue::List(people)) = bag.get(COORDINATORS_KEY) else {
        return Vec::new();
    };
    people
        .iter()
        .filter_map(FieldValue::as_map)
        .filter_map(|person| {
            Some(Coordinator {
                full_name: person.get("full_name")?.as_text()?.to_string(),
                email: person
                    .get("email")
                    .and_then(FieldValue::as_text)
                    .map(str::to_string),
            })
        })
        .collect()
}

fn exams(bag: &RawFieldBag) -> Result<Vec<Exam>, StageError> {
    let exam = bag
        .get(EXAM_KEY)
        .and_then(FieldValue::as_map)
        .ok_or(StageError::MissingField(EXAM_KEY))?;
    let Some(FieldValue::List(entries)) = exam.get(ASSESSMENT_KEY) else {
        return Ok(Vec::new());
    };
    Ok(entries
        .iter()
        .filter_map(FieldValue::as_map)
        .filter_map(|entry| {
            Some(Exam {
                exam_type: entry.get("exam_type")?.as_text()?.to_string(),
                minutes: entry
                    .get("minutes")
                    .and_then(FieldValue::as_number)
                    .filter(|m| *m > 0.0)
                    .map(|m| m as u32),
            })
        })
        .collect())
}

/// Exam table entries other than the assessment types, by their translated names.
fn exam_details(bag: &RawFieldBag) -> ExamDetails {
    let Some(exam) = bag.get(EXAM_KEY).and_then(FieldValue::as_map) else {
        return ExamDetails::default();
    };
    let field = |key: &str| detail(exam, key);
    ExamDetails {
        assessment_details: field("Type of assessment details"),
        aid: field("Aid"),
        marking_scale: field("Marking scale"),
        censorship_form: field("Censorship form"),
        re_exam: field("Re-exam"),
        exam_period: field("Exam period"),
        registration_requirements: field("Exam registration requirements"),
    }
}

fn detail(exam: &FieldMap, key: &str) -> Option<String> {
    exam.get(key)
        .map(|value| collapse_whitespace(&value.joined_text()))
        .filter(|text| !text.is_empty())
}

fn workloads(bag: &RawFieldBag) -> Vec<Workload> {
    let Some(FieldValue::Map(hours)) = bag.get(WORKLOAD_KEY) else {
        return Vec::new();
    };
    hours
        .iter()
        .filter(|(category, _)| *category != TOTAL_WORKLOAD)
        .filter_map(|(category, value)| {
            Some(Workload {
                workload_type: category.to_string(),
                hours: value.as_number()?,
            })
        })
        .collect()
}

/// Flattens a section into depth-tagged segments. Top-level entries are
/// paragraphs; every nested list goes one level deeper.
pub fn segments(section: &FieldValue) -> Vec<Segment> {
    let mut out = Vec::new();
    match section {
        FieldValue::List(items) => items.iter().for_each(|item| flatten(item, 0, &mut out)),
        other => flatten(other, 0, &mut out),
    }
    out
}

fn flatten(value: &FieldValue, depth: usize, out: &mut Vec<Segment>) {
    let kind = SegmentType::from_depth(depth);
    match value {
        FieldValue::Null => {}
        FieldValue::Text(s) => out.push(Segment {
            kind,
            string: s.clone(),
        }),
        FieldValue::Number(n) => out.push(Segment {
            kind,
            string: n.to_string(),
        }),
        FieldValue::Multi(items) => out.extend(items.iter().map(|s| Segment {
            kind,
            string: s.clone(),
        })),
        FieldValue::List(items) => items.iter().for_each(|item| flatten(item, depth + 1, out)),
        FieldValue::Map(map) => out.extend(map.iter().map(|(term, definition)| Segment {
            kind,
            string: format!("{term}: {}", definition.joined_text()),
        })),
    }
}

fn encode(field: &'static str, segments: &[Segment]) -> Result<String, StageError> {
    serde_json::to_string(segments).map_err(|e| StageError::Encoding {
        field,
        reason: e.to_string(),
    })
}
