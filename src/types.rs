use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One value in the raw field bag produced by extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    /// A cell that held several block-level children, one string per child.
    Multi(Vec<String>),
    List(Vec<FieldValue>),
    Map(FieldMap),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            FieldValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The first string held by this value, looking through lists and multi-value cells.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Multi(items) => items.first().map(String::as_str),
            FieldValue::List(items) => items.iter().find_map(FieldValue::first_text),
            _ => None,
        }
    }

    /// All strings held by this value in document order, one level deep.
    pub fn texts(&self) -> Vec<String> {
        match self {
            FieldValue::Text(s) => vec![s.clone()],
            FieldValue::Multi(items) => items.clone(),
            FieldValue::List(items) => items.iter().flat_map(FieldValue::texts).collect(),
            _ => Vec::new(),
        }
    }

    /// Every string joined by a single space.
    pub fn joined_text(&self) -> String {
        self.texts().join(" ")
    }
}

/// Insertion-ordered string-keyed mapping. Serializes as a JSON object whose
/// keys keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(Vec<(String, FieldValue)>);

impl FieldMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces; a replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct FieldMapVisitor;

impl<'de> Visitor<'de> for FieldMapVisitor {
    type Value = FieldMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string-keyed map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
        let mut map = FieldMap::new();
        while let Some((k, v)) = access.next_entry::<String, FieldValue>()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// The schema-loose mapping threaded through the normalization stages.
pub type RawFieldBag = FieldMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLanguage {
    Da,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudyLevel {
    Bachelor,
    Master,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScheduleType {
    A,
    B,
    C,
    D,
}

impl ScheduleType {
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(ScheduleType::A),
            "B" => Some(ScheduleType::B),
            "C" => Some(ScheduleType::C),
            "D" => Some(ScheduleType::D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinator {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_type: ScheduleType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub exam_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub workload_type: String,
    pub hours: f64,
}

/// Exam metadata carried next to the assessment types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marking_scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub censorship_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re_exam: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_requirements: Option<String>,
}

/// Depth tag of a description segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    P,
    Li,
    LiTwo,
    LiThree,
    LiFour,
}

impl SegmentType {
    /// Depths beyond four are clamped to the deepest tag.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => SegmentType::P,
            1 => SegmentType::Li,
            2 => SegmentType::LiTwo,
            3 => SegmentType::LiThree,
            _ => SegmentType::LiFour,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: SegmentType,
    pub string: String,
}

/// Canonical output record for one course page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_language: Option<CourseLanguage>,
    pub credits: f64,
    pub study_level: StudyLevel,
    pub contracting_faculty: String,
    pub contracting_departments: Vec<String>,
    pub study_board: Vec<String>,
    pub coordinators: Vec<Coordinator>,
    #[serde(default)]
    pub lecturers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_capacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_block: Option<u8>,
    pub schedules: Vec<Schedule>,
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub exam_details: ExamDetails,
    pub workloads: Vec<Workload>,
    /// JSON-encoded `[{type, string}]` segments of the course content.
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_qualifications: Option<String>,
    pub raw_description: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}
