//! Bilingual lookup tables used by extraction and normalization.
//!
//! Every table can be replaced from a TOML file; tables missing from the file
//! keep their built-in defaults.

use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub type Table = BTreeMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VocabularyTables {
    /// Raw field names (Danish or English, as extracted) to canonical English names.
    pub field_names: Table,
    /// Danish faculty names to English.
    pub faculties: Table,
    /// Exam sub-table keys.
    pub exam_fields: Table,
    /// Workload categories.
    pub workload_categories: Table,
    /// Exam-type labels.
    pub exam_types: Table,
    /// Danish words that appear in placement text.
    pub time_words: Table,
}

fn table(pairs: &[(&str, &str)]) -> Table {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for VocabularyTables {
    fn default() -> Self {
        Self {
            field_names: table(&[
                ("varighed", "duration"),
                ("kursuskapacitet", "course capacity"),
                ("udbydende institutter", "contracting departments"),
                ("contracting department", "contracting departments"),
                ("udbydende institut", "contracting departments"),
                ("studienævn", "study board"),
                ("kursuskode", "course code"),
                ("niveau", "level"),
                ("sprog", "language"),
                ("Formelle krav", "Formal requirements"),
                ("skemagruppe", "schedule"),
                ("undervisere", "lecturers"),
                ("Anbefalede faglige forudsætninger", "Recommended Academic Qualifications"),
                ("Arbejdsbelastning", "Workload"),
                ("Feedbackform", "Feedback form"),
                ("Bemærkninger", "Remarks"),
                ("Kursusindhold", "Content"),
                ("Målbeskrivelser", "Learning Outcome"),
                ("Undervisningsmateriale", "Literature"),
                ("kursusansvarlige", "course coordinators"),
                ("Uddannelse", "Education"),
                ("placering", "placement"),
                ("Undervisningsform", "Teaching and learning methods"),
                ("point", "credit"),
                ("udbydende fakultet", "contracting faculty"),
                ("Tilmelding", "Sign up"),
            ]),
            faculties: table(&[
                ("Det Juridiske Fakultet", "Faculty of Law"),
                ("Det Humanistiske Fakultet", "Faculty of Humanities"),
                ("Det Teologiske Fakultet", "Faculty of Theology"),
                ("Det Sundhedsvidenskabelige Fakultet", "Faculty of Health and Medical Sciences"),
                ("Det Natur- og Biovidenskabelige Fakultet", "Faculty of Science"),
                ("Det Samfundsvidenskabelige Fakultet", "Faculty of Social Sciences"),
            ]),
            exam_fields: table(&[
                ("Reeksamen", "Re-exam"),
                ("Hjælpemidler", "Aid"),
                ("Eksamensperiode", "Exam period"),
                ("Bedømmelsesform", "Marking scale"),
                ("Prøveformsdetaljer", "Type of assessment details"),
                ("Prøveform", "Type of assessment"),
                ("Krav til indstilling til eksamen", "Exam registration requirements"),
                ("Point", "Credit"),
                ("Censurform", "Censorship form"),
            ]),
            workload_categories: table(&[
                ("E-læring", "E-Learning"),
                ("Eksamen", "Exam"),
                ("Laboratorie", "Laboratory"),
                ("Studiegrupper", "Study Groups"),
                ("Teoretiske øvelser", "Theory exercises"),
                ("Feltarbejde", "Field Work"),
                ("Forberedelse (anslået)", "Preparation"),
                ("Eksamensforberedelse", "Exam Preparation"),
                ("Ekskursioner", "Excursions"),
                ("Forelæsninger", "Lectures"),
                ("Praktiske øvelser", "Practical exercises"),
                ("Projektarbejde", "Project work"),
                ("Øvelser", "Exercises"),
                ("Vejledning", "Guidance"),
                ("Holdundervisning", "Class Instruction"),
                ("Praktik", "Practical Training"),
                ("I alt", "Total"),
            ]),
            exam_types: table(&[
                ("Mundtlig prøve", "Oral examination"),
                ("Skriftlig prøve", "Written examination"),
                ("Skriftlig aflevering", "Written assignment"),
                ("Løbende bedømmelse", "Continuous assessment"),
                ("Praktisk skriftlig prøve", "Practical written examination"),
                ("Praktisk mundtlig prøve", "Practical oral examination"),
                ("Løbende bedømmelse med opsyn.", "Continuous assessment"),
                ("Continuous assessment under invigilation", "Continuous assessment"),
                ("Praktisk mundtlig prøve med opsyn.", "Practical oral examination"),
                ("Mundtligt forsvar", "Oral defence"),
            ]),
            time_words: table(&[
                ("blok", "block"),
                ("forår", "spring"),
                ("sommer", "summer"),
                ("efterår", "autumn"),
                ("eller", "or"),
            ]),
        }
    }
}

impl VocabularyTables {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read vocabulary file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn field_name<'a>(&'a self, key: &'a str) -> &'a str {
        lookup(&self.field_names, key)
    }

    /// Unknown faculties pass through unchanged.
    pub fn faculty<'a>(&'a self, name: &'a str) -> &'a str {
        lookup(&self.faculties, name)
    }

    pub fn exam_field<'a>(&'a self, key: &'a str) -> &'a str {
        lookup(&self.exam_fields, key)
    }

    pub fn workload_category<'a>(&'a self, key: &'a str) -> &'a str {
        lookup(&self.workload_categories, key)
    }

    pub fn exam_type<'a>(&'a self, label: &'a str) -> &'a str {
        lookup(&self.exam_types, label)
    }
}

fn lookup<'a>(table: &'a Table, key: &'a str) -> &'a str {
    table.get(key).map(String::as_str).unwrap_or(key)
}
