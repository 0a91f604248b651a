use anyhow::Result;
use course_scraper::config::NonTargetMode;
use course_scraper::pages::{DirectoryPageSource, PageSource};
use course_scraper::parser::{FieldExtractor, HtmlFieldExtractor};
use course_scraper::pipeline::processing::normalize::{LexiconTagger, StaticWordSet};
use course_scraper::pipeline::{BatchOptions, NormalizationPipeline, PageOutcome, PipelineOrchestrator};
use course_scraper::storage::{InMemoryStorage, JsonDirStorage, RecordSink};
use course_scraper::types::{
    CourseLanguage, CourseRecord, Exam, RawFieldBag, ScheduleType, Segment, SegmentType, StudyLevel,
    Workload,
};
use course_scraper::vocabulary::VocabularyTables;
use std::sync::Arc;
use tempfile::tempdir;

const SCIENCE_PAGE: &str = include_str!("fixtures/science_course.html");
const URL: &str = "https://kurser.ku.dk/course/ndab15009u";

fn law_page() -> String {
    SCIENCE_PAGE.replace("Det Natur- og Biovidenskabelige Fakultet", "Det Juridiske Fakultet")
}

fn orchestrator() -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        Arc::new(VocabularyTables::default()),
        Arc::new(LexiconTagger::default()),
        Arc::new(StaticWordSet::embedded()),
        "Faculty of Science",
    )
}

fn parse_science_page() -> CourseRecord {
    match orchestrator().process_page("ndab15009u", URL, SCIENCE_PAGE) {
        PageOutcome::Parsed(record) => record,
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn test_target_faculty_page_yields_complete_record() {
    let record = parse_science_page();

    assert_eq!(record.course_id, "NDAB15009U");
    assert_eq!(record.title, "Diskret matematik og algoritmer");
    assert_eq!(record.english_title.as_deref(), Some("Discrete Mathematics and Algorithms"));
    assert_eq!(record.course_language, Some(CourseLanguage::Da));
    assert_eq!(record.credits, 7.5);
    assert_eq!(record.study_level, StudyLevel::Bachelor);
    assert_eq!(record.contracting_faculty, "Faculty of Science");
    assert_eq!(record.contracting_departments, vec!["Datalogisk Institut"]);
    assert_eq!(record.study_board, vec!["Studienævnet for Matematik og Datalogi"]);
    assert_eq!(record.duration, Some(1));
    assert_eq!(record.start_block, Some(2));
    assert_eq!(record.url, URL);
    assert_eq!(record.last_modified.as_deref(), Some("Sidst redigeret: 12-01-2024"));

    assert_eq!(record.coordinators.len(), 1);
    assert_eq!(record.coordinators[0].full_name, "Søren Eilers");
    assert_eq!(record.coordinators[0].email.as_deref(), Some("seilers@math.ku.dk"));
    assert_eq!(record.lecturers, vec!["Mikkel Abrahamsen"]);
    assert_eq!(record.course_capacity.as_deref(), Some("Ingen begrænsning"));
    assert_eq!(
        record.exam_details.aid.as_deref(),
        Some("Alle hjælpemidler tilladt")
    );
    assert_eq!(
        record.exam_details.censorship_form.as_deref(),
        Some("Ingen ekstern censur")
    );

    let schedules: Vec<ScheduleType> = record.schedules.iter().map(|s| s.schedule_type).collect();
    assert_eq!(schedules, vec![ScheduleType::A, ScheduleType::C]);

    assert_eq!(
        record.exams,
        vec![Exam {
            exam_type: "written_examination".to_string(),
            minutes: Some(240),
        }]
    );
    assert_eq!(
        record.workloads,
        vec![Workload {
            workload_type: "lectures".to_string(),
            hours: 28.0,
        }]
    );
}

#[test]
fn test_description_is_depth_tagged_json() {
    let record = parse_science_page();

    let segments: Vec<Segment> = serde_json::from_str(&record.description).unwrap();
    let kinds: Vec<SegmentType> = segments.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![SegmentType::P, SegmentType::Li, SegmentType::LiTwo, SegmentType::Li]
    );
    assert_eq!(segments[2].string, "Korteste veje");

    let outcome: Vec<Segment> =
        serde_json::from_str(record.learning_outcome.as_deref().unwrap()).unwrap();
    assert_eq!(outcome.len(), 2);

    let qualifications: Vec<Segment> =
        serde_json::from_str(record.recommended_qualifications.as_deref().unwrap()).unwrap();
    assert_eq!(qualifications[0].string, "Lineær algebra på gymnasieniveau.");
    assert!(record.raw_description.contains("Kombinatorik"));
}

#[test]
fn test_other_faculty_is_skipped() {
    match orchestrator().process_page("ndab15009u", URL, &law_page()) {
        PageOutcome::Skipped { faculty, .. } => assert_eq!(faculty, "Faculty of Law"),
        other => panic!("expected a skip, got {other:?}"),
    }
}

#[test]
fn test_rerun_on_serialized_bag_is_identical() {
    let orchestrator = orchestrator();
    let bag = HtmlFieldExtractor::new().extract(URL, SCIENCE_PAGE).unwrap();
    let bag = orchestrator.translate_keys(bag);

    let pipeline = NormalizationPipeline::new(
        Arc::new(VocabularyTables::default()),
        Arc::new(LexiconTagger::default()),
        Arc::new(StaticWordSet::embedded()),
    );
    let first = pipeline.run(bag.clone()).unwrap();

    let json = serde_json::to_string(&bag).unwrap();
    let reloaded: RawFieldBag = serde_json::from_str(&json).unwrap();
    let second = pipeline.run(reloaded).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_page_without_panel_fails_in_extract() {
    let markup = "<html><body><div class=\"main-content\"><h1>X</h1></div></body></html>";
    match orchestrator().process_page("broken", URL, markup) {
        PageOutcome::Failed(failure) => {
            assert_eq!(failure.source_id, "broken");
            assert_eq!(failure.stage, "extract");
        }
        other => panic!("expected a failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_writes_only_target_faculty_records() -> Result<()> {
    let pages = tempdir()?;
    let output = tempdir()?;
    std::fs::write(pages.path().join("ndab15009u.html"), SCIENCE_PAGE)?;
    std::fs::write(pages.path().join("jjur11111u.html"), law_page())?;
    std::fs::write(pages.path().join("broken.html"), "<html><body></body></html>")?;

    let source: Arc<dyn PageSource> = Arc::new(DirectoryPageSource::new(
        pages.path(),
        "https://kurser.ku.dk/course",
    ));
    let sink: Arc<dyn RecordSink> = Arc::new(JsonDirStorage::new(output.path()));

    let summary = Arc::new(orchestrator())
        .run_batch(
            source,
            sink,
            BatchOptions {
                workers: 2,
                non_target: NonTargetMode::Drop,
            },
        )
        .await?;

    assert_eq!(summary.parsed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.failures[0].source_id, "broken");

    let written: Vec<_> = std::fs::read_dir(output.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(written, vec!["NDAB15009U.json"]);

    let record: CourseRecord =
        serde_json::from_str(&std::fs::read_to_string(output.path().join("NDAB15009U.json"))?)?;
    assert_eq!(record.credits, 7.5);
    Ok(())
}

#[tokio::test]
async fn test_secondary_mode_keeps_other_faculties() -> Result<()> {
    let pages = tempdir()?;
    std::fs::write(pages.path().join("jjur11111u.html"), law_page())?;

    let source: Arc<dyn PageSource> = Arc::new(DirectoryPageSource::new(
        pages.path(),
        "https://kurser.ku.dk/course",
    ));
    let storage = Arc::new(InMemoryStorage::new());

    let summary = Arc::new(orchestrator())
        .run_batch(
            source,
            storage.clone(),
            BatchOptions {
                workers: 1,
                non_target: NonTargetMode::Secondary,
            },
        )
        .await?;

    assert_eq!(summary.skipped, 1);
    assert!(storage.records().is_empty());
    let secondary = storage.secondary();
    assert_eq!(secondary.len(), 1);
    assert_eq!(secondary[0].0, "jjur11111u");
    assert!(secondary[0].1.contains_key("course code"));
    Ok(())
}
