use crate::constants::SECONDARY_DIR;
use crate::error::Result;
use crate::types::{CourseRecord, RawFieldBag};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Output boundary for parsed courses
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist one canonical record, keyed by its course id
    async fn write_record(&self, record: &CourseRecord) -> Result<()>;

    /// Persist the translated field bag of a course outside the target faculty
    async fn write_secondary(&self, page_name: &str, bag: &RawFieldBag) -> Result<()>;
}

/// Writes one pretty-printed JSON document per course
pub struct JsonDirStorage {
    output_dir: PathBuf,
}

impl JsonDirStorage {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn write_json(&self, dir: &Path, name: &str, body: String) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{name}.json"));
        tokio::fs::write(&path, body).await?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl RecordSink for JsonDirStorage {
    async fn write_record(&self, record: &CourseRecord) -> Result<()> {
        let body = serde_json::to_string_pretty(record)?;
        self.write_json(&self.output_dir, &record.course_id, body).await
    }

    async fn write_secondary(&self, page_name: &str, bag: &RawFieldBag) -> Result<()> {
        let body = serde_json::to_string_pretty(bag)?;
        self.write_json(&self.output_dir.join(SECONDARY_DIR), page_name, body)
            .await
    }
}

/// In-memory sink for development/testing
#[derive(Default)]
pub struct InMemoryStorage {
    records: Mutex<Vec<CourseRecord>>,
    secondary: Mutex<Vec<(String, RawFieldBag)>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CourseRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn secondary(&self) -> Vec<(String, RawFieldBag)> {
        self.secondary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RecordSink for InMemoryStorage {
    async fn write_record(&self, record: &CourseRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn write_secondary(&self, page_name: &str, bag: &RawFieldBag) -> Result<()> {
        self.secondary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((page_name.to_string(), bag.clone()));
        Ok(())
    }
}
