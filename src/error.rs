use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;

/// Raised when a page lacks a structural anchor the extractor cannot do without.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("missing required anchor: {0}")]
    MissingAnchor(&'static str),
}

/// Fatal conditions raised by normalization stages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("no exam section found")]
    MissingExamKey,

    #[error("ambiguous exam sections: {0:?}")]
    AmbiguousExamKey(Vec<String>),

    #[error("malformed workload token: {0:?}")]
    MalformedWorkload(String),

    #[error("credit value is not numeric: {0:?}")]
    NonNumericCredit(String),

    #[error("course level undetermined: {0:?}")]
    UndeterminedLevel(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} has unexpected shape")]
    UnexpectedShape { field: &'static str },

    #[error("could not encode {field}: {reason}")]
    Encoding { field: &'static str, reason: String },
}

/// A page that could not be turned into a record.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{source_id} failed in {stage}: {reason}")]
pub struct PipelineFailure {
    pub source_id: String,
    pub stage: String,
    pub reason: String,
}

impl PipelineFailure {
    pub fn new(source_id: impl Into<String>, stage: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            source_id: source_id.into(),
            stage: stage.into(),
            reason: reason.to_string(),
        }
    }
}
