use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{Result, ScraperError};

/// What happens to a course outside the target faculty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonTargetMode {
    /// Skip it without writing anything.
    #[default]
    Drop,
    /// Write its translated field bag under the secondary directory.
    Secondary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target_faculty: String,
    pub pages_dir: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub base_url: String,
    pub non_target: NonTargetMode,
    /// Optional TOML file overriding the built-in vocabulary tables.
    pub vocabulary: Option<PathBuf>,
    /// Optional newline-separated English word list for schedule disambiguation.
    pub word_list: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_faculty: DEFAULT_TARGET_FACULTY.to_string(),
            pages_dir: PathBuf::from(DEFAULT_PAGES_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            workers: DEFAULT_WORKERS,
            base_url: DEFAULT_BASE_URL.to_string(),
            non_target: NonTargetMode::Drop,
            vocabulary: None,
            word_list: None,
        }
    }
}

impl Config {
    /// Reads `config.toml` from the working directory, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ScraperError::Config("workers must be at least 1".to_string()));
        }
        if self.target_faculty.trim().is_empty() {
            return Err(ScraperError::Config("target_faculty must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.target_faculty, "Faculty of Science");
        assert_eq!(config.workers, 8);
        assert_eq!(config.non_target, NonTargetMode::Drop);
        assert!(config.vocabulary.is_none());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "target_faculty = \"Faculty of Law\"\nworkers = 2\nnon_target = \"secondary\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.target_faculty, "Faculty of Law");
        assert_eq!(config.workers, 2);
        assert_eq!(config.non_target, NonTargetMode::Secondary);
        assert_eq!(config.pages_dir, PathBuf::from("data/pages"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "workers = 0\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ScraperError::Config(_))));
    }
}
