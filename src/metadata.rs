use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleMetadataError {
    #[error("project name must not be empty")]
    EmptyProjectName,
    #[error("cannot read metadata file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid metadata file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Project-level settings consumed by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleMetadata {
    pub project_name: String,
    /// Every task without dependencies starts at midnight of this date.
    pub project_start_date: NaiveDate,
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_start_date: NaiveDate::from_ymd_opt(2023, 10, 30)
                .expect("default project start is a valid date"),
        }
    }
}

impl ScheduleMetadata {
    /// Load metadata from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleMetadataError> {
        let file = File::open(path)?;
        let metadata: Self = serde_json::from_reader(BufReader::new(file))?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn validate(&self) -> Result<(), ScheduleMetadataError> {
        if self.project_name.trim().is_empty() {
            return Err(ScheduleMetadataError::EmptyProjectName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "project_start_date": "2024-01-08" }}"#).unwrap();

        let metadata = ScheduleMetadata::from_json_file(file.path()).unwrap();
        assert_eq!(metadata.project_name, "New Project");
        assert_eq!(
            metadata.project_start_date,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
    }

    #[test]
    fn blank_project_name_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "project_name": "  " }}"#).unwrap();

        assert!(matches!(
            ScheduleMetadata::from_json_file(file.path()),
            Err(ScheduleMetadataError::EmptyProjectName)
        ));
    }
}
