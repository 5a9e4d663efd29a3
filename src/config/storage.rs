//! Storage path configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Filesystem layout for persisted state.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path of the single JSON document holding every user's profile
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Directory of per-category knowledge chunk files (`<category>.json`)
    #[serde(default = "default_bank_dir")]
    pub bank_dir: PathBuf,

    /// Directory scanned for ingestible source documents, one sub-folder
    /// per category
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.data_file.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("storage data_file"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            bank_dir: default_bank_dir(),
            source_dir: default_source_dir(),
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("study_data.json")
}

fn default_bank_dir() -> PathBuf {
    PathBuf::from("knowledge")
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("sources")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(StorageConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_data_file_fails() {
        let config = StorageConfig {
            data_file: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
