pub mod settings;

use crate::core::prompt_assembler::DEFAULT_MAX_FILE_SIZE;
use crate::core::{normalize_path, ScanFilter};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// The persisted settings record.
///
/// Missing keys mean "not set": no path, no filtering. Unknown keys are
/// ignored and empty path strings read as unset, so the flat
/// `{"prompt_template": "", ...}` layout loads as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default, deserialize_with = "empty_path_as_none")]
    pub prompt_template: Option<PathBuf>,
    #[serde(default, deserialize_with = "empty_path_as_none")]
    pub context_file: Option<PathBuf>,
    #[serde(default, deserialize_with = "empty_path_as_none")]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub excluded_folders: HashSet<String>,
    #[serde(default)]
    pub excluded_extensions: HashSet<String>,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl AppConfig {
    /// Exclusion rules for the next scan.
    pub fn scan_filter(&self) -> ScanFilter {
        ScanFilter::new(&self.excluded_folders, &self.excluded_extensions)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        if self.max_file_size_mb == 0 {
            DEFAULT_MAX_FILE_SIZE
        } else {
            self.max_file_size_mb.saturating_mul(1024 * 1024)
        }
    }

    /// The configured root, with WSL spellings normalized.
    pub fn normalized_root(&self) -> Option<PathBuf> {
        self.root_folder.as_deref().map(normalize_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let excluded_folders = [
            ".git",
            "node_modules",
            "target",
            "__pycache__",
            "venv",
            ".idea",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let excluded_extensions = [".pyc", ".class", ".o", ".obj"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            prompt_template: None,
            context_file: None,
            root_folder: None,
            excluded_folders,
            excluded_extensions,
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

fn default_max_file_size_mb() -> u64 {
    20
}

fn empty_path_as_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from))
}
