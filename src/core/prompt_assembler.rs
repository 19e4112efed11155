//! Builds the final prompt text from its parts.

use super::CoreError;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const NON_UTF8_SENTINEL: &str = "[BINARY OR NON-UTF8 FILE - CONTENT SKIPPED]";

/// Default per-file size limit (20MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Everything needed for one "generate" operation. Built fresh each time.
#[derive(Debug, Clone, Default)]
pub struct PromptRequest {
    pub template: String,
    pub description: String,
    pub context: String,
    pub root_path: PathBuf,
    /// Absolute file paths in selection (pre-order) order.
    pub selected_files: Vec<PathBuf>,
    pub tree_diagram: String,
}

pub struct PromptAssembler {
    max_file_size: u64,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}

impl PromptAssembler {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Concatenates template, description, context, tree and file contents.
    ///
    /// A file that cannot be read contributes sentinel text instead of its
    /// content. The call fails only when a selected file is not under
    /// `root_path`.
    pub fn assemble(&self, request: &PromptRequest) -> Result<String, CoreError> {
        let relative_paths = request
            .selected_files
            .iter()
            .map(|file| {
                file.strip_prefix(&request.root_path)
                    .map(display_relative)
                    .map_err(CoreError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let contents: Vec<String> = request
            .selected_files
            .par_iter()
            .map(|file| self.read_file_content(file))
            .collect();

        let mut prompt = String::new();
        prompt.push_str(&format!("{}\n\n", request.template));
        prompt.push_str(&format!(
            "**Defect Description:**\n{}\n\n",
            request.description
        ));
        prompt.push_str(&format!("**Project Context:**\n{}\n\n", request.context));
        prompt.push_str(&format!(
            "**Project File Structure:**\n{}\n",
            request.tree_diagram
        ));
        prompt.push_str("**File Contents:**\n");

        for (relative, content) in relative_paths.iter().zip(&contents) {
            prompt.push_str(&format!("\n[File: {relative}]\n{content}\n"));
        }

        tracing::info!(
            "Assembled prompt with {} files ({} bytes)",
            relative_paths.len(),
            prompt.len()
        );
        Ok(prompt)
    }

    /// Reads one file, substituting sentinel text for anything unreadable.
    fn read_file_content(&self, file_path: &Path) -> String {
        match fs::metadata(file_path) {
            Ok(metadata) if metadata.len() > self.max_file_size => {
                return format!(
                    "[FILE TOO LARGE: {} bytes - CONTENT SKIPPED]",
                    metadata.len()
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Could not stat {}: {}", file_path.display(), e);
                return format!("[ERROR READING FILE: {e}]");
            }
        }

        match fs::read_to_string(file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                tracing::debug!("{} is not valid UTF-8", file_path.display());
                NON_UTF8_SENTINEL.to_string()
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", file_path.display(), e);
                format!("[ERROR READING FILE: {e}]")
            }
        }
    }
}

/// Relative path with `/` separators regardless of platform.
fn display_relative(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
