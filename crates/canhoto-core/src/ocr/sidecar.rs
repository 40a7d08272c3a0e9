//! Recognizer reading text stored next to each image.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::TextRecognizer;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Reads `<image stem>.<extension>` as the recognized text of an image.
///
/// Blank lines are dropped and surrounding whitespace is trimmed.
#[derive(Debug, Clone)]
pub struct SidecarText {
    extension: String,
}

impl SidecarText {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.sidecar_extension.clone())
    }

    /// Path of the text file for `image`.
    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        image.with_extension(&self.extension)
    }
}

impl Default for SidecarText {
    fn default() -> Self {
        Self::new("txt")
    }
}

impl TextRecognizer for SidecarText {
    fn recognize(&self, image: &Path) -> Result<Vec<String>, OcrError> {
        let path = self.sidecar_path(image);
        let content = std::fs::read_to_string(&path).map_err(|e| OcrError::from_io(&path, e))?;

        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        debug!("Read {} lines from {}", lines.len(), path.display());

        Ok(lines)
    }
}
