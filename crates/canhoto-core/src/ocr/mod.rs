//! Text recognition collaborators.
//!
//! The pipeline only needs the recognized lines of an image, in reading
//! order. Two recognizers are provided: [`PureOcrEngine`] runs ONNX
//! detection and recognition models, [`SidecarText`] reads text that was
//! recognized elsewhere and stored next to the image.

#[cfg(feature = "native")]
mod pure_engine;
mod sidecar;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;
pub use sidecar::SidecarText;

use std::path::Path;

use crate::error::OcrError;

/// Turns one receipt image into recognized text lines.
pub trait TextRecognizer {
    /// Recognize an image. Lines are returned in reading order.
    fn recognize(&self, image: &Path) -> Result<Vec<String>, OcrError>;
}

/// Image extensions accepted as receipts.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Whether `path` has one of the [`IMAGE_EXTENSIONS`], ignoring case.
pub fn is_receipt_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}
