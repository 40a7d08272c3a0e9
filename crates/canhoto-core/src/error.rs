//! Error types for the canhoto-core library.

use thiserror::Error;

/// Main error type for the canhoto library.
#[derive(Error, Debug)]
pub enum CanhotoError {
    /// Text recognition error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Company registry lookup error.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Image processing error.
    #[cfg(feature = "native")]
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error. Fatal: raised before any receipt is processed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CanhotoError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Ocr(err) => err.is_configuration(),
            _ => false,
        }
    }
}

/// Errors reported by a text recognizer.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The image (or its recognized text) exists but may not be read.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The image or its recognized text could not be read.
    #[error("unreadable input: {0}")]
    Unreadable(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

impl OcrError {
    /// Map an I/O error on `subject` to the matching OCR failure.
    pub fn from_io(subject: &std::path::Path, err: std::io::Error) -> Self {
        let message = format!("{}: {}", subject.display(), err);
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied(message),
            _ => Self::Unreadable(message),
        }
    }

    /// Errors that come from the engine setup rather than from one image.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ModelLoad(_))
    }
}

/// Errors reported by a company registry lookup.
#[derive(Error, Debug)]
pub enum LookupError {
    /// The registry answered with an unexpected status.
    #[error("registry answered HTTP {status} for {cnpj}")]
    Status { cnpj: String, status: u16 },

    /// Network or connection failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The registry response could not be decoded.
    #[error("invalid registry response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type for the canhoto library.
pub type Result<T> = std::result::Result<T, CanhotoError>;
