//! Configuration structures for the receipt pipeline.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CanhotoError, Result};

/// Default width, in characters, of the longest report bar.
pub const MAX_BAR_WIDTH: usize = 30;

/// Main configuration for the canhoto pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanhotoConfig {
    /// Text recognition configuration.
    pub ocr: OcrConfig,

    /// Company registry lookup configuration.
    pub lookup: LookupConfig,

    /// Receipt field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Report configuration.
    pub report: ReportConfig,

    /// Batch run configuration.
    pub batch: BatchConfig,
}

/// Which text recognizer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// ONNX detection + recognition models.
    #[default]
    Onnx,
    /// Text already recognized elsewhere, stored next to each image.
    Sidecar,
}

/// Text recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognizer backend.
    pub backend: OcrBackend,

    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` markers in recognized text.
    pub keep_unk: bool,

    /// Extension of the sidecar text files.
    pub sidecar_extension: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Onnx,
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            sidecar_extension: "txt".to_string(),
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

/// Company registry lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Query the registry at all.
    pub enabled: bool,

    /// Base URL; the CNPJ is appended as the last path segment.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://brasilapi.com.br/api/cnpj/v1".to_string(),
            timeout_secs: 10,
            user_agent: format!("canhoto/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Receipt field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Words marking the line that carries the amount paid.
    pub total_keywords: Vec<String>,

    /// Skip CNPJ candidates whose check digits do not match.
    pub validate_cnpj: bool,

    /// Smallest plausible amount.
    pub min_amount: Decimal,

    /// Largest plausible amount.
    pub max_amount: Decimal,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            total_keywords: vec!["total".to_string(), "valor".to_string()],
            validate_cnpj: false,
            min_amount: Decimal::new(1, 2),
            max_amount: Decimal::new(99_999_999, 2),
        }
    }
}

/// Report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Report file written after each run.
    pub output_path: PathBuf,

    /// Width of the bar for a 100% category.
    pub bar_width: usize,

    /// List every receipt after the category breakdown.
    pub include_details: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("relatorio_fiscal.txt"),
            bar_width: MAX_BAR_WIDTH,
            include_details: true,
        }
    }
}

/// Batch run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory scanned for receipt images.
    pub input_dir: PathBuf,

    /// Stop starting new receipts after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("canhotos"),
            timeout_secs: None,
        }
    }
}

impl CanhotoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CanhotoError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CanhotoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check settings that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.report.bar_width == 0 {
            return Err(CanhotoError::Config(
                "report.bar_width must be at least 1".to_string(),
            ));
        }

        if self.extraction.min_amount.is_sign_negative()
            || self.extraction.min_amount > self.extraction.max_amount
        {
            return Err(CanhotoError::Config(format!(
                "invalid amount range {}..{}",
                self.extraction.min_amount, self.extraction.max_amount
            )));
        }

        if self.extraction.total_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(CanhotoError::Config(
                "extraction.total_keywords contains an empty keyword".to_string(),
            ));
        }

        if self.lookup.enabled {
            reqwest::Url::parse(&self.lookup.base_url).map_err(|e| {
                CanhotoError::Config(format!(
                    "invalid lookup.base_url {}: {}",
                    self.lookup.base_url, e
                ))
            })?;
            if self.lookup.timeout_secs == 0 {
                return Err(CanhotoError::Config(
                    "lookup.timeout_secs must be at least 1".to_string(),
                ));
            }
        }

        if self.ocr.backend == OcrBackend::Sidecar && self.ocr.sidecar_extension.is_empty() {
            return Err(CanhotoError::Config(
                "ocr.sidecar_extension must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
