//! Subcommands and the pipeline wiring they share.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::debug;

use canhoto_core::error::{CanhotoError, LookupError, OcrError};
use canhoto_core::models::config::{CanhotoConfig, OcrBackend};
use canhoto_core::models::receipt::{Cnpj, CompanyInfo};
#[cfg(feature = "native")]
use canhoto_core::PureOcrEngine;
use canhoto_core::{BrasilApiGateway, EnrichmentGateway, NoLookup, SidecarText, TextRecognizer};

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("canhoto")
        .join("config.json")
}

/// Load `--config`, else the default file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CanhotoConfig> {
    if let Some(path) = config_path {
        return Ok(CanhotoConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(CanhotoConfig::from_file(&default_path)?)
    } else {
        Ok(CanhotoConfig::default())
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OcrChoice {
    /// ONNX detection and recognition models
    Onnx,
    /// Text files next to each image (`<name>.txt`)
    Sidecar,
}

impl From<OcrChoice> for OcrBackend {
    fn from(choice: OcrChoice) -> Self {
        match choice {
            OcrChoice::Onnx => OcrBackend::Onnx,
            OcrChoice::Sidecar => OcrBackend::Sidecar,
        }
    }
}

/// Recognizer and lookup flags shared by `batch` and `process`.
#[derive(Args)]
pub struct PipelineArgs {
    /// Text recognizer
    #[arg(long, value_enum)]
    ocr: Option<OcrChoice>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip the CNPJ lookup; every receipt falls into "Outros"
    #[arg(long)]
    no_lookup: bool,
}

impl PipelineArgs {
    /// Apply the flags on top of file configuration.
    pub fn apply(&self, config: &mut CanhotoConfig) {
        if let Some(choice) = self.ocr {
            config.ocr.backend = choice.into();
        }
        if let Some(ref model_dir) = self.model_dir {
            config.ocr.model_dir = model_dir.clone();
        }
        if self.no_lookup {
            config.lookup.enabled = false;
        }
    }
}

/// Text recognizer chosen at runtime.
pub enum Recognizer {
    #[cfg(feature = "native")]
    Onnx(PureOcrEngine),
    Sidecar(SidecarText),
}

impl Recognizer {
    pub fn from_config(config: &CanhotoConfig) -> Result<Self, CanhotoError> {
        match config.ocr.backend {
            #[cfg(feature = "native")]
            OcrBackend::Onnx => Ok(Self::Onnx(PureOcrEngine::from_config(&config.ocr)?)),
            #[cfg(not(feature = "native"))]
            OcrBackend::Onnx => Err(CanhotoError::Config(
                "built without ONNX support, use --ocr sidecar".to_string(),
            )),
            OcrBackend::Sidecar => Ok(Self::Sidecar(SidecarText::from_config(&config.ocr))),
        }
    }
}

impl TextRecognizer for Recognizer {
    fn recognize(&self, image: &Path) -> Result<Vec<String>, OcrError> {
        match self {
            #[cfg(feature = "native")]
            Self::Onnx(engine) => engine.recognize(image),
            Self::Sidecar(sidecar) => sidecar.recognize(image),
        }
    }
}

/// Company lookup chosen at runtime.
pub enum Gateway {
    BrasilApi(BrasilApiGateway),
    Disabled(NoLookup),
}

impl Gateway {
    pub fn from_config(config: &CanhotoConfig) -> Result<Self, CanhotoError> {
        if config.lookup.enabled {
            Ok(Self::BrasilApi(BrasilApiGateway::new(&config.lookup)?))
        } else {
            Ok(Self::Disabled(NoLookup))
        }
    }
}

impl EnrichmentGateway for Gateway {
    async fn lookup(&self, cnpj: &Cnpj) -> Result<Option<CompanyInfo>, LookupError> {
        match self {
            Self::BrasilApi(gateway) => gateway.lookup(cnpj).await,
            Self::Disabled(gateway) => gateway.lookup(cnpj).await,
        }
    }

    fn is_enabled(&self) -> bool {
        match self {
            Self::BrasilApi(gateway) => gateway.is_enabled(),
            Self::Disabled(gateway) => gateway.is_enabled(),
        }
    }
}
