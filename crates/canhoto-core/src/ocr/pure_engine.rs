//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::GenericImageView;
use tracing::{debug, info};

use super::TextRecognizer;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

/// One recognized region with its horizontal start and vertical extent.
#[derive(Debug, Clone)]
struct Region {
    text: String,
    left: f64,
    top: f64,
    bottom: f64,
}

impl PureOcrEngine {
    /// Load the detection model, recognition model and dictionary named in
    /// `config` from its model directory.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.is_file() {
                return Err(OcrError::ModelLoad(format!(
                    "missing model file {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }

    /// Load the default model file names from `model_dir`.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let config = OcrConfig {
            model_dir: model_dir.to_path_buf(),
            ..OcrConfig::default()
        };
        Self::from_config(&config)
    }

    fn open_image(path: &Path) -> Result<image::DynamicImage, OcrError> {
        image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => OcrError::from_io(path, io),
            other => OcrError::InvalidImage(format!("{}: {}", path.display(), other)),
        })
    }
}

impl TextRecognizer for PureOcrEngine {
    fn recognize(&self, path: &Path) -> Result<Vec<String>, OcrError> {
        let start = Instant::now();
        let image = Self::open_image(path)?;
        let (width, height) = image.dimensions();

        debug!("Processing {}: {}x{}", path.display(), width, height);

        let results = self
            .engine
            .run_from_image(&image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let regions: Vec<Region> = results
            .iter()
            .map(|r| {
                let (left, top, bottom) = bounds(&r.bounding_box);
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                Region {
                    text,
                    left,
                    top,
                    bottom,
                }
            })
            .collect();

        let lines = group_rows(regions);

        info!(
            "OCR complete for {}: {} lines in {}ms",
            path.display(),
            lines.len(),
            start.elapsed().as_millis()
        );

        Ok(lines)
    }
}

/// Leftmost x, topmost y and bottommost y of the polygon's exterior.
fn bounds(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64, f64) {
    polygon.exterior().coords().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(left, top, bottom), c| (left.min(c.x), top.min(c.y), bottom.max(c.y)),
    )
}

/// Merge regions into text lines in reading order.
///
/// A region joins the current row when its vertical center falls inside the
/// row's extent. Each row is read left to right and joined with single spaces.
fn group_rows(mut regions: Vec<Region>) -> Vec<String> {
    regions.sort_by(|a, b| a.top.total_cmp(&b.top));

    let mut rows: Vec<(f64, f64, Vec<Region>)> = Vec::new();
    for region in regions {
        let center = (region.top + region.bottom) / 2.0;
        match rows.last_mut() {
            Some((top, bottom, members)) if center >= *top && center <= *bottom => {
                *top = top.min(region.top);
                *bottom = bottom.max(region.bottom);
                members.push(region);
            }
            _ => rows.push((region.top, region.bottom, vec![region])),
        }
    }

    rows.into_iter()
        .filter_map(|(_, _, mut members)| {
            members.sort_by(|a, b| a.left.total_cmp(&b.left));
            let line = members
                .iter()
                .map(|r| r.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (!line.is_empty()).then_some(line)
        })
        .collect()
}
