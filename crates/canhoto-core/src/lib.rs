//! Core library for Brazilian card receipt expense reports.
//!
//! This crate provides:
//! - Text recognition of receipt images (ONNX models or sidecar text)
//! - Receipt field extraction (CNPJ, amount paid)
//! - Company lookup by CNPJ (BrasilAPI)
//! - Activity-based expense categorization
//! - Per-category aggregation and the proportional report

pub mod error;
pub mod models;
pub mod ocr;
pub mod receipt;
pub mod lookup;
pub mod category;
pub mod aggregate;
pub mod report;
pub mod batch;

pub use error::{CanhotoError, LookupError, OcrError, Result};
pub use models::config::CanhotoConfig;
pub use models::receipt::{Cnpj, CompanyInfo, ExpenseRecord, RawDocument, RecordIssue};
pub use ocr::{SidecarText, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use receipt::{ExtractedFields, ReceiptParser};
pub use lookup::{BrasilApiGateway, EnrichmentGateway, NoLookup};
pub use category::{Category, Categorizer};
pub use aggregate::{Aggregator, CategoryTotals};
pub use report::{Report, ReportRenderer, ReportRow};
pub use batch::{
    BatchObserver, BatchOutcome, BatchProcessor, DocumentFailure, DocumentResult, FailureStage,
};
