//! Receipt parser turning recognized lines into CNPJ and amount.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::receipt::{Cnpj, RawDocument};

use super::rules::{AmountExtractor, AmountSource, CnpjExtractor, FieldExtractor};

/// Fields extracted from one receipt. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<Cnpj>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// How the amount was chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_source: Option<AmountSource>,

    /// Extraction warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractedFields {
    /// Both fields were found.
    pub fn is_complete(&self) -> bool {
        self.cnpj.is_some() && self.amount.is_some()
    }
}

/// Heuristic receipt parser.
pub struct ReceiptParser {
    cnpj: CnpjExtractor,
    amounts: AmountExtractor,
}

impl ReceiptParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self {
            cnpj: CnpjExtractor::new(),
            amounts: AmountExtractor::new(),
        }
    }

    /// Create a parser from the extraction configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_cnpj_validation(config.validate_cnpj)
            .with_total_keywords(&config.total_keywords)
            .with_amount_range(config.min_amount, config.max_amount)
    }

    /// Set CNPJ check-digit validation.
    pub fn with_cnpj_validation(mut self, validate: bool) -> Self {
        self.cnpj = self.cnpj.with_validation(validate);
        self
    }

    /// Set the words marking the total line.
    pub fn with_total_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.amounts = self.amounts.with_keywords(keywords);
        self
    }

    /// Set the plausible amount range.
    pub fn with_amount_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.amounts = self.amounts.with_range(min, max);
        self
    }

    /// Parse a receipt. Never fails; missing fields stay `None`.
    pub fn parse(&self, document: &RawDocument) -> ExtractedFields {
        let start = Instant::now();
        let mut fields = ExtractedFields::default();

        if let Some(found) = self.cnpj.extract(&document.lines) {
            debug!(
                "{}: CNPJ {} read as '{}' on line {}",
                document.id, found.value, found.source, found.line
            );
            fields.cnpj = Some(found.value);
        } else {
            fields.warnings.push("Could not extract CNPJ".to_string());
        }

        let candidates = self.amounts.extract_all(&document.lines);
        if let Some(selected) = AmountExtractor::select(&candidates) {
            debug!(
                "{}: amount {} from {:?} on line {} ({} candidates)",
                document.id,
                selected.value,
                selected.source_kind(),
                selected.line,
                candidates.len()
            );
            fields.amount = Some(selected.value);
            fields.amount_source = Some(selected.source_kind());
        } else {
            fields.warnings.push("Could not extract amount".to_string());
        }

        debug!(
            "Parsed {} lines of {} in {}us",
            document.lines.len(),
            document.id,
            start.elapsed().as_micros()
        );

        fields
    }

    /// Parse plain text, one recognized line per text line.
    pub fn parse_text(&self, id: &str, text: &str) -> ExtractedFields {
        let lines = text.lines().map(str::to_string).collect();
        self.parse(&RawDocument::new(id, lines))
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}
