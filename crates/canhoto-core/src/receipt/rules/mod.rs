//! Rule-based field extractors for Brazilian card receipts.

pub mod amounts;
pub mod cnpj;
pub mod patterns;

pub use amounts::{
    AmountCandidate, AmountExtractor, AmountSource, extract_amount, extract_amount_candidates,
    format_brl_amount, parse_brl_amount,
};
pub use cnpj::{
    CnpjExtractor, extract_cnpj, extract_cnpj_matches, format_cnpj, validate_cnpj,
};

/// Trait for field extractors working on recognized lines.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from the lines.
    fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<Self::Output>;

    /// Extract all occurrences of the field, in line order.
    fn extract_all<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Self::Output>;
}

/// A located match: the value plus where it was read.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    pub value: T,
    /// Line index in the document.
    pub line: usize,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, line: usize, source: impl Into<String>) -> Self {
        Self {
            value,
            line,
            source: source.into(),
        }
    }
}
