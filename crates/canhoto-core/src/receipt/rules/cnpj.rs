//! CNPJ (Brazilian legal-entity tax identifier) extraction and validation.

use tracing::debug;

use super::patterns::DIGIT_RUN;
use super::{ExtractionMatch, FieldExtractor};
use crate::models::receipt::Cnpj;

/// CNPJ field extractor.
///
/// Takes the first run of exactly 14 digits, separators ignored. Check digits
/// are only verified when validation is switched on.
pub struct CnpjExtractor {
    validate: bool,
}

impl CnpjExtractor {
    /// Create a new CNPJ extractor without check-digit validation.
    pub fn new() -> Self {
        Self { validate: false }
    }

    /// Set whether to skip candidates with wrong check digits.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Default for CnpjExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CnpjExtractor {
    type Output = ExtractionMatch<Cnpj>;

    fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<Self::Output> {
        self.extract_all(lines).into_iter().next()
    }

    fn extract_all<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            for run in DIGIT_RUN.find_iter(line) {
                let Some(cnpj) = Cnpj::parse(run.as_str()) else {
                    continue;
                };

                if self.validate && !cnpj.has_valid_check_digits() {
                    debug!("Skipping CNPJ {} with invalid check digits", cnpj);
                    continue;
                }

                results.push(ExtractionMatch::new(cnpj, index, run.as_str()));
            }
        }

        results
    }
}

/// Extract the first CNPJ from text.
pub fn extract_cnpj(text: &str) -> Option<Cnpj> {
    let lines: Vec<&str> = text.lines().collect();
    CnpjExtractor::new().extract(&lines).map(|m| m.value)
}

/// Every 14-digit run in text, in line order, with the line it was read on.
pub fn extract_cnpj_matches(text: &str) -> Vec<ExtractionMatch<Cnpj>> {
    let lines: Vec<&str> = text.lines().collect();
    CnpjExtractor::new().extract_all(&lines)
}

/// Validate a CNPJ using its two check digits.
///
/// Weights for the first digit: 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2; the second
/// digit uses 6 followed by the same sequence.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let digits: Vec<u32> = cnpj
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 14 {
        return false;
    }

    // All-equal sequences pass the arithmetic but are never issued
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let weights = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
        let offset = weights.len() - len;
        let sum: u32 = digits
            .iter()
            .take(len)
            .zip(weights[offset..].iter())
            .map(|(d, w)| d * w)
            .sum();
        match sum % 11 {
            0 | 1 => 0,
            r => 11 - r,
        }
    };

    check(12) == digits[12] && check(13) == digits[13]
}

/// Format CNPJ as XX.XXX.XXX/XXXX-XX.
pub fn format_cnpj(cnpj: &str) -> String {
    let digits: String = cnpj.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 14 {
        return cnpj.to_string();
    }

    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_cnpj_valid() {
        assert!(validate_cnpj("11222333000181"));
        assert!(validate_cnpj("11.222.333/0001-81"));
        assert!(validate_cnpj("12.345.678/0001-95"));
    }

    #[test]
    fn test_validate_cnpj_invalid() {
        assert!(!validate_cnpj("11222333000182")); // Wrong check digit
        assert!(!validate_cnpj("11111111111111")); // Repeated digit
        assert!(!validate_cnpj("1122233300018")); // Too short
    }

    #[test]
    fn test_extract_cnpj_ignores_separators() {
        let lines = ["LOJA X", "CNPJ 12.345.678/0001-95", "TOTAL R$ 45,90"];
        let found = CnpjExtractor::new().extract(&lines).unwrap();

        assert_eq!(found.value.as_str(), "12345678000195");
        assert_eq!(found.line, 1);
        assert_eq!(found.source, "12.345.678/0001-95");
    }

    #[test]
    fn test_first_run_in_line_order_wins() {
        let lines = [
            "18/10/2026 14:35",
            "99887766000100",
            "CNPJ: 11.222.333/0001-81",
        ];
        let found = CnpjExtractor::new().extract(&lines).unwrap();
        assert_eq!(found.value.as_str(), "99887766000100");
        assert_eq!(found.line, 1);
    }

    #[test]
    fn test_malformed_identifier_is_accepted_without_validation() {
        let lines = ["CNPJ 11.222.333/0001-82"];
        assert!(CnpjExtractor::new().extract(&lines).is_some());

        let validating = CnpjExtractor::new().with_validation(true);
        assert!(validating.extract(&lines).is_none());
    }

    #[test]
    fn test_longer_runs_are_rejected() {
        // 16-digit card number, 8-digit date
        let lines = ["CARTAO 5234.5678.9012.3456", "DATA 18/10/2026"];
        assert!(CnpjExtractor::new().extract(&lines).is_none());
    }

    #[test]
    fn test_extract_cnpj_matches() {
        let text = "MATRIZ 11.222.333/0001-81\nFILIAL 12.345.678/0001-95";
        let matches = extract_cnpj_matches(text);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].value.as_str(), "12345678000195");
        assert_eq!(matches[1].line, 1);
        assert_eq!(matches[1].source, "12.345.678/0001-95");
    }

    #[test]
    fn test_extract_cnpj_from_text() {
        let text = "POSTO BOA VIAGEM\nCNPJ:11222333000181\nVALOR 120,00";
        assert_eq!(
            extract_cnpj(text).map(|c| c.to_string()),
            Some("11222333000181".to_string())
        );
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_cnpj("123"), "123");
    }
}
