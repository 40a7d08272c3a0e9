//! Amount extraction for Brazilian receipts.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FieldExtractor;
use super::patterns::BRL_AMOUNT;

/// How the receipt amount was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSource {
    /// Found on a line with a total keyword.
    Labeled,
    /// Largest amount on the receipt.
    Largest,
}

/// A monetary value found in the recognized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountCandidate {
    /// Parsed value.
    pub value: Decimal,
    /// Line index in the document.
    pub line: usize,
    /// Whether the line carries a total keyword.
    pub labeled: bool,
    /// Text that was matched.
    pub source: String,
}

impl AmountCandidate {
    pub fn source_kind(&self) -> AmountSource {
        if self.labeled {
            AmountSource::Labeled
        } else {
            AmountSource::Largest
        }
    }
}

/// Amount field extractor.
pub struct AmountExtractor {
    /// Lowercased total keywords.
    keywords: Vec<String>,
    min: Decimal,
    max: Decimal,
}

impl AmountExtractor {
    /// Create an extractor with the `total` / `valor` keywords and the
    /// `0,01..=999.999,99` range.
    pub fn new() -> Self {
        Self {
            keywords: vec!["total".to_string(), "valor".to_string()],
            min: Decimal::new(1, 2),
            max: Decimal::new(99_999_999, 2),
        }
    }

    /// Replace the total keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Only accept amounts inside `min..=max`.
    pub fn with_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    fn is_total_line(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Pick the receipt amount among the candidates.
    ///
    /// The first candidate on a keyword line wins. Otherwise the largest
    /// candidate, the earliest one on ties. Taking the first candidate is the
    /// last resort but any non-empty list already has a largest element.
    pub fn select(candidates: &[AmountCandidate]) -> Option<&AmountCandidate> {
        if let Some(labeled) = candidates.iter().find(|c| c.labeled) {
            return Some(labeled);
        }

        candidates
            .iter()
            .reduce(|best, c| if c.value > best.value { c } else { best })
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = AmountCandidate;

    fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<Self::Output> {
        let candidates = self.extract_all(lines);
        Self::select(&candidates).cloned()
    }

    fn extract_all<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let labeled = self.is_total_line(line);

            for caps in BRL_AMOUNT.captures_iter(line) {
                let Some(full_match) = caps.get(0) else {
                    continue;
                };

                // Tail of a malformed number such as 12.34,56
                let preceding = line[..full_match.start()].chars().next_back();
                if matches!(preceding, Some(c) if c.is_ascii_digit() || c == '.' || c == ',') {
                    continue;
                }

                let Some(value) = parse_brl_amount(full_match.as_str()) else {
                    continue;
                };
                if value < self.min || value > self.max {
                    continue;
                }

                results.push(AmountCandidate {
                    value,
                    line: index,
                    labeled,
                    source: full_match.as_str().to_string(),
                });
            }
        }

        results
    }
}

/// Extract the receipt amount using the default keywords and range.
pub fn extract_amount<S: AsRef<str>>(lines: &[S]) -> Option<Decimal> {
    AmountExtractor::new().extract(lines).map(|c| c.value)
}

/// Extract every amount candidate using the default keywords and range.
pub fn extract_amount_candidates<S: AsRef<str>>(lines: &[S]) -> Vec<AmountCandidate> {
    AmountExtractor::new().extract_all(lines)
}

/// Parse a Brazilian-formatted amount (e.g., "1.234,56" or "45,90").
///
/// `.` is the thousands separator and `,` the decimal separator. A currency
/// prefix and spaces are ignored.
pub fn parse_brl_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.matches(',').count() > 1 {
        return None;
    }

    let normalized = cleaned.replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

/// Format amount in Brazilian style (1.234,56).
pub fn format_brl_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, s) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let Some((integer_part, decimal_part)) = s.split_once('.') else {
        return format!("{}{}", sign, s);
    };

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{}{},{}", sign, formatted, decimal_part)
}
