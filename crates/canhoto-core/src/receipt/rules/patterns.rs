//! Common regex patterns for Brazilian receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Digit runs joined by single separators, e.g. 12.345.678/0001-95
    pub static ref DIGIT_RUN: Regex = Regex::new(
        r"\d(?:[./\-]?\d)*"
    ).unwrap();

    // Brazilian amounts: 1.234,56 or 1234,56 or 45,90
    pub static ref BRL_AMOUNT: Regex = Regex::new(
        r"(\d{1,3}(?:\.\d{3})+|\d+),(\d{2})\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_run_keeps_separators() {
        let m = DIGIT_RUN.find("CNPJ: 12.345.678/0001-95").unwrap();
        assert_eq!(m.as_str(), "12.345.678/0001-95");
    }

    #[test]
    fn test_brl_amount_shapes() {
        let caps = BRL_AMOUNT.captures("TOTAL R$ 1.234,56").unwrap();
        assert_eq!(&caps[1], "1.234");
        assert_eq!(&caps[2], "56");

        assert!(BRL_AMOUNT.is_match("45,90"));
        assert!(!BRL_AMOUNT.is_match("45,901"));
        assert!(!BRL_AMOUNT.is_match("45.90"));
    }
}
