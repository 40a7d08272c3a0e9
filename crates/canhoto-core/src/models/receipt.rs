//! Receipt and expense data models.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::receipt::rules::cnpj::{format_cnpj, validate_cnpj};

/// Recognized text of one receipt image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Image identifier (file name).
    pub id: String,

    /// Recognized lines in reading order.
    pub lines: Vec<String>,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            id: id.into(),
            lines,
        }
    }

    /// True when recognition produced no usable text.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// Full text, lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Brazilian legal-entity tax identifier, always exactly 14 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cnpj(String);

impl Cnpj {
    /// Parse a CNPJ, ignoring `.`, `/`, `-` and whitespace.
    ///
    /// Returns `None` unless exactly 14 digits remain. Check digits are not
    /// verified here; see [`Cnpj::has_valid_check_digits`].
    pub fn parse(s: &str) -> Option<Self> {
        let mut digits = String::with_capacity(14);
        for c in s.chars() {
            match c {
                '0'..='9' => digits.push(c),
                '.' | '/' | '-' => {}
                c if c.is_whitespace() => {}
                _ => return None,
            }
        }

        (digits.len() == 14).then_some(Self(digits))
    }

    /// The 14 digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formatted as `12.345.678/0001-95`.
    pub fn formatted(&self) -> String {
        format_cnpj(&self.0)
    }

    /// Whether the two trailing check digits match the first twelve.
    pub fn has_valid_check_digits(&self) -> bool {
        validate_cnpj(&self.0)
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Cnpj {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cnpj::parse(&value).ok_or_else(|| format!("not a 14-digit CNPJ: {value}"))
    }
}

impl From<Cnpj> for String {
    fn from(cnpj: Cnpj) -> Self {
        cnpj.0
    }
}

/// Company data returned by the registry for a CNPJ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// Legal name (razão social).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,

    /// Trade name (nome fantasia).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,

    /// Main activity description (CNAE description).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_description: Option<String>,

    /// Main activity code (CNAE code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_code: Option<String>,
}

/// Something that went wrong or was missing while processing a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordIssue {
    /// Text recognition failed.
    OcrFailed,
    /// Text recognition returned no text.
    NoText,
    /// No CNPJ found in the text.
    MissingCnpj,
    /// No amount found in the text.
    MissingAmount,
    /// The registry does not know the CNPJ.
    CompanyNotFound,
    /// The registry lookup failed.
    LookupFailed,
}

impl RecordIssue {
    pub fn description(&self) -> &'static str {
        match self {
            Self::OcrFailed => "falha no OCR",
            Self::NoText => "nenhum texto reconhecido",
            Self::MissingCnpj => "CNPJ não encontrado",
            Self::MissingAmount => "valor não encontrado",
            Self::CompanyNotFound => "empresa não encontrada",
            Self::LookupFailed => "falha na consulta do CNPJ",
        }
    }
}

/// One processed receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Image identifier.
    pub document_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<Cnpj>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// Always set, `Outros` when nothing better is known.
    pub category: Category,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<RecordIssue>,
}

impl ExpenseRecord {
    /// Record for a receipt whose text could not be recognized.
    pub fn failed(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            cnpj: None,
            amount: None,
            category: Category::Outros,
            company_name: None,
            activity_description: None,
            issues: vec![RecordIssue::OcrFailed],
        }
    }

    /// No amount: the receipt cannot contribute to the totals.
    pub fn is_incomplete(&self) -> bool {
        self.amount.is_none()
    }

    pub fn has_issue(&self, issue: RecordIssue) -> bool {
        self.issues.contains(&issue)
    }

    /// Company name for display, with a reason when it is unknown.
    pub fn display_company(&self) -> &str {
        if let Some(name) = self.company_name.as_deref() {
            return name;
        }
        if self.has_issue(RecordIssue::OcrFailed) {
            "Erro no processamento"
        } else if self.cnpj.is_none() {
            "CNPJ não encontrado"
        } else if self.has_issue(RecordIssue::LookupFailed) {
            "Não identificada"
        } else if self.has_issue(RecordIssue::CompanyNotFound) {
            "Empresa não encontrada"
        } else {
            "Não consultada"
        }
    }
}
