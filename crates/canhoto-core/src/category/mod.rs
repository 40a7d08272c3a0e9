//! Expense categories and the activity-based categorizer.

mod rules;

pub use rules::{CATEGORY_RULES, Categorization, Categorizer, CategoryRule};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Expense category.
///
/// Declaration order is the fixed enumeration order used to break ties in
/// the report.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Category {
    #[serde(rename = "Alimentação")]
    Alimentacao,
    #[serde(rename = "Transporte")]
    Transporte,
    #[serde(rename = "Hospedagem")]
    Hospedagem,
    #[serde(rename = "Saúde")]
    Saude,
    #[serde(rename = "Educação")]
    Educacao,
    #[serde(rename = "Tecnologia")]
    Tecnologia,
    #[serde(rename = "Vestuário")]
    Vestuario,
    #[serde(rename = "Serviços")]
    Servicos,
    #[serde(rename = "Entretenimento")]
    Entretenimento,
    #[serde(rename = "Material de Escritório")]
    MaterialDeEscritorio,
    #[default]
    #[serde(rename = "Outros")]
    Outros,
}

impl Category {
    /// All categories in enumeration order.
    pub const ALL: [Category; 11] = [
        Category::Alimentacao,
        Category::Transporte,
        Category::Hospedagem,
        Category::Saude,
        Category::Educacao,
        Category::Tecnologia,
        Category::Vestuario,
        Category::Servicos,
        Category::Entretenimento,
        Category::MaterialDeEscritorio,
        Category::Outros,
    ];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alimentacao => "Alimentação",
            Self::Transporte => "Transporte",
            Self::Hospedagem => "Hospedagem",
            Self::Saude => "Saúde",
            Self::Educacao => "Educação",
            Self::Tecnologia => "Tecnologia",
            Self::Vestuario => "Vestuário",
            Self::Servicos => "Serviços",
            Self::Entretenimento => "Entretenimento",
            Self::MaterialDeEscritorio => "Material de Escritório",
            Self::Outros => "Outros",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so width and alignment flags apply to the label
        f.pad(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}
