//! Ordered keyword rules mapping an activity description to a category.

use tracing::debug;

use super::Category;

/// Keywords that put an activity description in a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    /// Lowercase keywords, matched as substrings.
    pub keywords: &'static [&'static str],
}

impl CategoryRule {
    /// First keyword contained in an already lowercased description.
    pub fn matching_keyword(&self, lowercase_description: &str) -> Option<&'static str> {
        self.keywords
            .iter()
            .copied()
            .find(|k| lowercase_description.contains(k))
    }
}

/// Rule table, evaluated top to bottom; the first match wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Alimentacao,
        keywords: &[
            "restaurante", "lanchonete", "padaria", "confeitaria", "pizzaria",
            "hamburgueria", "sorveteria", "açaí", "comida", "alimento",
            "bebida", "bar", "pub", "cervejaria", "cafeteria", "café",
            "pastelaria", "doceria", "panificação", "mercearia", "supermercado",
            "hipermercado", "minimercado", "empório", "delicatessen",
        ],
    },
    CategoryRule {
        category: Category::Transporte,
        keywords: &[
            "taxi", "táxi", "uber", "transporte", "combustível", "combustíveis",
            "gasolina", "etanol", "diesel", "posto", "estacionamento", "pedágio",
            "ônibus", "metrô", "trem", "avião", "passagem", "locação de veículos",
            "aluguel de carros", "moto", "bicicleta",
        ],
    },
    CategoryRule {
        category: Category::Hospedagem,
        keywords: &[
            "hotel", "pousada", "hostel", "motel", "resort", "hospedagem",
            "alojamento", "pensão", "apart-hotel", "flat",
        ],
    },
    CategoryRule {
        category: Category::Saude,
        keywords: &[
            "farmácia", "farmacêutic", "drogaria", "medicamento", "hospital",
            "clínica", "consultório", "médico", "dentista", "laboratório", "exame",
            "fisioterapia", "psicologia", "veterinário", "ótica", "óculos",
        ],
    },
    CategoryRule {
        category: Category::Educacao,
        keywords: &[
            "escola", "universidade", "faculdade", "curso", "treinamento",
            "educação", "ensino", "livraria", "papelaria", "material escolar",
            "biblioteca", "seminário", "workshop",
        ],
    },
    CategoryRule {
        category: Category::Tecnologia,
        keywords: &[
            "informática", "computador", "software", "hardware", "eletrônico",
            "celular", "smartphone", "tablet", "notebook", "impressora",
            "internet", "telecomunicações", "telefonia", "dados",
        ],
    },
    CategoryRule {
        category: Category::Vestuario,
        keywords: &[
            "roupa", "vestuário", "calçado", "sapato", "tênis", "sandália",
            "confecção", "moda", "boutique", "loja de roupas", "alfaiataria",
            "sapataria", "acessórios",
        ],
    },
    CategoryRule {
        category: Category::Servicos,
        keywords: &[
            "consultoria", "advocacia", "contabilidade", "auditoria",
            "engenharia", "arquitetura", "design", "publicidade", "marketing",
            "limpeza", "segurança", "manutenção", "reparo", "instalação",
        ],
    },
    CategoryRule {
        category: Category::Entretenimento,
        keywords: &[
            "cinema", "teatro", "show", "evento", "festa", "entretenimento",
            "diversão", "parque", "museu", "exposição", "jogo", "esporte",
            "academia", "ginástica", "clube", "recreação",
        ],
    },
    // "papelaria" is listed but already claimed by Educação above
    CategoryRule {
        category: Category::MaterialDeEscritorio,
        keywords: &[
            "papelaria", "escritório", "material de escritório", "impressão",
            "gráfica", "fotocópia", "encadernação", "papel", "caneta",
            "arquivo", "pasta", "organizador",
        ],
    },
];

/// Outcome of categorizing one description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categorization {
    pub category: Category,
    /// Keyword that decided the category; `None` for the fallback.
    pub keyword: Option<&'static str>,
}

/// Maps activity descriptions to categories with an ordered rule table.
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: &'static [CategoryRule],
}

impl Categorizer {
    /// Categorizer over [`CATEGORY_RULES`].
    pub fn new() -> Self {
        Self {
            rules: CATEGORY_RULES,
        }
    }

    /// Categorizer over a custom rule table.
    pub fn with_rules(rules: &'static [CategoryRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [CategoryRule] {
        self.rules
    }

    /// Category of an activity description, `Outros` when absent or unmatched.
    pub fn categorize(&self, activity: Option<&str>) -> Category {
        self.classify(activity).category
    }

    /// Category plus the keyword that selected it.
    pub fn classify(&self, activity: Option<&str>) -> Categorization {
        let fallback = Categorization {
            category: Category::Outros,
            keyword: None,
        };

        let Some(activity) = activity.filter(|a| !a.trim().is_empty()) else {
            return fallback;
        };

        let lower = activity.to_lowercase();
        for rule in self.rules {
            if let Some(keyword) = rule.matching_keyword(&lower) {
                debug!("'{}' -> {} (keyword '{}')", activity, rule.category, keyword);
                return Categorization {
                    category: rule.category,
                    keyword: Some(keyword),
                };
            }
        }

        debug!("'{}' -> {} (no rule matched)", activity, Category::Outros);
        fallback
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new()
    }
}
