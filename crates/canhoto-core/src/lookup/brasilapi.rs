//! BrasilAPI CNPJ endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::EnrichmentGateway;
use crate::error::{CanhotoError, LookupError, Result};
use crate::models::config::LookupConfig;
use crate::models::receipt::{Cnpj, CompanyInfo};

/// Gateway querying `GET {base_url}/{cnpj}`.
#[derive(Debug, Clone)]
pub struct BrasilApiGateway {
    client: reqwest::Client,
    base_url: String,
}

/// Fields of the BrasilAPI response we use.
#[derive(Debug, Deserialize)]
struct CompanyResponse {
    razao_social: Option<String>,
    nome_fantasia: Option<String>,
    cnae_fiscal_descricao: Option<String>,
    /// Numeric in practice; accepted as a string too.
    cnae_fiscal: Option<serde_json::Value>,
}

impl From<CompanyResponse> for CompanyInfo {
    fn from(response: CompanyResponse) -> Self {
        let activity_code = response.cnae_fiscal.and_then(|v| match v {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) => non_blank(Some(s)),
            _ => None,
        });

        Self {
            legal_name: non_blank(response.razao_social),
            trade_name: non_blank(response.nome_fantasia),
            activity_description: non_blank(response.cnae_fiscal_descricao),
            activity_code,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl BrasilApiGateway {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| CanhotoError::Config(format!("lookup.base_url: {}", e)))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CanhotoError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint URL for `cnpj`.
    pub fn url_for(&self, cnpj: &Cnpj) -> String {
        format!("{}/{}", self.base_url, cnpj.as_str())
    }
}

impl EnrichmentGateway for BrasilApiGateway {
    async fn lookup(&self, cnpj: &Cnpj) -> std::result::Result<Option<CompanyInfo>, LookupError> {
        let url = self.url_for(cnpj);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("CNPJ {} not found in registry", cnpj);
            return Ok(None);
        }
        if !status.is_success() {
            warn!("Registry answered {} for {}", status, cnpj);
            return Err(LookupError::Status {
                cnpj: cnpj.to_string(),
                status: status.as_u16(),
            });
        }

        let company: CompanyResponse = response.json().await?;
        Ok(Some(company.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_response_mapping() {
        let json = r#"{
            "cnpj": "12345678000195",
            "razao_social": "LOJA X COMERCIO DE ALIMENTOS LTDA",
            "nome_fantasia": "",
            "cnae_fiscal": 5611201,
            "cnae_fiscal_descricao": "Restaurantes e similares",
            "uf": "SP"
        }"#;

        let response: CompanyResponse = serde_json::from_str(json).unwrap();
        let info = CompanyInfo::from(response);

        assert_eq!(
            info,
            CompanyInfo {
                legal_name: Some("LOJA X COMERCIO DE ALIMENTOS LTDA".to_string()),
                trade_name: None,
                activity_description: Some("Restaurantes e similares".to_string()),
                activity_code: Some("5611201".to_string()),
            }
        );
    }

    #[test]
    fn test_response_with_missing_fields() {
        let response: CompanyResponse =
            serde_json::from_str(r#"{"razao_social": "ACME", "cnae_fiscal": "4711302"}"#).unwrap();
        let info = CompanyInfo::from(response);

        assert_eq!(info.legal_name.as_deref(), Some("ACME"));
        assert_eq!(info.activity_description, None);
        assert_eq!(info.activity_code.as_deref(), Some("4711302"));
    }

    #[test]
    fn test_url_for() {
        let config = LookupConfig {
            base_url: "https://registry.example/cnpj/".to_string(),
            ..LookupConfig::default()
        };
        let gateway = BrasilApiGateway::new(&config).unwrap();
        let cnpj = Cnpj::parse("12.345.678/0001-95").unwrap();

        assert_eq!(gateway.url_for(&cnpj), "https://registry.example/cnpj/12345678000195");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = LookupConfig {
            base_url: "not a url".to_string(),
            ..LookupConfig::default()
        };
        let err = BrasilApiGateway::new(&config).unwrap_err();
        assert!(err.is_fatal());
    }
}
