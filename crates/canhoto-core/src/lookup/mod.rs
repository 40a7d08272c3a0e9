//! Company registry lookup.
//!
//! A CNPJ found on a receipt is resolved to the company's name and main
//! activity, which drives categorization.

mod brasilapi;

pub use brasilapi::BrasilApiGateway;

use crate::error::LookupError;
use crate::models::receipt::{Cnpj, CompanyInfo};

/// Resolves a CNPJ to company data.
///
/// `Ok(None)` means the registry answered and does not know the CNPJ.
pub trait EnrichmentGateway {
    fn lookup(
        &self,
        cnpj: &Cnpj,
    ) -> impl Future<Output = Result<Option<CompanyInfo>, LookupError>>;

    /// Whether lookups are performed at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Gateway used when lookups are disabled. Never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl EnrichmentGateway for NoLookup {
    async fn lookup(&self, _cnpj: &Cnpj) -> Result<Option<CompanyInfo>, LookupError> {
        Ok(None)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
