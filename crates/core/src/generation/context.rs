//! Per-request generation context.

use ledgergen_shared::EngineConfig;
use ledgergen_shared::config::TaxCategoryConfig;
use ledgergen_shared::types::Currency;

use crate::currency::CurrencyConverter;
use crate::providers::Providers;

/// What a generator may read during one run.
///
/// Built fresh for every charge; nothing here outlives the request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Engine configuration.
    pub config: &'a EngineConfig,
    /// Collaborators.
    pub providers: &'a Providers,
}

impl<'a> GenerationContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(config: &'a EngineConfig, providers: &'a Providers) -> Self {
        Self { config, providers }
    }

    /// A converter into the configured local currency.
    #[must_use]
    pub fn converter(&self) -> CurrencyConverter<'a> {
        CurrencyConverter::new(self.providers.exchange_rates.as_ref(), self.config.local_currency)
    }

    /// The local (books) currency.
    #[must_use]
    pub fn local_currency(&self) -> Currency {
        self.config.local_currency
    }

    /// Configured well-known tax categories.
    #[must_use]
    pub fn tax_categories(&self) -> &'a TaxCategoryConfig {
        &self.config.tax_categories
    }
}
