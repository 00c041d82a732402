//! Engine configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{BusinessId, Currency, TaxCategoryId};

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// The owner's functional (local) currency.
    #[serde(default = "default_local_currency")]
    pub local_currency: Currency,
    /// Well-known tax categories used by the generators.
    pub tax_categories: TaxCategoryConfig,
    /// The VAT authority business that monthly VAT charges settle against.
    pub vat_authority_business_id: BusinessId,
    /// Dividend generation settings.
    #[serde(default)]
    pub dividend: DividendConfig,
    /// Business trip generation settings.
    #[serde(default)]
    pub business_trip: BusinessTripConfig,
}

fn default_local_currency() -> Currency {
    Currency::Ils
}

/// Tax categories the engine routes entries through.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxCategoryConfig {
    /// Exchange-rate differences.
    pub exchange_rate: TaxCategoryId,
    /// Declared dividends.
    pub dividend: TaxCategoryId,
    /// Default category for withheld dividend tax.
    pub dividend_withholding: TaxCategoryId,
    /// Input VAT (paid on expenses).
    pub input_vat: TaxCategoryId,
    /// Output VAT (collected on income).
    pub output_vat: TaxCategoryId,
    /// Monthly VAT rounding remainders.
    pub vat_rounding: TaxCategoryId,
    /// Expenses recognized in an earlier year than invoiced.
    pub expenses_to_pay: TaxCategoryId,
    /// Expenses recognized in a later year than invoiced.
    pub expenses_in_advance: TaxCategoryId,
    /// Income recognized in an earlier year than invoiced.
    pub income_to_collect: TaxCategoryId,
    /// Income recognized in a later year than invoiced.
    pub income_in_advance: TaxCategoryId,
    /// Bank and card fees.
    pub fee: TaxCategoryId,
    /// Default business trip expenses category.
    pub business_trip: TaxCategoryId,
}

/// Dividend generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DividendConfig {
    /// Withholding tax percentage applied to gross dividends (0.25 = 25%).
    #[serde(default = "default_withholding_percentage")]
    pub withholding_percentage: Decimal,
    /// Businesses whose transactions are withholding tax payments.
    #[serde(default)]
    pub withholding_tax_business_ids: Vec<BusinessId>,
}

fn default_withholding_percentage() -> Decimal {
    Decimal::new(25, 2)
}

impl Default for DividendConfig {
    fn default() -> Self {
        Self {
            withholding_percentage: default_withholding_percentage(),
            withholding_tax_business_ids: Vec::new(),
        }
    }
}

/// Business trip generation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessTripConfig {
    /// Employees allowed to end a business trip charge with a nonzero balance.
    #[serde(default)]
    pub allowed_unbalanced_employees: Vec<BusinessId>,
}

impl EngineConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERGEN").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Loads configuration from an inline TOML document, with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid or incomplete.
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .add_source(config::Environment::with_prefix("LEDGERGEN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
vat_authority_business_id = "0190a1c2-0000-7000-8000-000000000001"

[tax_categories]
exchange_rate = "0190a1c2-0000-7000-8000-000000000101"
dividend = "0190a1c2-0000-7000-8000-000000000102"
dividend_withholding = "0190a1c2-0000-7000-8000-000000000103"
input_vat = "0190a1c2-0000-7000-8000-000000000104"
output_vat = "0190a1c2-0000-7000-8000-000000000105"
vat_rounding = "0190a1c2-0000-7000-8000-000000000106"
expenses_to_pay = "0190a1c2-0000-7000-8000-000000000107"
expenses_in_advance = "0190a1c2-0000-7000-8000-000000000108"
income_to_collect = "0190a1c2-0000-7000-8000-000000000109"
income_in_advance = "0190a1c2-0000-7000-8000-000000000110"
fee = "0190a1c2-0000-7000-8000-000000000111"
business_trip = "0190a1c2-0000-7000-8000-000000000112"
"#;

    #[test]
    fn test_defaults_applied() {
        let config = temp_env::with_var_unset("LEDGERGEN__LOCAL_CURRENCY", || {
            EngineConfig::from_toml_str(MINIMAL).unwrap()
        });
        assert_eq!(config.local_currency, Currency::Ils);
        assert_eq!(config.dividend.withholding_percentage, dec!(0.25));
        assert!(config.dividend.withholding_tax_business_ids.is_empty());
        assert!(config.business_trip.allowed_unbalanced_employees.is_empty());
    }

    #[test]
    fn test_environment_overrides_local_currency() {
        let config = temp_env::with_var("LEDGERGEN__LOCAL_CURRENCY", Some("USD"), || {
            EngineConfig::from_toml_str(MINIMAL).unwrap()
        });
        assert_eq!(config.local_currency, Currency::Usd);
    }

    #[test]
    fn test_missing_tax_categories_is_error() {
        let result = EngineConfig::from_toml_str(
            r#"vat_authority_business_id = "0190a1c2-0000-7000-8000-000000000001""#,
        );
        assert!(result.is_err());
    }
}
