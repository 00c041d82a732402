//! Rate lookup against the configured local currency.

use chrono::NaiveDate;
use ledgergen_shared::types::Currency;
use rust_decimal::Decimal;
use tracing::debug;

use super::service::CurrencyService;
use crate::ledger::GenerationError;
use crate::providers::ExchangeRateProvider;

/// Resolves rates from any currency into the local currency.
///
/// Holds no state besides the provider handle; every call goes to the
/// provider except local-currency lookups, which are always `1`.
#[derive(Clone, Copy)]
pub struct CurrencyConverter<'a> {
    provider: &'a dyn ExchangeRateProvider,
    local_currency: Currency,
}

impl<'a> CurrencyConverter<'a> {
    /// Creates a converter for `local_currency`.
    #[must_use]
    pub fn new(provider: &'a dyn ExchangeRateProvider, local_currency: Currency) -> Self {
        Self {
            provider,
            local_currency,
        }
    }

    /// The local (books) currency.
    #[must_use]
    pub fn local_currency(&self) -> Currency {
        self.local_currency
    }

    /// Rate for one unit of `currency` in local currency on `date`.
    pub async fn get_rate(&self, currency: Currency, date: NaiveDate) -> Result<Decimal, GenerationError> {
        if currency == self.local_currency {
            return Ok(Decimal::ONE);
        }

        let unavailable = || GenerationError::RateUnavailable {
            currency,
            target: self.local_currency,
            date,
        };

        let rate = self
            .provider
            .get_rate(currency, self.local_currency, date)
            .await
            .map_err(|err| {
                debug!(%currency, %date, error = %err, "exchange rate lookup failed");
                unavailable()
            })?;

        if rate <= Decimal::ZERO {
            return Err(unavailable());
        }
        Ok(rate)
    }

    /// Converts `amount` of `currency` into local currency on `date`.
    pub async fn to_local(
        &self,
        amount: Decimal,
        currency: Currency,
        date: NaiveDate,
    ) -> Result<Decimal, GenerationError> {
        let rate = self.get_rate(currency, date).await?;
        CurrencyService::convert(amount, rate)
            .ok_or_else(|| GenerationError::overflow(format!("{amount} {currency}")))
    }
}

impl std::fmt::Debug for CurrencyConverter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyConverter")
            .field("local_currency", &self.local_currency)
            .finish_non_exhaustive()
    }
}
