//! Collaborator boundary.
//!
//! Everything the engine reads or writes goes through these traits. The engine
//! keeps no caches of its own; implementations are free to cache.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgergen_shared::types::{
    BusinessId, BusinessTripId, ChargeId, Currency, FinancialAccountId, TaxCategoryId,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::charge::{
    BusinessTrip, BusinessTripExpense, Charge, ChargeSpreadRecord, Document, Transaction,
    VatRecords,
};
use crate::ledger::LedgerEntryDraft;

pub use memory::{Fixture, InMemoryProviders};

/// Errors reported by collaborators.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// No exchange rate for the pair on the date.
    #[error("No exchange rate found for {currency} to {target} on {date}")]
    RateUnavailable {
        /// Source currency.
        currency: Currency,
        /// Target currency.
        target: Currency,
        /// Requested date.
        date: NaiveDate,
    },

    /// Financial account has no tax category for the currency.
    #[error("Financial account {account} has no tax category for {currency}")]
    UnmappedAccount {
        /// The financial account.
        account: FinancialAccountId,
        /// The requested currency.
        currency: Currency,
    },

    /// Business has no tax category.
    #[error("Business {0} has no tax category")]
    UnmappedBusiness(BusinessId),

    /// Backend failure (I/O, database, network).
    #[error("Provider backend error: {0}")]
    Backend(String),
}

/// Loads a charge's transactions.
#[async_trait]
pub trait TransactionsProvider: Send + Sync {
    /// Returns all transactions of the charge.
    async fn load_transactions_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Vec<Transaction>, ProviderError>;
}

/// Loads a charge's accounting documents.
#[async_trait]
pub trait DocumentsProvider: Send + Sync {
    /// Returns all documents of the charge.
    async fn load_documents_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Vec<Document>, ProviderError>;
}

/// Exchange rate lookup.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Returns how many units of `local_currency` one unit of `currency` buys on `date`.
    async fn get_rate(
        &self,
        currency: Currency,
        local_currency: Currency,
        date: NaiveDate,
    ) -> Result<Decimal, ProviderError>;
}

/// Maps financial accounts and businesses to tax categories.
#[async_trait]
pub trait AccountResolver: Send + Sync {
    /// Tax category representing the financial account in the given currency.
    async fn resolve_account_for_financial_account(
        &self,
        account_id: FinancialAccountId,
        currency: Currency,
    ) -> Result<TaxCategoryId, ProviderError>;

    /// Tax category a business is booked to.
    async fn resolve_tax_category_for_business(
        &self,
        business_id: BusinessId,
    ) -> Result<TaxCategoryId, ProviderError>;
}

/// Aggregate VAT report rows.
#[async_trait]
pub trait VatRecordsProvider: Send + Sync {
    /// VAT rows for documents of `owner_id` dated within `from..=to`.
    async fn get_vat_records(
        &self,
        owner_id: BusinessId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<VatRecords, ProviderError>;
}

/// Business trip and its category-specific expense loaders.
#[async_trait]
pub trait BusinessTripProvider: Send + Sync {
    /// The trip booked by the charge, if any.
    async fn get_business_trip_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Option<BusinessTrip>, ProviderError>;

    /// Flight expenses of the trip.
    async fn get_flight_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError>;

    /// Accommodation expenses of the trip.
    async fn get_accommodation_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError>;

    /// Travel and subsistence expenses of the trip.
    async fn get_travel_and_subsistence_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError>;

    /// Uncategorized expenses of the trip.
    async fn get_other_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError>;
}

/// Cross-year spread records.
#[async_trait]
pub trait SpreadRecordsProvider: Send + Sync {
    /// Spread records of the charge; empty when the charge is not spread.
    async fn get_spread_records_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Vec<ChargeSpreadRecord>, ProviderError>;
}

/// Persistence sink for generated records.
///
/// Implementations must be idempotent per charge: storing the same records
/// twice leaves the same rows as storing them once.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Replaces the stored records of `charge` with `records`.
    async fn store_records(
        &self,
        charge: &Charge,
        records: &[LedgerEntryDraft],
    ) -> Result<(), ProviderError>;
}

/// The set of collaborators a generation run talks to.
#[derive(Clone)]
pub struct Providers {
    /// Transactions source.
    pub transactions: Arc<dyn TransactionsProvider>,
    /// Documents source.
    pub documents: Arc<dyn DocumentsProvider>,
    /// Exchange rates.
    pub exchange_rates: Arc<dyn ExchangeRateProvider>,
    /// Account and tax category resolution.
    pub accounts: Arc<dyn AccountResolver>,
    /// VAT report rows.
    pub vat_records: Arc<dyn VatRecordsProvider>,
    /// Business trips.
    pub business_trips: Arc<dyn BusinessTripProvider>,
    /// Spread records.
    pub spread_records: Arc<dyn SpreadRecordsProvider>,
    /// Optional persistence sink.
    pub storage: Option<Arc<dyn LedgerStorage>>,
}

impl Providers {
    /// Uses one object for every collaborator, including storage.
    #[must_use]
    pub fn from_shared<P>(provider: Arc<P>) -> Self
    where
        P: TransactionsProvider
            + DocumentsProvider
            + ExchangeRateProvider
            + AccountResolver
            + VatRecordsProvider
            + BusinessTripProvider
            + SpreadRecordsProvider
            + LedgerStorage
            + 'static,
    {
        Self {
            transactions: provider.clone(),
            documents: provider.clone(),
            exchange_rates: provider.clone(),
            accounts: provider.clone(),
            vat_records: provider.clone(),
            business_trips: provider.clone(),
            spread_records: provider.clone(),
            storage: Some(provider),
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("storage", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}
