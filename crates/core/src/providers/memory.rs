//! In-memory collaborators backed by a JSON fixture.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgergen_shared::types::{
    BusinessId, BusinessTripId, ChargeId, Currency, DocumentId, FinancialAccountId, TaxCategoryId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{
    AccountResolver, BusinessTripProvider, DocumentsProvider, ExchangeRateProvider, LedgerStorage,
    ProviderError, SpreadRecordsProvider, TransactionsProvider, VatRecordsProvider,
};
use crate::charge::{
    BusinessTrip, BusinessTripExpense, Charge, ChargeSpreadRecord, Document, Transaction,
    TripExpenseCategory, VatRecordRow, VatRecords,
};
use crate::ledger::LedgerEntryDraft;

/// A daily exchange rate into the local currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRecord {
    /// Source currency.
    pub currency: Currency,
    /// Effective date.
    pub date: NaiveDate,
    /// Local units per source unit.
    pub rate: Decimal,
}

/// Financial account to tax category mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountMapping {
    /// The financial account.
    pub account_id: FinancialAccountId,
    /// Currency of the sub-account; `None` matches any currency.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// The tax category representing it.
    pub tax_category_id: TaxCategoryId,
}

/// Business to tax category mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTaxCategory {
    /// The business.
    pub business_id: BusinessId,
    /// Its tax category.
    pub tax_category_id: TaxCategoryId,
}

/// Which side of the VAT report a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatKind {
    /// Output VAT.
    Income,
    /// Input VAT.
    Expense,
}

/// A VAT row owned by a business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatRecordEntry {
    /// Owner of the books.
    pub owner_id: BusinessId,
    /// Income or expense.
    pub kind: VatKind,
    /// Source document.
    #[serde(default)]
    pub document_id: Option<DocumentId>,
    /// Document date.
    pub date: NaiveDate,
    /// VAT in local currency.
    pub local_vat_amount: Decimal,
}

/// Everything the in-memory providers serve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Charges to generate.
    pub charges: Vec<Charge>,
    /// Transactions of all charges.
    pub transactions: Vec<Transaction>,
    /// Documents of all charges.
    pub documents: Vec<Document>,
    /// Exchange rates.
    pub rates: Vec<RateRecord>,
    /// Financial account mappings.
    pub accounts: Vec<AccountMapping>,
    /// Business mappings.
    pub business_tax_categories: Vec<BusinessTaxCategory>,
    /// VAT rows.
    pub vat_records: Vec<VatRecordEntry>,
    /// Business trips.
    pub business_trips: Vec<BusinessTrip>,
    /// Business trip expenses.
    pub trip_expenses: Vec<BusinessTripExpense>,
    /// Spread records.
    pub spread_records: Vec<ChargeSpreadRecord>,
}

/// Serves a [`Fixture`] through every provider trait and keeps stored records in memory.
#[derive(Debug, Default)]
pub struct InMemoryProviders {
    fixture: Fixture,
    stored: RwLock<BTreeMap<ChargeId, Vec<LedgerEntryDraft>>>,
}

impl InMemoryProviders {
    /// Wraps a fixture.
    #[must_use]
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            stored: RwLock::default(),
        }
    }

    /// Parses a JSON fixture.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    /// The served fixture.
    #[must_use]
    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    /// Records stored for a charge.
    pub async fn stored_records(&self, charge_id: ChargeId) -> Vec<LedgerEntryDraft> {
        self.stored.read().await.get(&charge_id).cloned().unwrap_or_default()
    }

    /// Total number of stored rows across charges.
    pub async fn stored_row_count(&self) -> usize {
        self.stored.read().await.values().map(Vec::len).sum()
    }

    fn trip_expenses(&self, trip_id: BusinessTripId, category: TripExpenseCategory) -> Vec<BusinessTripExpense> {
        self.fixture
            .trip_expenses
            .iter()
            .filter(|e| e.business_trip_id == trip_id && e.category == category)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransactionsProvider for InMemoryProviders {
    async fn load_transactions_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Vec<Transaction>, ProviderError> {
        Ok(self
            .fixture
            .transactions
            .iter()
            .filter(|t| t.charge_id == charge_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DocumentsProvider for InMemoryProviders {
    async fn load_documents_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Vec<Document>, ProviderError> {
        Ok(self
            .fixture
            .documents
            .iter()
            .filter(|d| d.charge_id == charge_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExchangeRateProvider for InMemoryProviders {
    /// Latest rate effective on or before `date`.
    async fn get_rate(
        &self,
        currency: Currency,
        local_currency: Currency,
        date: NaiveDate,
    ) -> Result<Decimal, ProviderError> {
        if currency == local_currency {
            return Ok(Decimal::ONE);
        }
        self.fixture
            .rates
            .iter()
            .filter(|r| r.currency == currency && r.date <= date)
            .max_by_key(|r| r.date)
            .map(|r| r.rate)
            .ok_or(ProviderError::RateUnavailable {
                currency,
                target: local_currency,
                date,
            })
    }
}

#[async_trait]
impl AccountResolver for InMemoryProviders {
    async fn resolve_account_for_financial_account(
        &self,
        account_id: FinancialAccountId,
        currency: Currency,
    ) -> Result<TaxCategoryId, ProviderError> {
        let mappings = || self.fixture.accounts.iter().filter(|m| m.account_id == account_id);

        mappings()
            .find(|m| m.currency == Some(currency))
            .or_else(|| mappings().find(|m| m.currency.is_none()))
            .map(|m| m.tax_category_id)
            .ok_or(ProviderError::UnmappedAccount {
                account: account_id,
                currency,
            })
    }

    async fn resolve_tax_category_for_business(
        &self,
        business_id: BusinessId,
    ) -> Result<TaxCategoryId, ProviderError> {
        self.fixture
            .business_tax_categories
            .iter()
            .find(|m| m.business_id == business_id)
            .map(|m| m.tax_category_id)
            .ok_or(ProviderError::UnmappedBusiness(business_id))
    }
}

#[async_trait]
impl VatRecordsProvider for InMemoryProviders {
    async fn get_vat_records(
        &self,
        owner_id: BusinessId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<VatRecords, ProviderError> {
        let mut records = VatRecords::default();
        for entry in self
            .fixture
            .vat_records
            .iter()
            .filter(|e| e.owner_id == owner_id && e.date >= from && e.date <= to)
        {
            let row = VatRecordRow {
                document_id: entry.document_id,
                date: entry.date,
                local_vat_amount: entry.local_vat_amount,
            };
            match entry.kind {
                VatKind::Income => records.income.push(row),
                VatKind::Expense => records.expenses.push(row),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl BusinessTripProvider for InMemoryProviders {
    async fn get_business_trip_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Option<BusinessTrip>, ProviderError> {
        Ok(self
            .fixture
            .business_trips
            .iter()
            .find(|t| t.charge_id == charge_id)
            .cloned())
    }

    async fn get_flight_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError> {
        Ok(self.trip_expenses(trip_id, TripExpenseCategory::Flight))
    }

    async fn get_accommodation_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError> {
        Ok(self.trip_expenses(trip_id, TripExpenseCategory::Accommodation))
    }

    async fn get_travel_and_subsistence_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError> {
        Ok(self.trip_expenses(trip_id, TripExpenseCategory::TravelAndSubsistence))
    }

    async fn get_other_expenses(
        &self,
        trip_id: BusinessTripId,
    ) -> Result<Vec<BusinessTripExpense>, ProviderError> {
        Ok(self.trip_expenses(trip_id, TripExpenseCategory::Other))
    }
}

#[async_trait]
impl SpreadRecordsProvider for InMemoryProviders {
    async fn get_spread_records_by_charge_id(
        &self,
        charge_id: ChargeId,
    ) -> Result<Vec<ChargeSpreadRecord>, ProviderError> {
        Ok(self
            .fixture
            .spread_records
            .iter()
            .filter(|r| r.charge_id == charge_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerStorage for InMemoryProviders {
    async fn store_records(
        &self,
        charge: &Charge,
        records: &[LedgerEntryDraft],
    ) -> Result<(), ProviderError> {
        self.stored.write().await.insert(charge.id, records.to_vec());
        Ok(())
    }
}
