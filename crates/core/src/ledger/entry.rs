//! Transaction to partial entry conversion.

use chrono::NaiveDate;
use ledgergen_shared::types::{BusinessId, Currency};
use rust_decimal::Decimal;

use super::error::GenerationError;
use super::types::PartialEntry;
use crate::charge::Transaction;
use crate::currency::CurrencyService;

/// The fields every booked transaction must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredFields {
    /// Transaction currency.
    pub currency: Currency,
    /// Event date.
    pub event_date: NaiveDate,
    /// Value date (debit date, else event date).
    pub value_date: NaiveDate,
    /// Signed amount.
    pub amount: Decimal,
}

/// Extracts currency, dates and amount, failing on the first missing one.
pub fn required_fields(transaction: &Transaction) -> Result<RequiredFields, GenerationError> {
    let missing = |field| GenerationError::missing_transaction_field(transaction.id, field);

    let currency = transaction.currency.ok_or_else(|| missing("currency"))?;
    let event_date = transaction.event_date.ok_or_else(|| missing("event_date"))?;
    let amount = transaction.parsed_amount().ok_or_else(|| missing("amount"))?;

    Ok(RequiredFields {
        currency,
        event_date,
        value_date: transaction.value_date().unwrap_or(event_date),
        amount,
    })
}

/// Builds the partial entry for a transaction.
///
/// `rate` converts the transaction currency into `local_currency` and is
/// ignored for local transactions. Positive amounts put the counterparty on
/// the credit side.
pub fn build_partial_entry(
    transaction: &Transaction,
    owner_id: BusinessId,
    local_currency: Currency,
    rate: Option<Decimal>,
) -> Result<PartialEntry, GenerationError> {
    let fields = required_fields(transaction)?;
    let is_foreign = fields.currency != local_currency;
    let rate = if is_foreign { rate } else { None };

    let magnitude = fields.amount.abs();
    let local_amount = CurrencyService::convert(magnitude, rate.unwrap_or(Decimal::ONE))
        .ok_or_else(|| GenerationError::overflow(format!("Transaction {}", transaction.id)))?;

    Ok(PartialEntry {
        id: transaction.id.to_string(),
        invoice_date: fields.event_date,
        value_date: fields.value_date,
        currency: fields.currency,
        foreign_amount: is_foreign.then_some(magnitude),
        local_amount,
        description: transaction.source_description.clone(),
        reference1: None,
        is_creditor_counterparty: fields.amount > Decimal::ZERO,
        owner_id,
        charge_id: transaction.charge_id,
        currency_rate: rate,
    })
}
