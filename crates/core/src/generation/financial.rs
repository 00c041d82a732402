//! Financial entries built from bank and card transactions.

use futures::future::join_all;
use ledgergen_shared::types::{BusinessId, TaxCategoryId};
use rust_decimal::Decimal;

use super::context::GenerationContext;
use crate::charge::Transaction;
use crate::ledger::{GenerationError, PartialEntry, RequiredFields, build_partial_entry, required_fields};

/// A transaction with its partial entry and the tax category of its account.
#[derive(Debug, Clone)]
pub struct FinancialEntry {
    /// Source transaction.
    pub transaction: Transaction,
    /// Validated fields.
    pub fields: RequiredFields,
    /// Converted partial entry.
    pub partial: PartialEntry,
    /// Tax category of the financial account in the transaction currency.
    pub account_category: TaxCategoryId,
}

impl FinancialEntry {
    /// Signed source amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.fields.amount
    }
}

/// Splits transactions into main and fee transactions.
#[must_use]
pub fn split_fees(transactions: Vec<Transaction>) -> (Vec<Transaction>, Vec<Transaction>) {
    transactions.into_iter().partition(|t| !t.is_fee)
}

/// Builds one financial entry per transaction, concurrently.
///
/// Results come back in input order; the caller decides whether a failure
/// is fatal.
pub async fn build_transaction_entries(
    ctx: &GenerationContext<'_>,
    owner_id: BusinessId,
    transactions: &[Transaction],
) -> Vec<Result<FinancialEntry, GenerationError>> {
    join_all(
        transactions
            .iter()
            .map(|transaction| build_transaction_entry(ctx, owner_id, transaction)),
    )
    .await
}

/// Like [`build_transaction_entries`] but fails on the first error.
pub async fn try_build_transaction_entries(
    ctx: &GenerationContext<'_>,
    owner_id: BusinessId,
    transactions: &[Transaction],
) -> Result<Vec<FinancialEntry>, GenerationError> {
    build_transaction_entries(ctx, owner_id, transactions)
        .await
        .into_iter()
        .collect()
}

async fn build_transaction_entry(
    ctx: &GenerationContext<'_>,
    owner_id: BusinessId,
    transaction: &Transaction,
) -> Result<FinancialEntry, GenerationError> {
    let fields = required_fields(transaction)?;
    let converter = ctx.converter();

    let (rate, account_category) = futures::try_join!(
        converter.get_rate(fields.currency, fields.value_date),
        async {
            ctx.providers
                .accounts
                .resolve_account_for_financial_account(transaction.account_id, fields.currency)
                .await
                .map_err(GenerationError::from)
        },
    )?;

    let partial = build_partial_entry(transaction, owner_id, ctx.local_currency(), Some(rate))?;

    Ok(FinancialEntry {
        transaction: transaction.clone(),
        fields,
        partial,
        account_category,
    })
}
