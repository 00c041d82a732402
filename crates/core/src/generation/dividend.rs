//! Dividend distributions with withholding tax.

use std::collections::BTreeSet;

use async_trait::async_trait;
use ledgergen_shared::types::TaxCategoryId;

use super::context::GenerationContext;
use super::fees::fee_entries;
use super::financial::{FinancialEntry, split_fees, try_build_transaction_entries};
use super::result::{GeneratedLedger, LedgerAccumulator};
use super::ChargeLedgerGenerator;
use crate::charge::{Charge, Transaction};
use crate::currency::CurrencyService;
use crate::ledger::{EntityRef, GenerationError, LedgerEntryDraft};
use crate::providers::ProviderError;

/// Generator for dividend payments to shareholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct DividendGenerator;

/// Whether a transaction pays withholding tax to the tax authority.
#[must_use]
pub fn is_withholding_tax_transaction(ctx: &GenerationContext<'_>, transaction: &Transaction) -> bool {
    transaction
        .business_id
        .is_some_and(|id| ctx.config.dividend.withholding_tax_business_ids.contains(&id))
}

#[async_trait]
impl ChargeLedgerGenerator for DividendGenerator {
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        charge: &Charge,
    ) -> Result<GeneratedLedger, GenerationError> {
        let transactions = ctx
            .providers
            .transactions
            .load_transactions_by_charge_id(charge.id)
            .await?;
        let (main, fees) = split_fees(transactions);
        let (withholding, payments): (Vec<_>, Vec<_>) = main
            .into_iter()
            .partition(|t| is_withholding_tax_transaction(ctx, t));

        let withholding_category = resolve_withholding_category(ctx, &withholding).await?;
        let withholding_account = EntityRef::TaxCategory(withholding_category);

        let mut acc = LedgerAccumulator::new(charge.id);

        for financial in try_build_transaction_entries(ctx, charge.owner_id, &withholding).await? {
            acc.push(
                financial
                    .partial
                    .assign(withholding_account, EntityRef::TaxCategory(financial.account_category)),
            )?;
        }

        for financial in try_build_transaction_entries(ctx, charge.owner_id, &payments).await? {
            acc.extend(payment_entries(ctx, charge, &financial, withholding_account)?)?;
        }

        for fee in try_build_transaction_entries(ctx, charge.owner_id, &fees).await? {
            acc.extend(fee_entries(&fee, ctx.tax_categories().fee))?;
        }

        acc.finish(&[], true)
    }
}

/// The single tax category all withholding transactions resolve to.
async fn resolve_withholding_category(
    ctx: &GenerationContext<'_>,
    withholding: &[Transaction],
) -> Result<TaxCategoryId, GenerationError> {
    let default = ctx.tax_categories().dividend_withholding;
    let mut categories = BTreeSet::new();

    for business_id in withholding.iter().filter_map(|t| t.business_id) {
        match ctx
            .providers
            .accounts
            .resolve_tax_category_for_business(business_id)
            .await
        {
            Ok(category) => categories.insert(category),
            Err(ProviderError::UnmappedBusiness(_)) => categories.insert(default),
            Err(err) => return Err(err.into()),
        };
    }

    if categories.len() > 1 {
        return Err(GenerationError::InconsistentTaxCategory);
    }
    Ok(categories.into_iter().next().unwrap_or(default))
}

/// Payment entry grossed up by withholding, plus the closing dividend entry.
fn payment_entries(
    ctx: &GenerationContext<'_>,
    charge: &Charge,
    payment: &FinancialEntry,
    withholding_account: EntityRef,
) -> Result<Vec<LedgerEntryDraft>, GenerationError> {
    let transaction = &payment.transaction;
    if payment.fields.currency != ctx.local_currency() {
        return Err(GenerationError::ForeignPaymentUnsupported {
            transaction_id: transaction.id,
            currency: payment.fields.currency,
        });
    }

    let shareholder = EntityRef::Business(transaction.business_id.ok_or_else(|| {
        GenerationError::missing_transaction_field(transaction.id, "business_id")
    })?);

    let net = payment.partial.local_amount;
    let percentage = ctx.config.dividend.withholding_percentage;
    let withheld = CurrencyService::withholding_for_net(net, percentage).ok_or_else(|| {
        GenerationError::StructuralViolation(format!("invalid withholding percentage {percentage}"))
    })?;
    let gross = net
        .checked_add(withheld)
        .ok_or_else(|| GenerationError::overflow(format!("Transaction {}", transaction.id)))?;

    let payment_entry = payment
        .partial
        .clone()
        .assign(shareholder, EntityRef::TaxCategory(payment.account_category))
        .with_auxiliary_split(withholding_account, withheld, None);

    let dividend = EntityRef::TaxCategory(ctx.tax_categories().dividend);
    let (credit, debit) = if payment.partial.is_creditor_counterparty {
        (dividend, shareholder)
    } else {
        (shareholder, dividend)
    };
    let closing = LedgerEntryDraft::synthetic(
        format!("{}|dividend", transaction.id),
        charge,
        payment.fields.value_date,
        ctx.local_currency(),
        credit,
        debit,
        gross,
    )
    .with_creditor_counterparty(!payment.partial.is_creditor_counterparty)
    .with_description("Dividend");

    Ok(vec![payment_entry, closing])
}
