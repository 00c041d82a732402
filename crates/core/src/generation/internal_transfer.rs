//! Internal transfers between the owner's own accounts.

use std::collections::BTreeSet;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::context::GenerationContext;
use super::fees::fee_entries;
use super::financial::{split_fees, try_build_transaction_entries};
use super::result::{GeneratedLedger, LedgerAccumulator};
use super::ChargeLedgerGenerator;
use crate::charge::Charge;
use crate::ledger::{EntityRef, GenerationError, LedgerEntryDraft};

/// Description of the entry closing exchange differences.
pub const EXCHANGE_RECORD_DESCRIPTION: &str = "Exchange ledger record";

/// Generator for transfers between two of the owner's accounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct InternalTransferGenerator;

#[async_trait]
impl ChargeLedgerGenerator for InternalTransferGenerator {
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

        if main.len() != 2 {
            return Err(GenerationError::StructuralViolation(format!(
                "internal transfer requires exactly two transactions, found {}",
                main.len()
            )));
        }

        let entries = try_build_transaction_entries(ctx, charge.owner_id, &main).await?;
        let has_outflow = entries.iter().any(|e| e.amount() < Decimal::ZERO);
        let has_inflow = entries.iter().any(|e| e.amount() > Decimal::ZERO);
        if !(has_outflow && has_inflow) {
            return Err(GenerationError::StructuralViolation(
                "internal transfer transactions must have opposite signs".to_string(),
            ));
        }

        let mut acc = LedgerAccumulator::new(charge.id);
        for financial in &entries {
            let counterparty =
                EntityRef::Business(financial.transaction.business_id.unwrap_or(charge.owner_id));
            acc.push(
                financial
                    .partial
                    .clone()
                    .assign(counterparty, EntityRef::TaxCategory(financial.account_category)),
            )?;
        }

        for fee in try_build_transaction_entries(ctx, charge.owner_id, &fees).await? {
            acc.extend(fee_entries(&fee, ctx.tax_categories().fee))?;
        }

        let value_dates: BTreeSet<_> = entries.iter().map(|e| e.fields.value_date).collect();
        let currencies: BTreeSet<_> = entries.iter().map(|e| e.fields.currency).collect();
        let unbalanced = acc.balance().unbalanced_businesses();

        if let [(business, residual)] = unbalanced.as_slice() {
            if value_dates.len() > 1 && currencies.len() > 1 {
                if let Some(date) = value_dates.last() {
                    let exchange = EntityRef::TaxCategory(ctx.tax_categories().exchange_rate);
                    let (credit, debit) = if *residual > Decimal::ZERO {
                        (exchange, *business)
                    } else {
                        (*business, exchange)
                    };
                    acc.push(
                        LedgerEntryDraft::synthetic(
                            format!("{}|exchange", charge.id),
                            charge,
                            *date,
                            ctx.local_currency(),
                            credit,
                            debit,
                            residual.abs(),
                        )
                        .with_description(EXCHANGE_RECORD_DESCRIPTION),
                    )?;
                }
            }
        }

        acc.finish(&[], true)
    }
}
