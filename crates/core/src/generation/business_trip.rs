//! Business trips: card payments and employee reimbursements.

use std::collections::BTreeSet;

use async_trait::async_trait;
use futures::future::join_all;
use ledgergen_shared::types::{TaxCategoryId, TransactionId};
use rust_decimal::Decimal;

use super::context::GenerationContext;
use super::fees::fee_entries;
use super::financial::{build_transaction_entries, split_fees};
use super::result::{GeneratedLedger, LedgerAccumulator};
use super::ChargeLedgerGenerator;
use crate::charge::{BusinessTrip, BusinessTripExpense, Charge, EmployeePayment};
use crate::currency::CurrencyService;
use crate::ledger::{EntityRef, GenerationError, LedgerEntryDraft, PartialEntry};

/// Generator for business trip charges.
#[derive(Debug, Default, Clone, Copy)]
pub struct BusinessTripGenerator;

#[async_trait]
impl ChargeLedgerGenerator for BusinessTripGenerator {
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        charge: &Charge,
    ) -> Result<GeneratedLedger, GenerationError> {
        let providers = ctx.providers;
        let trip = providers
            .business_trips
            .get_business_trip_by_charge_id(charge.id)
            .await?
            .ok_or_else(|| GenerationError::MissingRequiredField {
                entity: format!("Charge {}", charge.id),
                field: "business_trip",
            })?;

        let trips = &providers.business_trips;
        let (flights, accommodation, travel_and_subsistence, other, transactions) = futures::try_join!(
            trips.get_flight_expenses(trip.id),
            trips.get_accommodation_expenses(trip.id),
            trips.get_travel_and_subsistence_expenses(trip.id),
            trips.get_other_expenses(trip.id),
            providers.transactions.load_transactions_by_charge_id(charge.id),
        )?;
        let expenses: Vec<BusinessTripExpense> = flights
            .into_iter()
            .chain(accommodation)
            .chain(travel_and_subsistence)
            .chain(other)
            .collect();

        let trip_category = trip
            .tax_category_id
            .or(charge.tax_category_id)
            .unwrap_or(ctx.tax_categories().business_trip);
        let trip_account = EntityRef::TaxCategory(trip_category);
        let linked: BTreeSet<TransactionId> = expenses
            .iter()
            .flat_map(|e| e.transaction_ids.iter().copied())
            .collect();

        let mut acc = LedgerAccumulator::new(charge.id);
        let (main, fees) = split_fees(transactions);

        for result in build_transaction_entries(ctx, charge.owner_id, &main).await {
            match result {
                Ok(financial) => {
                    let counterparty = if linked.contains(&financial.transaction.id) {
                        trip_account
                    } else {
                        EntityRef::Business(financial.transaction.business_id.unwrap_or(charge.owner_id))
                    };
                    acc.push(
                        financial
                            .partial
                            .assign(counterparty, EntityRef::TaxCategory(financial.account_category)),
                    )?;
                }
                Err(err) => acc.soft_error(err.to_string()),
            }
        }

        let reimbursements = join_all(expenses.iter().filter_map(|expense| {
            expense
                .employee_payment
                .as_ref()
                .map(|payment| employee_entry(ctx, charge, &trip, expense, payment, trip_category))
        }))
        .await;
        for result in reimbursements {
            match result {
                Ok(entry) => acc.push(entry)?,
                Err(err) => acc.soft_error(err.to_string()),
            }
        }

        for result in build_transaction_entries(ctx, charge.owner_id, &fees).await {
            match result {
                Ok(fee) => acc.extend(fee_entries(&fee, ctx.tax_categories().fee))?,
                Err(err) => acc.soft_error(err.to_string()),
            }
        }

        let allow_list: Vec<EntityRef> = ctx
            .config
            .business_trip
            .allowed_unbalanced_employees
            .iter()
            .copied()
            .map(EntityRef::Business)
            .collect();
        acc.finish(&allow_list, true)
    }
}

/// Credits the employee and debits the trip category for an out-of-pocket payment.
///
/// A negative payment is a refund from the employee and books the other way.
async fn employee_entry(
    ctx: &GenerationContext<'_>,
    charge: &Charge,
    trip: &BusinessTrip,
    expense: &BusinessTripExpense,
    payment: &EmployeePayment,
    trip_category: TaxCategoryId,
) -> Result<LedgerEntryDraft, GenerationError> {
    let date = payment.date.ok_or_else(|| GenerationError::MissingRequiredField {
        entity: format!("Business trip expense {}", expense.id),
        field: "date",
    })?;

    let currency = payment.amount.currency;
    let magnitude = payment.amount.amount.abs();
    let is_foreign = currency != ctx.local_currency();
    let converter = ctx.converter();
    let rate = converter.get_rate(currency, date).await?;
    let local_amount = CurrencyService::convert(magnitude, rate).ok_or_else(|| {
        GenerationError::overflow(format!("Business trip expense {}", expense.id))
    })?;

    let partial = PartialEntry {
        id: format!("{}|employee", expense.id),
        invoice_date: date,
        value_date: date,
        currency,
        foreign_amount: is_foreign.then_some(magnitude),
        local_amount,
        description: Some(format!("{} expense: {}", expense.category, trip.name)),
        reference1: None,
        is_creditor_counterparty: payment.amount.amount > Decimal::ZERO,
        owner_id: charge.owner_id,
        charge_id: charge.id,
        currency_rate: is_foreign.then_some(rate),
    };

    Ok(partial.assign(
        EntityRef::Business(payment.employee_business_id),
        EntityRef::TaxCategory(trip_category),
    ))
}
