//! Monthly VAT settlement with the VAT authority.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use super::context::GenerationContext;
use super::fees::fee_entries;
use super::financial::{split_fees, try_build_transaction_entries};
use super::result::{GeneratedLedger, LedgerAccumulator};
use super::ChargeLedgerGenerator;
use crate::charge::Charge;
use crate::currency::CurrencyService;
use crate::ledger::{EntityRef, GenerationError, LedgerEntryDraft};

static MONTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(?P<y1>\d{4})-(?P<m1>\d{1,2})|(?P<m2>\d{1,2})[/-](?P<y2>\d{4}))\b")
        .expect("hardcoded regex should be valid")
});

/// Extracts `(year, month)` from text like `2024-03`, `03/2024` or `3-2024`.
#[must_use]
pub fn parse_vat_month(text: &str) -> Option<(i32, u32)> {
    let captures = MONTH_PATTERN.captures(text)?;
    let year = captures.name("y1").or_else(|| captures.name("y2"))?;
    let month = captures.name("m1").or_else(|| captures.name("m2"))?;

    let year: i32 = year.as_str().parse().ok()?;
    let month: u32 = month.as_str().parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// First and last day of a month.
#[must_use]
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Generator for monthly VAT payments and refunds.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonthlyVatGenerator;

#[async_trait]
impl ChargeLedgerGenerator for MonthlyVatGenerator {
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        charge: &Charge,
    ) -> Result<GeneratedLedger, GenerationError> {
        let missing_month = || GenerationError::MissingRequiredField {
            entity: format!("Charge {}", charge.id),
            field: "user_description",
        };
        let (year, month) = charge
            .user_description
            .as_deref()
            .and_then(parse_vat_month)
            .ok_or_else(missing_month)?;
        let (from, to) = month_bounds(year, month).ok_or_else(missing_month)?;

        let providers = ctx.providers;
        let (transactions, records) = futures::try_join!(
            providers.transactions.load_transactions_by_charge_id(charge.id),
            providers.vat_records.get_vat_records(charge.owner_id, from, to),
        )?;
        let (main, fees) = split_fees(transactions);

        let categories = ctx.tax_categories();
        let authority = EntityRef::Business(ctx.config.vat_authority_business_id);
        let output_vat = EntityRef::TaxCategory(categories.output_vat);
        let input_vat = EntityRef::TaxCategory(categories.input_vat);
        let rounding = EntityRef::TaxCategory(categories.vat_rounding);
        let local = ctx.local_currency();

        let mut acc = LedgerAccumulator::new(charge.id);

        let payments = try_build_transaction_entries(ctx, charge.owner_id, &main).await?;
        let date = payments.iter().map(|p| p.fields.value_date).max().unwrap_or(to);
        for payment in payments {
            acc.push(
                payment
                    .partial
                    .assign(authority, EntityRef::TaxCategory(payment.account_category)),
            )?;
        }

        let vat_overflow = || GenerationError::overflow(format!("VAT records of charge {}", charge.id));
        let income = records.income_total().ok_or_else(vat_overflow)?;
        let expenses = records.expenses_total().ok_or_else(vat_overflow)?;
        let income_rounded = CurrencyService::round_whole(income);
        let expenses_rounded = CurrencyService::round_whole(expenses);

        if !income_rounded.is_zero() {
            let (credit, debit) = oriented(authority, output_vat, income_rounded);
            acc.push(
                LedgerEntryDraft::synthetic(
                    format!("{}|income-vat", charge.id),
                    charge,
                    date,
                    local,
                    credit,
                    debit,
                    income_rounded.abs(),
                )
                .with_description(format!("Output VAT {year:04}-{month:02}")),
            )?;
        }

        if !expenses_rounded.is_zero() {
            let (credit, debit) = oriented(input_vat, authority, expenses_rounded);
            acc.push(
                LedgerEntryDraft::synthetic(
                    format!("{}|expenses-vat", charge.id),
                    charge,
                    date,
                    local,
                    credit,
                    debit,
                    expenses_rounded.abs(),
                )
                .with_description(format!("Input VAT {year:04}-{month:02}")),
            )?;
        }

        let income_remainder = income - income_rounded;
        let expenses_remainder = expenses - expenses_rounded;
        if !income_remainder.is_zero() || !expenses_remainder.is_zero() {
            let net = CurrencyService::round(income_remainder - expenses_remainder, 2);
            let (credit1, debit1) = oriented(rounding, output_vat, income_remainder);
            let (credit2, debit2) = oriented(input_vat, rounding, expenses_remainder);
            acc.push(
                LedgerEntryDraft::synthetic(
                    format!("{}|vat-rounding", charge.id),
                    charge,
                    date,
                    local,
                    credit1,
                    debit1,
                    income_remainder.abs(),
                )
                .with_slot2(credit2, debit2, expenses_remainder.abs(), None)
                .with_description(format!("VAT rounding {net}")),
            )?;
        }

        for fee in try_build_transaction_entries(ctx, charge.owner_id, &fees).await? {
            acc.extend(fee_entries(&fee, categories.fee))?;
        }

        acc.finish(&[], true)
    }
}

/// `(credit, debit)` for a positive amount, swapped for a negative one.
fn oriented(credit: EntityRef, debit: EntityRef, amount: Decimal) -> (EntityRef, EntityRef) {
    if amount.is_sign_negative() {
        (debit, credit)
    } else {
        (credit, debit)
    }
}
