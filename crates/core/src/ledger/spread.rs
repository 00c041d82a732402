//! Cross-year spreading of accounting entries.
//!
//! An entry whose amount belongs to several fiscal years is split into one
//! part per year. The part of the entry's own year keeps the entry's id.
//! Parts outside that year are booked at the invoice date against a
//! mediating category (prepaid or accrued) and moved back to the original
//! category at the boundary of the relevance year.

use chrono::{Datelike, NaiveDate};
use ledgergen_shared::config::TaxCategoryConfig;
use rust_decimal::Decimal;

use super::error::GenerationError;
use super::types::{EntityRef, LedgerEntryDraft};
use crate::charge::ChargeSpreadRecord;
use crate::currency::AllocationUtil;

/// One fiscal-year slice of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpreadPart {
    year: i32,
    local_amount: Decimal,
    foreign_amount: Option<Decimal>,
    slot2_local_amount: Option<Decimal>,
    slot2_foreign_amount: Option<Decimal>,
}

/// Spreads the accounting entries of a charge.
///
/// Entries pass through untouched when there are no spread records. Only a
/// single accounting entry can be spread.
pub fn apply_spread(
    accounting_entries: Vec<LedgerEntryDraft>,
    records: &[ChargeSpreadRecord],
    tax_categories: &TaxCategoryConfig,
) -> Result<Vec<LedgerEntryDraft>, GenerationError> {
    if records.is_empty() || accounting_entries.is_empty() {
        return Ok(accounting_entries);
    }
    if accounting_entries.len() > 1 {
        return Err(GenerationError::UnsupportedSplit {
            entries: accounting_entries.len(),
        });
    }

    let mut spread = Vec::new();
    for entry in &accounting_entries {
        spread.extend(spread_entry(entry, records, tax_categories)?);
    }
    Ok(spread)
}

/// Splits one entry across the years named by `records`.
///
/// A VAT split stays in the entry's own year as a separate `|vat` entry.
/// Any other slot 2 is split along with slot 1.
pub fn spread_entry(
    entry: &LedgerEntryDraft,
    records: &[ChargeSpreadRecord],
    tax_categories: &TaxCategoryConfig,
) -> Result<Vec<LedgerEntryDraft>, GenerationError> {
    let mut output = Vec::new();

    let main = if is_vat_split(entry, tax_categories) {
        output.push(carve_slot2(entry));
        entry.clone().without_slot2()
    } else {
        entry.clone()
    };

    for part in partition(&main, records)? {
        output.extend(book_part(&main, part, tax_categories)?);
    }

    Ok(output)
}

fn is_vat_split(entry: &LedgerEntryDraft, tax_categories: &TaxCategoryConfig) -> bool {
    let vat = [
        EntityRef::TaxCategory(tax_categories.input_vat),
        EntityRef::TaxCategory(tax_categories.output_vat),
    ];
    [entry.credit_account_id2, entry.debit_account_id2]
        .into_iter()
        .flatten()
        .any(|account| vat.contains(&account))
}

/// Moves slot 2 into its own same-year entry.
fn carve_slot2(entry: &LedgerEntryDraft) -> LedgerEntryDraft {
    let mut carved = entry.clone().without_slot2();
    carved.id = format!("{}|vat", entry.id);
    if let (Some(credit), Some(debit)) = (entry.credit_account_id2, entry.debit_account_id2) {
        carved.credit_account_id1 = credit;
        carved.debit_account_id1 = debit;
    }
    let local = entry.local_currency_credit_amount2.unwrap_or_default();
    carved.local_currency_credit_amount1 = local;
    carved.local_currency_debit_amount1 = local;
    carved.credit_amount1 = entry.credit_amount2;
    carved.debit_amount1 = entry.debit_amount2;
    carved
}

/// Splits the entry's amounts into per-year parts, one per distinct year.
fn partition(
    entry: &LedgerEntryDraft,
    records: &[ChargeSpreadRecord],
) -> Result<Vec<SpreadPart>, GenerationError> {
    let total = entry.local_amount().abs();

    let mut explicit_sum = Decimal::ZERO;
    for amount in records.iter().filter_map(|r| r.amount) {
        let amount = amount.abs();
        if amount > total {
            return Err(GenerationError::PartialAmountExceedsTotal { amount, total });
        }
        if amount > total - explicit_sum {
            return Err(GenerationError::PartialAmountExceedsTotal {
                amount: explicit_sum.saturating_add(amount),
                total,
            });
        }
        explicit_sum += amount;
    }

    let remainder = total - explicit_sum;
    let implicit_count = records.iter().filter(|r| r.amount.is_none()).count();
    let mut implicit = AllocationUtil::allocate_equal(remainder, implicit_count, remainder.scale().max(2))
        .into_iter();

    let mut years_and_amounts: Vec<(i32, Decimal)> = Vec::with_capacity(records.len() + 1);
    for record in records {
        let amount = match record.amount {
            Some(amount) => amount.abs(),
            None => implicit.next().unwrap_or_default(),
        };
        add_to_year(&mut years_and_amounts, record.year_of_relevance, amount);
    }

    // Fully explicit records that do not cover the total leave the rest in the invoice year.
    if implicit_count == 0 && remainder > Decimal::ZERO {
        add_to_year(&mut years_and_amounts, entry.invoice_date.year(), remainder);
    }

    let weights: Vec<Decimal> = years_and_amounts.iter().map(|(_, amount)| *amount).collect();
    let split = |amount: Option<Decimal>| amount.map(|amount| split_by_weights(amount, &weights));
    let foreign_parts = split(entry.foreign_amount());
    let slot2_local_parts = split(entry.local_currency_credit_amount2);
    let slot2_foreign_parts = split(entry.credit_amount2);
    let nth = |parts: &Option<Vec<Decimal>>, i: usize| parts.as_ref().and_then(|p| p.get(i).copied());

    Ok(years_and_amounts
        .into_iter()
        .enumerate()
        .map(|(i, (year, local_amount))| SpreadPart {
            year,
            local_amount,
            foreign_amount: nth(&foreign_parts, i),
            slot2_local_amount: nth(&slot2_local_parts, i),
            slot2_foreign_amount: nth(&slot2_foreign_parts, i),
        })
        .collect())
}

/// Adds to an existing year's amount, keeping first-seen year order.
fn add_to_year(years_and_amounts: &mut Vec<(i32, Decimal)>, year: i32, amount: Decimal) {
    // Parts never sum past the entry total, so this cannot overflow.
    match years_and_amounts.iter_mut().find(|(y, _)| *y == year) {
        Some((_, existing)) => *existing += amount,
        None => years_and_amounts.push((year, amount)),
    }
}

/// Splits `amount` in proportion to `weights`; all of it goes to the first
/// part when the weights are all zero.
fn split_by_weights(amount: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    let parts = AllocationUtil::allocate_proportional(amount, weights, amount.scale().max(2));
    if parts.is_empty() && !weights.is_empty() {
        let mut parts = vec![Decimal::ZERO; weights.len()];
        parts[0] = amount;
        return parts;
    }
    parts
}

/// Books one part, either in place or via a mediating category.
fn book_part(
    entry: &LedgerEntryDraft,
    part: SpreadPart,
    tax_categories: &TaxCategoryConfig,
) -> Result<Vec<LedgerEntryDraft>, GenerationError> {
    let invoice_year = entry.invoice_date.year();
    let mut booked = with_amounts(entry, part);

    if part.year == invoice_year && part.year == entry.value_date.year() {
        return Ok(vec![booked]);
    }
    booked.id = format!("{}|spread-{}", entry.id, part.year);

    let is_later_year = part.year > invoice_year;
    let mediating = EntityRef::TaxCategory(match (entry.is_creditor_counterparty, is_later_year) {
        (true, true) => tax_categories.expenses_in_advance,
        (true, false) => tax_categories.expenses_to_pay,
        (false, true) => tax_categories.income_in_advance,
        (false, false) => tax_categories.income_to_collect,
    });

    let reversal_date = if is_later_year {
        NaiveDate::from_ymd_opt(part.year, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(part.year, 12, 31)
    }
    .ok_or_else(|| GenerationError::StructuralViolation(format!("invalid spread year {}", part.year)))?;

    // Only slot 1 moves through the mediating category.
    let original = entry.own_account();
    let mut reversal = booked
        .clone()
        .without_slot2()
        .with_counterparty(mediating)
        .with_own_account(original);
    reversal.id = format!("{}|spread-{}|reversal", entry.id, part.year);
    reversal.invoice_date = reversal_date;
    reversal.value_date = reversal_date;

    Ok(vec![booked.with_own_account(mediating), reversal])
}

fn with_amounts(entry: &LedgerEntryDraft, part: SpreadPart) -> LedgerEntryDraft {
    let mut draft = entry.clone();
    draft.local_currency_credit_amount1 = part.local_amount;
    draft.local_currency_debit_amount1 = part.local_amount;
    draft.credit_amount1 = part.foreign_amount;
    draft.debit_amount1 = part.foreign_amount;
    if draft.has_slot2() {
        draft.local_currency_credit_amount2 = part.slot2_local_amount;
        draft.local_currency_debit_amount2 = part.slot2_local_amount;
        draft.credit_amount2 = part.slot2_foreign_amount;
        draft.debit_amount2 = part.slot2_foreign_amount;
    }
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BalanceLedger;
    use ledgergen_shared::types::{BusinessId, ChargeId, Currency, TaxCategoryId};
    use rust_decimal_macros::dec;

    fn tax_categories() -> TaxCategoryConfig {
        TaxCategoryConfig {
            exchange_rate: TaxCategoryId::new(),
            dividend: TaxCategoryId::new(),
            dividend_withholding: TaxCategoryId::new(),
            input_vat: TaxCategoryId::new(),
            output_vat: TaxCategoryId::new(),
            vat_rounding: TaxCategoryId::new(),
            expenses_to_pay: TaxCategoryId::new(),
            expenses_in_advance: TaxCategoryId::new(),
            income_to_collect: TaxCategoryId::new(),
            income_in_advance: TaxCategoryId::new(),
            fee: TaxCategoryId::new(),
            business_trip: TaxCategoryId::new(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense_entry(amount: Decimal, on: NaiveDate) -> (LedgerEntryDraft, EntityRef, EntityRef) {
        let supplier = EntityRef::Business(BusinessId::new());
        let expense = EntityRef::TaxCategory(TaxCategoryId::new());
        let entry = LedgerEntryDraft {
            id: "doc-1".to_string(),
            invoice_date: on,
            value_date: on,
            currency: Currency::Ils,
            credit_account_id1: supplier,
            credit_amount1: None,
            local_currency_credit_amount1: amount,
            debit_account_id1: expense,
            debit_amount1: None,
            local_currency_debit_amount1: amount,
            credit_account_id2: None,
            credit_amount2: None,
            local_currency_credit_amount2: None,
            debit_account_id2: None,
            debit_amount2: None,
            local_currency_debit_amount2: None,
            description: None,
            reference1: None,
            is_creditor_counterparty: true,
            owner_id: BusinessId::new(),
            charge_id: ChargeId::new(),
            currency_rate: None,
        };
        (entry, supplier, expense)
    }

    fn record(year: i32, amount: Option<Decimal>) -> ChargeSpreadRecord {
        ChargeSpreadRecord {
            charge_id: ChargeId::new(),
            year_of_relevance: year,
            amount,
        }
    }

    #[test]
    fn test_spread_into_following_year() {
        let categories = tax_categories();
        let (entry, supplier, expense) = expense_entry(dec!(1200), date(2024, 12, 15));

        let spread =
            spread_entry(&entry, &[record(2024, None), record(2025, None)], &categories).unwrap();

        assert_eq!(spread.len(), 3);
        assert_eq!(spread[0].id, "doc-1");
        assert_eq!(spread[0].local_amount(), dec!(600));
        assert_eq!(spread[0].debit_account_id1, expense);

        let prepaid = EntityRef::TaxCategory(categories.expenses_in_advance);
        assert_eq!(spread[1].local_amount(), dec!(600));
        assert_eq!(spread[1].credit_account_id1, supplier);
        assert_eq!(spread[1].debit_account_id1, prepaid);
        assert_eq!(spread[1].invoice_date, date(2024, 12, 15));

        assert_eq!(spread[2].credit_account_id1, prepaid);
        assert_eq!(spread[2].debit_account_id1, expense);
        assert_eq!(spread[2].value_date, date(2025, 1, 1));

        let mut ledger = BalanceLedger::new();
        spread.iter().for_each(|e| ledger.apply_entry(e).unwrap());
        assert_eq!(ledger.residual(supplier), dec!(1200));
        assert_eq!(ledger.residual(prepaid), Decimal::ZERO);
        assert_eq!(ledger.residual(expense), dec!(-1200));
    }

    #[test]
    fn test_spread_into_previous_year_uses_accrual() {
        let categories = tax_categories();
        let (entry, _, expense) = expense_entry(dec!(1000), date(2025, 2, 1));

        let spread = spread_entry(&entry, &[record(2024, None)], &categories).unwrap();

        let accrued = EntityRef::TaxCategory(categories.expenses_to_pay);
        assert_eq!(spread.len(), 2);
        assert_eq!(spread[0].debit_account_id1, accrued);
        assert_eq!(spread[1].credit_account_id1, accrued);
        assert_eq!(spread[1].debit_account_id1, expense);
        assert_eq!(spread[1].value_date, date(2024, 12, 31));
    }

    #[test]
    fn test_income_uses_income_categories() {
        let categories = tax_categories();
        let (mut entry, _, _) = expense_entry(dec!(500), date(2024, 6, 1));
        entry.is_creditor_counterparty = false;
        std::mem::swap(&mut entry.credit_account_id1, &mut entry.debit_account_id1);

        let spread = spread_entry(&entry, &[record(2025, None)], &categories).unwrap();

        assert_eq!(
            spread[0].own_account(),
            EntityRef::TaxCategory(categories.income_in_advance)
        );
    }

    #[test]
    fn test_vat_carved_out() {
        let categories = tax_categories();
        let (entry, supplier, _) = expense_entry(dec!(1000), date(2024, 12, 15));
        let vat = EntityRef::TaxCategory(categories.input_vat);
        let entry = entry.with_auxiliary_split(vat, dec!(170), None);

        let spread =
            spread_entry(&entry, &[record(2024, None), record(2025, None)], &categories).unwrap();

        assert_eq!(spread[0].id, "doc-1|vat");
        assert_eq!(spread[0].credit_account_id1, supplier);
        assert_eq!(spread[0].debit_account_id1, vat);
        assert_eq!(spread[0].local_amount(), dec!(170));
        assert!(spread.iter().all(|e| !e.has_slot2()));
        assert_eq!(spread[1].local_amount(), dec!(500));
    }

    #[test]
    fn test_non_vat_slot2_spreads_with_slot1() {
        let categories = tax_categories();
        let (entry, supplier, expense) = expense_entry(dec!(1000), date(2024, 12, 15));
        let withholding = EntityRef::TaxCategory(TaxCategoryId::new());
        let entry = entry.with_auxiliary_split(withholding, dec!(100), None);

        let spread =
            spread_entry(&entry, &[record(2024, None), record(2025, None)], &categories).unwrap();

        assert_eq!(spread.len(), 3);
        assert!(spread.iter().all(|e| !e.id.ends_with("|vat")));
        assert_eq!(spread[0].id, "doc-1");
        assert_eq!(spread[0].local_currency_credit_amount2, Some(dec!(50)));
        assert_eq!(spread[1].local_currency_credit_amount2, Some(dec!(50)));
        assert!(!spread[2].has_slot2());

        let mut before = BalanceLedger::new();
        before.apply_entry(&entry).unwrap();
        let mut after = BalanceLedger::new();
        spread.iter().for_each(|e| after.apply_entry(e).unwrap());
        for account in [supplier, expense, withholding] {
            assert_eq!(after.residual(account), before.residual(account));
        }
        assert_eq!(after.residual(EntityRef::TaxCategory(categories.expenses_in_advance)), Decimal::ZERO);
    }

    #[test]
    fn test_repeated_year_books_one_part() {
        let categories = tax_categories();
        let (entry, _, _) = expense_entry(dec!(1000), date(2024, 3, 1));

        let spread = spread_entry(
            &entry,
            &[record(2024, Some(dec!(200))), record(2025, Some(dec!(300)))],
            &categories,
        )
        .unwrap();

        let ids: Vec<&str> = spread.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-1", "doc-1|spread-2025", "doc-1|spread-2025|reversal"]);
        assert_eq!(spread[0].local_amount(), dec!(700));
    }

    #[test]
    fn test_explicit_amounts_with_even_remainder() {
        let categories = tax_categories();
        let (entry, _, _) = expense_entry(dec!(1000), date(2024, 3, 1));

        let spread = spread_entry(
            &entry,
            &[record(2024, Some(dec!(400))), record(2025, None), record(2026, None)],
            &categories,
        )
        .unwrap();

        let amounts: Vec<Decimal> = spread
            .iter()
            .filter(|e| !e.id.ends_with("|reversal"))
            .map(LedgerEntryDraft::local_amount)
            .collect();
        assert_eq!(amounts, vec![dec!(400), dec!(300), dec!(300)]);
    }

    #[test]
    fn test_explicit_amounts_short_of_total_stay_in_invoice_year() {
        let categories = tax_categories();
        let (entry, _, _) = expense_entry(dec!(1000), date(2024, 3, 1));

        let spread = spread_entry(&entry, &[record(2025, Some(dec!(300)))], &categories).unwrap();

        assert_eq!(spread.len(), 3);
        assert_eq!(spread[2].id, "doc-1");
        assert_eq!(spread[2].local_amount(), dec!(700));
    }

    #[test]
    fn test_explicit_amount_exceeds_total() {
        let categories = tax_categories();
        let (entry, _, _) = expense_entry(dec!(100), date(2024, 3, 1));

        let err = spread_entry(
            &entry,
            &[record(2024, Some(dec!(60))), record(2025, Some(dec!(60)))],
            &categories,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::PartialAmountExceedsTotal { amount, total } if amount == dec!(120) && total == dec!(100)
        ));
    }

    #[test]
    fn test_apply_spread_rejects_multiple_entries() {
        let categories = tax_categories();
        let (a, _, _) = expense_entry(dec!(100), date(2024, 3, 1));
        let (b, _, _) = expense_entry(dec!(100), date(2024, 3, 1));

        let err = apply_spread(vec![a, b], &[record(2025, None)], &categories).unwrap_err();

        assert!(matches!(err, GenerationError::UnsupportedSplit { entries: 2 }));
    }

    #[test]
    fn test_apply_spread_without_records_is_identity() {
        let categories = tax_categories();
        let (a, _, _) = expense_entry(dec!(100), date(2024, 3, 1));

        let out = apply_spread(vec![a.clone()], &[], &categories).unwrap();

        assert_eq!(out, vec![a]);
    }

    #[test]
    fn test_foreign_amount_split_proportionally() {
        let categories = tax_categories();
        let (mut entry, _, _) = expense_entry(dec!(1000), date(2024, 3, 1));
        entry.currency = Currency::Usd;
        entry.credit_amount1 = Some(dec!(100));
        entry.debit_amount1 = Some(dec!(100));

        let spread = spread_entry(
            &entry,
            &[record(2024, None), record(2025, None), record(2026, None)],
            &categories,
        )
        .unwrap();

        let foreign: Decimal = spread
            .iter()
            .filter(|e| !e.id.ends_with("|reversal"))
            .filter_map(LedgerEntryDraft::foreign_amount)
            .sum();
        assert_eq!(foreign, dec!(100));
    }
}
