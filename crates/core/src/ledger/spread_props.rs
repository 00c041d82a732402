//! Property-based tests for cross-year spreading.

use chrono::NaiveDate;
use ledgergen_shared::config::TaxCategoryConfig;
use ledgergen_shared::types::{BusinessId, ChargeId, Currency, TaxCategoryId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::BalanceLedger;
use super::spread::spread_entry;
use super::types::{EntityRef, LedgerEntryDraft};
use crate::charge::{Charge, ChargeSpreadRecord, ChargeType};

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

/// Amounts from 0.01 to 1,000,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Distinct relevance years around 2024.
fn years() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::btree_set(2021i32..2028, 1..5).prop_map(|set| set.into_iter().collect())
}

fn make_entry(amount: Decimal, is_creditor: bool, vat: Option<Decimal>, categories: &TaxCategoryConfig) -> LedgerEntryDraft {
    let charge = Charge {
        id: ChargeId::new(),
        owner_id: BusinessId::new(),
        charge_type: ChargeType::Common,
        user_description: None,
        tax_category_id: None,
    };
    let counterparty = EntityRef::Business(BusinessId::new());
    let category = EntityRef::TaxCategory(TaxCategoryId::new());
    let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
    let (credit, debit) = if is_creditor { (counterparty, category) } else { (category, counterparty) };

    let entry = LedgerEntryDraft::synthetic("doc", &charge, date, Currency::Ils, credit, debit, amount)
        .with_creditor_counterparty(is_creditor);
    match vat {
        Some(vat) => {
            let vat_category = if is_creditor { categories.input_vat } else { categories.output_vat };
            entry.with_auxiliary_split(EntityRef::TaxCategory(vat_category), vat, None)
        }
        None => entry,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Spreading conserves the counterparty's total and nets every mediating category to zero.
    #[test]
    fn prop_spread_conserves_amounts(
        total in amount(),
        vat in prop::option::of(amount()),
        is_creditor in any::<bool>(),
        years in years(),
    ) {
        let categories = tax_categories();
        let entry = make_entry(total, is_creditor, vat, &categories);
        let records: Vec<ChargeSpreadRecord> = years
            .iter()
            .map(|year| ChargeSpreadRecord { charge_id: entry.charge_id, year_of_relevance: *year, amount: None })
            .collect();

        let spread = spread_entry(&entry, &records, &categories).unwrap();

        let mut before = BalanceLedger::new();
        before.apply_entry(&entry).unwrap();
        let mut after = BalanceLedger::new();
        for part in &spread {
            prop_assert!(part.is_self_balanced());
            prop_assert!(part.local_amount() >= Decimal::ZERO);
            after.apply_entry(part).unwrap();
        }

        let counterparty = entry.counterparty_account();
        let own = entry.own_account();
        prop_assert_eq!(after.residual(counterparty), before.residual(counterparty));
        prop_assert_eq!(after.residual(own), before.residual(own));
        for mediating in [
            categories.expenses_in_advance,
            categories.expenses_to_pay,
            categories.income_in_advance,
            categories.income_to_collect,
        ] {
            prop_assert_eq!(after.residual(EntityRef::TaxCategory(mediating)), Decimal::ZERO);
        }
        prop_assert_eq!(after.sum(), Decimal::ZERO);
    }

    /// Explicit amounts above the total are rejected.
    #[test]
    fn prop_excessive_explicit_amount_rejected(total in amount(), extra in amount()) {
        let categories = tax_categories();
        let entry = make_entry(total, true, None, &categories);
        let records = [ChargeSpreadRecord {
            charge_id: entry.charge_id,
            year_of_relevance: 2025,
            amount: Some(total + extra),
        }];

        prop_assert!(spread_entry(&entry, &records, &categories).is_err());
    }
}
