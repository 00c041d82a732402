//! Fee transaction entries.

use ledgergen_shared::types::TaxCategoryId;

use super::financial::FinancialEntry;
use crate::ledger::{EntityRef, LedgerEntryDraft};

/// Books a fee transaction against the fee category.
///
/// A fee naming a counterparty business is booked against that business,
/// followed by a `<id>|fee` entry moving the amount from the business into
/// the fee category so the business nets to zero.
#[must_use]
pub fn fee_entries(fee: &FinancialEntry, fee_category: TaxCategoryId) -> Vec<LedgerEntryDraft> {
    let bank = EntityRef::TaxCategory(fee.account_category);
    let fee_account = EntityRef::TaxCategory(fee_category);

    let Some(business_id) = fee.transaction.business_id else {
        return vec![fee.partial.clone().assign(fee_account, bank)];
    };
    let business = EntityRef::Business(business_id);

    let mut misc = fee.partial.clone();
    misc.id = format!("{}|fee", fee.partial.id);
    misc.is_creditor_counterparty = !fee.partial.is_creditor_counterparty;
    misc.description = Some("Fee".to_string());

    vec![
        fee.partial.clone().assign(business, bank),
        misc.assign(business, fee_account),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::Transaction;
    use crate::ledger::{BalanceLedger, build_partial_entry, required_fields};
    use chrono::NaiveDate;
    use ledgergen_shared::types::{BusinessId, ChargeId, Currency, FinancialAccountId, TransactionId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn fee(business_id: Option<BusinessId>) -> FinancialEntry {
        let transaction = Transaction {
            id: TransactionId::new(),
            charge_id: ChargeId::new(),
            account_id: FinancialAccountId::new(),
            business_id,
            amount: "-15".to_string(),
            currency: Some(Currency::Ils),
            event_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            debit_date: None,
            is_fee: true,
            source_description: None,
            currency_rate: None,
        };
        let partial = build_partial_entry(&transaction, BusinessId::new(), Currency::Ils, None).unwrap();
        FinancialEntry {
            fields: required_fields(&transaction).unwrap(),
            transaction,
            partial,
            account_category: TaxCategoryId::new(),
        }
    }

    #[test]
    fn test_fee_without_business() {
        let fee_category = TaxCategoryId::new();
        let fee = fee(None);

        let entries = fee_entries(&fee, fee_category);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].debit_account_id1, EntityRef::TaxCategory(fee_category));
        assert_eq!(entries[0].credit_account_id1, EntityRef::TaxCategory(fee.account_category));
        assert_eq!(entries[0].local_amount(), dec!(15));
    }

    #[test]
    fn test_fee_with_business_nets_business() {
        let fee_category = TaxCategoryId::new();
        let business_id = BusinessId::new();
        let fee = fee(Some(business_id));

        let entries = fee_entries(&fee, fee_category);

        assert_eq!(entries.len(), 2);
        assert!(entries[1].id.ends_with("|fee"));

        let mut ledger = BalanceLedger::new();
        entries.iter().for_each(|e| ledger.apply_entry(e).unwrap());
        assert_eq!(ledger.residual(EntityRef::Business(business_id)), Decimal::ZERO);
        assert_eq!(ledger.residual(EntityRef::TaxCategory(fee_category)), dec!(-15));
    }
}
