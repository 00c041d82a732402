//! Charge, transaction and document types.

use std::str::FromStr;

use chrono::NaiveDate;
use ledgergen_shared::types::{
    BusinessId, BusinessTripExpenseId, BusinessTripId, ChargeId, Currency, DocumentId,
    FinancialAccountId, Money, TaxCategoryId, TransactionId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The closed set of charge variants, each bound to one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    /// Any charge without special treatment.
    Common,
    /// Money moved between two of the owner's financial accounts.
    InternalTransfer,
    /// Dividend distribution to shareholders.
    Dividend,
    /// Monthly VAT settlement with the authority.
    MonthlyVat,
    /// Business trip expenses.
    BusinessTrip,
}

impl std::fmt::Display for ChargeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Common => "common",
            Self::InternalTransfer => "internal_transfer",
            Self::Dividend => "dividend",
            Self::MonthlyVat => "monthly_vat",
            Self::BusinessTrip => "business_trip",
        };
        f.write_str(name)
    }
}

/// A grouping of transactions and documents describing one financial event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    /// Charge ID.
    pub id: ChargeId,
    /// The business whose books are generated.
    pub owner_id: BusinessId,
    /// Which generator handles this charge.
    pub charge_type: ChargeType,
    /// Free text entered by the user (monthly VAT charges encode the month here).
    #[serde(default)]
    pub user_description: Option<String>,
    /// Expense/income category of the charge.
    #[serde(default)]
    pub tax_category_id: Option<TaxCategoryId>,
}

/// A bank or card transaction as delivered by the transactions provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// The charge this transaction belongs to.
    pub charge_id: ChargeId,
    /// The financial account the money moved through.
    pub account_id: FinancialAccountId,
    /// Counterparty business, when known.
    #[serde(default)]
    pub business_id: Option<BusinessId>,
    /// Signed decimal string; negative means money left the account.
    pub amount: String,
    /// Transaction currency.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Event date.
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    /// Debit (value) date, when different from the event date.
    #[serde(default)]
    pub debit_date: Option<NaiveDate>,
    /// Whether this transaction is a bank/card fee.
    #[serde(default)]
    pub is_fee: bool,
    /// Description as provided by the bank.
    #[serde(default)]
    pub source_description: Option<String>,
    /// Conversion rate the bank applied, if any. Informational only.
    #[serde(default)]
    pub currency_rate: Option<Decimal>,
}

impl Transaction {
    /// Parses the signed amount, returning `None` when it is not a number.
    #[must_use]
    pub fn parsed_amount(&self) -> Option<Decimal> {
        Decimal::from_str(self.amount.trim()).ok()
    }

    /// The date the money actually moved.
    #[must_use]
    pub fn value_date(&self) -> Option<NaiveDate> {
        self.debit_date.or(self.event_date)
    }
}

/// Accounting document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Tax invoice.
    Invoice,
    /// Payment receipt.
    Receipt,
    /// Combined invoice and receipt.
    InvoiceReceipt,
    /// Credit note cancelling (part of) an invoice.
    CreditInvoice,
    /// Pro-forma; never booked.
    Proforma,
    /// Not yet classified; never booked.
    Unprocessed,
}

impl DocumentType {
    /// Invoice-like documents that create accounting entries on their own.
    #[must_use]
    pub const fn is_invoice(self) -> bool {
        matches!(self, Self::Invoice | Self::InvoiceReceipt | Self::CreditInvoice)
    }
}

/// An accounting document attached to a charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document ID.
    pub id: DocumentId,
    /// The charge this document belongs to.
    pub charge_id: ChargeId,
    /// Document kind.
    pub document_type: DocumentType,
    /// Serial number printed on the document.
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Document date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Total amount including VAT.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    /// Document currency.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// VAT included in the total.
    #[serde(default)]
    pub vat_amount: Option<Decimal>,
    /// Issuer of the document.
    #[serde(default)]
    pub creditor_id: Option<BusinessId>,
    /// Recipient of the document.
    #[serde(default)]
    pub debtor_id: Option<BusinessId>,
}

/// Per-charge, per-fiscal-year allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSpreadRecord {
    /// The spread charge.
    pub charge_id: ChargeId,
    /// Fiscal year the allocated amount belongs to.
    pub year_of_relevance: i32,
    /// Explicit local amount; `None` takes an even share of the remainder.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// One VAT line from the VAT records provider, in local currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatRecordRow {
    /// Source document, when known.
    #[serde(default)]
    pub document_id: Option<DocumentId>,
    /// Document date.
    pub date: NaiveDate,
    /// VAT amount in local currency.
    pub local_vat_amount: Decimal,
}

/// Aggregate VAT report rows for an owner and period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VatRecords {
    /// Output VAT rows (income documents).
    pub income: Vec<VatRecordRow>,
    /// Input VAT rows (expense documents).
    pub expenses: Vec<VatRecordRow>,
}

impl VatRecords {
    /// Total output VAT, `None` on overflow.
    #[must_use]
    pub fn income_total(&self) -> Option<Decimal> {
        checked_total(&self.income)
    }

    /// Total input VAT, `None` on overflow.
    #[must_use]
    pub fn expenses_total(&self) -> Option<Decimal> {
        checked_total(&self.expenses)
    }
}

fn checked_total(rows: &[VatRecordRow]) -> Option<Decimal> {
    rows.iter()
        .try_fold(Decimal::ZERO, |total, row| total.checked_add(row.local_vat_amount))
}

/// A business trip attached to a charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTrip {
    /// Trip ID.
    pub id: BusinessTripId,
    /// The charge booking the trip.
    pub charge_id: ChargeId,
    /// Trip name.
    pub name: String,
    /// Category overriding the default business trip category.
    #[serde(default)]
    pub tax_category_id: Option<TaxCategoryId>,
}

/// Business trip expense categories, each with its own loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripExpenseCategory {
    /// Flights.
    Flight,
    /// Hotels and other accommodation.
    Accommodation,
    /// Local travel and per-diem subsistence.
    TravelAndSubsistence,
    /// Anything else.
    Other,
}

impl std::fmt::Display for TripExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Flight => "Flight",
            Self::Accommodation => "Accommodation",
            Self::TravelAndSubsistence => "Travel and subsistence",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// An expense an employee paid out of pocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeePayment {
    /// The employee's business entity.
    pub employee_business_id: BusinessId,
    /// Payment date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount and currency paid.
    pub amount: Money,
}

/// A single business trip expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTripExpense {
    /// Expense ID.
    pub id: BusinessTripExpenseId,
    /// The trip this expense belongs to.
    pub business_trip_id: BusinessTripId,
    /// Expense category.
    pub category: TripExpenseCategory,
    /// Transactions that paid for the expense.
    #[serde(default)]
    pub transaction_ids: Vec<TransactionId>,
    /// Out-of-pocket payment by an employee.
    #[serde(default)]
    pub employee_payment: Option<EmployeePayment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn make_transaction(amount: &str) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            charge_id: ChargeId::new(),
            account_id: FinancialAccountId::new(),
            business_id: None,
            amount: amount.to_string(),
            currency: Some(Currency::Ils),
            event_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            debit_date: None,
            is_fee: false,
            source_description: None,
            currency_rate: None,
        }
    }

    #[rstest]
    #[case("-500", Some(dec!(-500)))]
    #[case(" 1800.25 ", Some(dec!(1800.25)))]
    #[case("0", Some(dec!(0)))]
    #[case("abc", None)]
    #[case("", None)]
    fn test_parsed_amount(#[case] raw: &str, #[case] expected: Option<Decimal>) {
        assert_eq!(make_transaction(raw).parsed_amount(), expected);
    }

    #[test]
    fn test_value_date_prefers_debit_date() {
        let mut tx = make_transaction("1");
        assert_eq!(tx.value_date(), NaiveDate::from_ymd_opt(2024, 1, 10));
        tx.debit_date = NaiveDate::from_ymd_opt(2024, 1, 12);
        assert_eq!(tx.value_date(), NaiveDate::from_ymd_opt(2024, 1, 12));
    }

    #[test]
    fn test_vat_record_totals() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let records = VatRecords {
            income: vec![
                VatRecordRow { document_id: None, date, local_vat_amount: dec!(600.004) },
                VatRecordRow { document_id: None, date, local_vat_amount: dec!(400) },
            ],
            expenses: vec![VatRecordRow { document_id: None, date, local_vat_amount: dec!(400.001) }],
        };
        assert_eq!(records.income_total(), Some(dec!(1000.004)));
        assert_eq!(records.expenses_total(), Some(dec!(400.001)));
    }

    #[test]
    fn test_vat_totals_overflow() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let row = VatRecordRow { document_id: None, date, local_vat_amount: Decimal::MAX };
        let records = VatRecords { income: vec![row.clone(), row], expenses: vec![] };

        assert_eq!(records.income_total(), None);
        assert_eq!(records.expenses_total(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_invoice_document_types() {
        assert!(DocumentType::Invoice.is_invoice());
        assert!(DocumentType::CreditInvoice.is_invoice());
        assert!(!DocumentType::Receipt.is_invoice());
        assert!(!DocumentType::Proforma.is_invoice());
    }
}
