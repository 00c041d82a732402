//! Ledger entry drafts produced by the engine.

use chrono::NaiveDate;
use ledgergen_shared::types::{BusinessId, ChargeId, Currency, TaxCategoryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::charge::Charge;

/// One side of a ledger entry.
///
/// Businesses are counterparties and must net to zero once a charge is fully
/// booked. Tax categories are accounting buckets and may carry balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    /// A business entity.
    Business(BusinessId),
    /// A tax category.
    TaxCategory(TaxCategoryId),
}

impl EntityRef {
    /// Returns true for business entities.
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(self, Self::Business(_))
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Business(id) => write!(f, "business:{id}"),
            Self::TaxCategory(id) => write!(f, "tax-category:{id}"),
        }
    }
}

/// A transaction-shaped entry whose account sides are not assigned yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialEntry {
    /// Source id.
    pub id: String,
    /// Invoice (event) date.
    pub invoice_date: NaiveDate,
    /// Value date.
    pub value_date: NaiveDate,
    /// Source currency.
    pub currency: Currency,
    /// Absolute amount in source currency; `None` for local-currency sources.
    pub foreign_amount: Option<Decimal>,
    /// Absolute amount in local currency.
    pub local_amount: Decimal,
    /// Free text.
    pub description: Option<String>,
    /// External reference.
    pub reference1: Option<String>,
    /// Whether the counterparty sits on the credit side.
    pub is_creditor_counterparty: bool,
    /// Owner of the books.
    pub owner_id: BusinessId,
    /// Source charge.
    pub charge_id: ChargeId,
    /// Rate used for conversion, when foreign.
    pub currency_rate: Option<Decimal>,
}

impl PartialEntry {
    /// Places `counterparty` and `own_account` on their sides by orientation.
    #[must_use]
    pub fn assign(self, counterparty: EntityRef, own_account: EntityRef) -> LedgerEntryDraft {
        let (credit, debit) = if self.is_creditor_counterparty {
            (counterparty, own_account)
        } else {
            (own_account, counterparty)
        };

        LedgerEntryDraft {
            id: self.id,
            invoice_date: self.invoice_date,
            value_date: self.value_date,
            currency: self.currency,
            credit_account_id1: credit,
            credit_amount1: self.foreign_amount,
            local_currency_credit_amount1: self.local_amount,
            debit_account_id1: debit,
            debit_amount1: self.foreign_amount,
            local_currency_debit_amount1: self.local_amount,
            credit_account_id2: None,
            credit_amount2: None,
            local_currency_credit_amount2: None,
            debit_account_id2: None,
            debit_amount2: None,
            local_currency_debit_amount2: None,
            description: self.description,
            reference1: self.reference1,
            is_creditor_counterparty: self.is_creditor_counterparty,
            owner_id: self.owner_id,
            charge_id: self.charge_id,
            currency_rate: self.currency_rate,
        }
    }
}

/// A proposed double-entry ledger row.
///
/// Slot 1 is always self-balanced. Slot 2, when present, is also
/// self-balanced and carries the VAT or auxiliary carve-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntryDraft {
    /// Source transaction/document id, or a synthetic id for derived entries.
    pub id: String,
    /// Invoice date.
    pub invoice_date: NaiveDate,
    /// Value date.
    pub value_date: NaiveDate,
    /// Entry currency.
    pub currency: Currency,
    /// Main credit account.
    pub credit_account_id1: EntityRef,
    /// Main credit amount in entry currency (foreign entries only).
    pub credit_amount1: Option<Decimal>,
    /// Main credit amount in local currency.
    pub local_currency_credit_amount1: Decimal,
    /// Main debit account.
    pub debit_account_id1: EntityRef,
    /// Main debit amount in entry currency (foreign entries only).
    pub debit_amount1: Option<Decimal>,
    /// Main debit amount in local currency.
    pub local_currency_debit_amount1: Decimal,
    /// Auxiliary credit account.
    pub credit_account_id2: Option<EntityRef>,
    /// Auxiliary credit amount in entry currency.
    pub credit_amount2: Option<Decimal>,
    /// Auxiliary credit amount in local currency.
    pub local_currency_credit_amount2: Option<Decimal>,
    /// Auxiliary debit account.
    pub debit_account_id2: Option<EntityRef>,
    /// Auxiliary debit amount in entry currency.
    pub debit_amount2: Option<Decimal>,
    /// Auxiliary debit amount in local currency.
    pub local_currency_debit_amount2: Option<Decimal>,
    /// Free text.
    pub description: Option<String>,
    /// External reference.
    pub reference1: Option<String>,
    /// Whether the counterparty sits on the credit side.
    pub is_creditor_counterparty: bool,
    /// Owner of the books.
    pub owner_id: BusinessId,
    /// Source charge.
    pub charge_id: ChargeId,
    /// Conversion rate, when foreign.
    pub currency_rate: Option<Decimal>,
}

impl LedgerEntryDraft {
    /// A local-currency entry moving `amount` from `debit` to `credit`.
    #[must_use]
    pub fn synthetic(
        id: impl Into<String>,
        charge: &Charge,
        date: NaiveDate,
        currency: Currency,
        credit: EntityRef,
        debit: EntityRef,
        amount: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            invoice_date: date,
            value_date: date,
            currency,
            credit_account_id1: credit,
            credit_amount1: None,
            local_currency_credit_amount1: amount,
            debit_account_id1: debit,
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
            is_creditor_counterparty: false,
            owner_id: charge.owner_id,
            charge_id: charge.id,
            currency_rate: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the counterparty orientation flag.
    #[must_use]
    pub fn with_creditor_counterparty(mut self, is_creditor_counterparty: bool) -> Self {
        self.is_creditor_counterparty = is_creditor_counterparty;
        self
    }

    /// Fills slot 2 with a self-balanced pair.
    #[must_use]
    pub fn with_slot2(
        mut self,
        credit: EntityRef,
        debit: EntityRef,
        local_amount: Decimal,
        foreign_amount: Option<Decimal>,
    ) -> Self {
        self.credit_account_id2 = Some(credit);
        self.debit_account_id2 = Some(debit);
        self.local_currency_credit_amount2 = Some(local_amount);
        self.local_currency_debit_amount2 = Some(local_amount);
        self.credit_amount2 = foreign_amount;
        self.debit_amount2 = foreign_amount;
        self
    }

    /// Carves an auxiliary amount (VAT, withholding) into slot 2.
    ///
    /// The counterparty keeps its slot-1 side; `auxiliary` takes the own side.
    #[must_use]
    pub fn with_auxiliary_split(
        self,
        auxiliary: EntityRef,
        local_amount: Decimal,
        foreign_amount: Option<Decimal>,
    ) -> Self {
        let counterparty = self.counterparty_account();
        if self.is_creditor_counterparty {
            self.with_slot2(counterparty, auxiliary, local_amount, foreign_amount)
        } else {
            self.with_slot2(auxiliary, counterparty, local_amount, foreign_amount)
        }
    }

    /// Slot-1 local amount.
    #[must_use]
    pub fn local_amount(&self) -> Decimal {
        self.local_currency_credit_amount1
    }

    /// Slot-1 foreign amount.
    #[must_use]
    pub fn foreign_amount(&self) -> Option<Decimal> {
        self.credit_amount1
    }

    /// The counterparty side of slot 1.
    #[must_use]
    pub fn counterparty_account(&self) -> EntityRef {
        if self.is_creditor_counterparty {
            self.credit_account_id1
        } else {
            self.debit_account_id1
        }
    }

    /// The own (non-counterparty) side of slot 1.
    #[must_use]
    pub fn own_account(&self) -> EntityRef {
        if self.is_creditor_counterparty {
            self.debit_account_id1
        } else {
            self.credit_account_id1
        }
    }

    /// Replaces the counterparty side of slot 1.
    #[must_use]
    pub fn with_counterparty(mut self, account: EntityRef) -> Self {
        if self.is_creditor_counterparty {
            self.credit_account_id1 = account;
        } else {
            self.debit_account_id1 = account;
        }
        self
    }

    /// Replaces the own side of slot 1.
    #[must_use]
    pub fn with_own_account(mut self, account: EntityRef) -> Self {
        if self.is_creditor_counterparty {
            self.debit_account_id1 = account;
        } else {
            self.credit_account_id1 = account;
        }
        self
    }

    /// Whether slot 2 is in use.
    #[must_use]
    pub fn has_slot2(&self) -> bool {
        self.credit_account_id2.is_some() || self.debit_account_id2.is_some()
    }

    /// Removes slot 2, returning the entry with slot 1 only.
    #[must_use]
    pub fn without_slot2(mut self) -> Self {
        self.credit_account_id2 = None;
        self.debit_account_id2 = None;
        self.credit_amount2 = None;
        self.debit_amount2 = None;
        self.local_currency_credit_amount2 = None;
        self.local_currency_debit_amount2 = None;
        self
    }

    /// Whether both slots balance locally.
    #[must_use]
    pub fn is_self_balanced(&self) -> bool {
        self.local_currency_credit_amount1 == self.local_currency_debit_amount1
            && self.local_currency_credit_amount2 == self.local_currency_debit_amount2
    }

    /// Total local amount across both slots.
    #[must_use]
    pub fn total_local_amount(&self) -> Decimal {
        self.local_currency_credit_amount1 + self.local_currency_credit_amount2.unwrap_or_default()
    }
}
