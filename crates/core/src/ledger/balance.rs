//! Per-run balance tracking across entities.
//!
//! Credits add to an entity's residual, debits subtract from it. Once all
//! entries of a charge are applied, every business must net to zero.
//! Updates use checked arithmetic and fail instead of overflowing.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::GenerationError;
use super::types::{EntityRef, LedgerEntryDraft};

/// Residuals at or below this magnitude count as zero.
pub const BALANCE_EPSILON: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// One entity's net local-currency position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityResidual {
    /// The entity.
    pub entity: EntityRef,
    /// Credit minus debit.
    pub amount: Decimal,
}

/// Result of a balance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDiagnostics {
    /// True when the sum is zero and no non-allow-listed business carries a residual.
    pub balanced: bool,
    /// Sum of all residuals.
    pub sum: Decimal,
    /// Every entity's residual, ordered by entity.
    pub residuals: Vec<EntityResidual>,
    /// Businesses with a non-zero residual that are not allow-listed.
    pub unbalanced_entities: Vec<EntityRef>,
    /// Allow-listed businesses that ended with a residual.
    pub allowed_unbalanced: Vec<EntityRef>,
}

impl BalanceDiagnostics {
    /// Residual for one entity, zero when untouched.
    #[must_use]
    pub fn residual(&self, entity: EntityRef) -> Decimal {
        self.residuals
            .iter()
            .find(|r| r.entity == entity)
            .map_or(Decimal::ZERO, |r| r.amount)
    }
}

/// Running per-entity residuals for one generation run.
#[derive(Debug, Default, Clone)]
pub struct BalanceLedger {
    residuals: BTreeMap<EntityRef, Decimal>,
    total: Decimal,
}

impl BalanceLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a credit to an entity.
    pub fn credit(&mut self, entity: EntityRef, amount: Decimal) -> Result<(), GenerationError> {
        self.shift(entity, amount)
    }

    /// Adds a debit to an entity.
    pub fn debit(&mut self, entity: EntityRef, amount: Decimal) -> Result<(), GenerationError> {
        self.shift(entity, -amount)
    }

    fn shift(&mut self, entity: EntityRef, delta: Decimal) -> Result<(), GenerationError> {
        let overflow = || GenerationError::overflow(entity.to_string());
        let residual = self
            .residual(entity)
            .checked_add(delta)
            .ok_or_else(overflow)?;
        let total = self.total.checked_add(delta).ok_or_else(overflow)?;

        self.residuals.insert(entity, residual);
        self.total = total;
        Ok(())
    }

    /// Applies both slots of an entry.
    pub fn apply_entry(&mut self, entry: &LedgerEntryDraft) -> Result<(), GenerationError> {
        self.credit(entry.credit_account_id1, entry.local_currency_credit_amount1)?;
        self.debit(entry.debit_account_id1, entry.local_currency_debit_amount1)?;

        if let (Some(account), Some(amount)) =
            (entry.credit_account_id2, entry.local_currency_credit_amount2)
        {
            self.credit(account, amount)?;
        }
        if let (Some(account), Some(amount)) =
            (entry.debit_account_id2, entry.local_currency_debit_amount2)
        {
            self.debit(account, amount)?;
        }
        Ok(())
    }

    /// Current residual of an entity.
    #[must_use]
    pub fn residual(&self, entity: EntityRef) -> Decimal {
        self.residuals.get(&entity).copied().unwrap_or_default()
    }

    /// Sum of all residuals.
    #[must_use]
    pub fn sum(&self) -> Decimal {
        self.total
    }

    /// Businesses whose residual exceeds the tolerance.
    #[must_use]
    pub fn unbalanced_businesses(&self) -> Vec<(EntityRef, Decimal)> {
        self.residuals
            .iter()
            .filter(|(entity, amount)| entity.is_business() && amount.abs() > BALANCE_EPSILON)
            .map(|(entity, amount)| (*entity, *amount))
            .collect()
    }

    /// Checks the ledger, tolerating residuals on allow-listed entities.
    #[must_use]
    pub fn check_balance(&self, allow_list: &[EntityRef]) -> BalanceDiagnostics {
        let sum = self.sum();
        let mut unbalanced_entities = Vec::new();
        let mut allowed_unbalanced = Vec::new();

        for (entity, amount) in self.unbalanced_businesses() {
            if allow_list.contains(&entity) {
                warn!(%entity, residual = %amount, "allow-listed entity left unbalanced");
                allowed_unbalanced.push(entity);
            } else {
                unbalanced_entities.push(entity);
            }
        }

        BalanceDiagnostics {
            balanced: sum.abs() < BALANCE_EPSILON && unbalanced_entities.is_empty(),
            sum,
            residuals: self
                .residuals
                .iter()
                .map(|(entity, amount)| EntityResidual {
                    entity: *entity,
                    amount: *amount,
                })
                .collect(),
            unbalanced_entities,
            allowed_unbalanced,
        }
    }

    /// Like [`check_balance`](Self::check_balance) but fails on imbalance.
    pub fn ensure_balanced(&self, allow_list: &[EntityRef]) -> Result<BalanceDiagnostics, GenerationError> {
        let diagnostics = self.check_balance(allow_list);
        if diagnostics.balanced {
            Ok(diagnostics)
        } else {
            Err(imbalance_error(&diagnostics))
        }
    }
}

/// Builds the imbalance error for a failed check.
#[must_use]
pub fn imbalance_error(diagnostics: &BalanceDiagnostics) -> GenerationError {
    GenerationError::LedgerImbalance {
        sum: diagnostics.sum,
        entities: diagnostics
            .unbalanced_entities
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}
