//! The uniform generation result.

use std::collections::BTreeSet;

use ledgergen_shared::types::ChargeId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ledger::balance::imbalance_error;
use crate::ledger::{BalanceDiagnostics, BalanceLedger, EntityRef, GenerationError, LedgerEntryDraft};

/// Records generated for one charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLedger {
    /// The charge.
    pub charge_id: ChargeId,
    /// Generated entries, in generation order.
    pub records: Vec<LedgerEntryDraft>,
    /// Final balance check.
    pub balance: BalanceDiagnostics,
    /// Non-fatal problems, deduplicated and sorted.
    pub errors: Vec<String>,
}

/// Collects entries while keeping the balance ledger in step.
#[derive(Debug)]
pub struct LedgerAccumulator {
    charge_id: ChargeId,
    records: Vec<LedgerEntryDraft>,
    balance: BalanceLedger,
    errors: BTreeSet<String>,
}

impl LedgerAccumulator {
    /// Starts an empty run for a charge.
    #[must_use]
    pub fn new(charge_id: ChargeId) -> Self {
        Self {
            charge_id,
            records: Vec::new(),
            balance: BalanceLedger::new(),
            errors: BTreeSet::new(),
        }
    }

    /// Adds an entry and applies it to the balance.
    pub fn push(&mut self, entry: LedgerEntryDraft) -> Result<(), GenerationError> {
        self.balance.apply_entry(&entry)?;
        self.records.push(entry);
        Ok(())
    }

    /// Adds several entries in order.
    pub fn extend(
        &mut self,
        entries: impl IntoIterator<Item = LedgerEntryDraft>,
    ) -> Result<(), GenerationError> {
        for entry in entries {
            self.push(entry)?;
        }
        Ok(())
    }

    /// Records a non-fatal problem.
    pub fn soft_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(charge_id = %self.charge_id, %message, "ledger generation issue");
        self.errors.insert(message);
    }

    /// The running balance.
    #[must_use]
    pub fn balance(&self) -> &BalanceLedger {
        &self.balance
    }

    /// Entries collected so far.
    #[must_use]
    pub fn records(&self) -> &[LedgerEntryDraft] {
        &self.records
    }

    /// Runs the final balance check.
    ///
    /// In strict mode an imbalance is fatal; otherwise it becomes a soft error.
    pub fn finish(
        mut self,
        allow_list: &[EntityRef],
        strict: bool,
    ) -> Result<GeneratedLedger, GenerationError> {
        let balance = self.balance.check_balance(allow_list);
        if !balance.balanced {
            let err = imbalance_error(&balance);
            if strict {
                return Err(err);
            }
            self.soft_error(err.to_string());
        }

        info!(
            charge_id = %self.charge_id,
            records = self.records.len(),
            soft_errors = self.errors.len(),
            balanced = balance.balanced,
            "ledger generated"
        );

        Ok(GeneratedLedger {
            charge_id: self.charge_id,
            records: self.records,
            balance,
            errors: self.errors.into_iter().collect(),
        })
    }
}
