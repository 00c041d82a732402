//! Errors raised while generating ledger records for a charge.
//!
//! Generators return these for fatal conditions. Soft conditions are
//! collected as strings on the generated ledger instead.

use chrono::NaiveDate;
use ledgergen_shared::types::{ChargeId, Currency, TransactionId};
use ledgergen_shared::CommonError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::providers::ProviderError;

/// Errors that can occur during ledger generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    // ========== Input Errors ==========
    /// A field needed to build an entry is absent or unparsable.
    #[error("{entity} is missing required field: {field}")]
    MissingRequiredField {
        /// Entity description, e.g. "Transaction <id>".
        entity: String,
        /// Field name.
        field: &'static str,
    },

    /// Withholding transactions resolved to more than one tax category.
    #[error("Withholding tax transactions resolve to inconsistent tax categories")]
    InconsistentTaxCategory,

    /// Dividend payments must be in local currency.
    #[error("Dividend payment transaction {transaction_id} is in {currency}, only local currency is supported")]
    ForeignPaymentUnsupported {
        /// Offending transaction.
        transaction_id: TransactionId,
        /// Its currency.
        currency: Currency,
    },

    // ========== Currency Errors ==========
    /// No usable exchange rate.
    #[error("No exchange rate found for {currency} to {target} on {date}")]
    RateUnavailable {
        /// Source currency.
        currency: Currency,
        /// Target (local) currency.
        target: Currency,
        /// Requested date.
        date: NaiveDate,
    },

    /// An amount left the representable decimal range.
    #[error("Amount overflow while booking {entity}")]
    AmountOverflow {
        /// Entity description, e.g. "Transaction <id>".
        entity: String,
    },

    // ========== Spread Errors ==========
    /// Spreading is only supported for a single accounting entry.
    #[error("Cross-year spreading supports a single accounting entry, found {entries}")]
    UnsupportedSplit {
        /// Number of accounting entries found.
        entries: usize,
    },

    /// Explicit spread amounts exceed the entry amount.
    #[error("Spread amount {amount} exceeds entry total {total}")]
    PartialAmountExceedsTotal {
        /// Requested amount (or running sum).
        amount: Decimal,
        /// Absolute entry amount.
        total: Decimal,
    },

    // ========== Balance Errors ==========
    /// The generated records do not net to zero.
    #[error("Ledger is not balanced. Sum: {sum}, unbalanced entities: [{}]", .entities.join(", "))]
    LedgerImbalance {
        /// Total residual.
        sum: Decimal,
        /// Unbalanced entities, rendered.
        entities: Vec<String>,
    },

    /// The charge's inputs have an unexpected shape.
    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    // ========== Collaborator Errors ==========
    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl GenerationError {
    /// Returns the error code for boundary responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            Self::InconsistentTaxCategory => "INCONSISTENT_TAX_CATEGORY",
            Self::ForeignPaymentUnsupported { .. } => "FOREIGN_PAYMENT_UNSUPPORTED",
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            Self::UnsupportedSplit { .. } => "UNSUPPORTED_SPLIT",
            Self::PartialAmountExceedsTotal { .. } => "PARTIAL_AMOUNT_EXCEEDS_TOTAL",
            Self::LedgerImbalance { .. } => "LEDGER_IMBALANCE",
            Self::StructuralViolation(_) => "STRUCTURAL_VIOLATION",
            Self::Provider(_) => "PROVIDER_ERROR",
        }
    }

    /// Shorthand for a missing field on a transaction.
    #[must_use]
    pub fn missing_transaction_field(id: TransactionId, field: &'static str) -> Self {
        Self::MissingRequiredField {
            entity: format!("Transaction {id}"),
            field,
        }
    }

    /// Shorthand for an amount overflow.
    #[must_use]
    pub fn overflow(entity: impl Into<String>) -> Self {
        Self::AmountOverflow {
            entity: entity.into(),
        }
    }

    /// Converts into the boundary error, naming the charge.
    #[must_use]
    pub fn into_common(self, charge_id: ChargeId) -> CommonError {
        CommonError::new(
            self.error_code(),
            format!("Failed to generate ledger records for charge {charge_id}: {self}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GenerationError::InconsistentTaxCategory.error_code(),
            "INCONSISTENT_TAX_CATEGORY"
        );
        assert_eq!(
            GenerationError::UnsupportedSplit { entries: 2 }.error_code(),
            "UNSUPPORTED_SPLIT"
        );
        assert_eq!(
            GenerationError::overflow("Transaction t-1").error_code(),
            "AMOUNT_OVERFLOW"
        );
        assert_eq!(
            GenerationError::Provider(ProviderError::Backend("down".into())).error_code(),
            "PROVIDER_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = GenerationError::RateUnavailable {
            currency: Currency::Usd,
            target: Currency::Ils,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };
        assert_eq!(err.to_string(), "No exchange rate found for USD to ILS on 2024-01-15");

        let err = GenerationError::LedgerImbalance {
            sum: dec!(10),
            entities: vec!["business:a".into(), "business:b".into()],
        };
        assert_eq!(
            err.to_string(),
            "Ledger is not balanced. Sum: 10, unbalanced entities: [business:a, business:b]"
        );
    }

    #[test]
    fn test_overflow_display() {
        let err = GenerationError::overflow("business:a");
        assert_eq!(err.to_string(), "Amount overflow while booking business:a");
    }

    #[test]
    fn test_into_common_names_charge() {
        let charge_id = ChargeId::new();
        let err = GenerationError::StructuralViolation("expected 2 transactions".into())
            .into_common(charge_id);

        assert_eq!(err.code, "STRUCTURAL_VIOLATION");
        assert!(err.message.contains(&charge_id.to_string()));
        assert!(err.message.contains("expected 2 transactions"));
    }
}
