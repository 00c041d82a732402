//! Double-entry ledger records and the rules that keep them balanced.
//!
//! - Entry drafts and the account references they point to
//! - Transaction to partial entry conversion
//! - Per-run balance tracking
//! - Cross-year spreading
//! - Generation error types

pub mod balance;
pub mod entry;
pub mod error;
pub mod spread;
pub mod types;

#[cfg(test)]
mod spread_props;

pub use balance::{BALANCE_EPSILON, BalanceDiagnostics, BalanceLedger, EntityResidual};
pub use entry::{RequiredFields, build_partial_entry, required_fields};
pub use error::GenerationError;
pub use spread::{apply_spread, spread_entry};
pub use types::{EntityRef, LedgerEntryDraft, PartialEntry};
