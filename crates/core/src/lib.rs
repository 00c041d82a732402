//! Ledger generation engine.
//!
//! Turns charges (transactions, documents and their metadata) into balanced
//! double-entry ledger records. This crate has no web or database
//! dependencies; everything it reads or writes goes through [`providers`].
//!
//! # Modules
//!
//! - `charge` - Input types: charges, transactions, documents, trips
//! - `currency` - Conversion to the local currency and amount allocation
//! - `ledger` - Entry drafts, balance tracking and cross-year spreading
//! - `generation` - Per-charge-type generators and the dispatcher
//! - `providers` - Collaborator traits and an in-memory implementation

pub mod charge;
pub mod currency;
pub mod generation;
pub mod ledger;
pub mod providers;

pub use generation::{GenerateOptions, GeneratedLedger, LedgerGenerationService};
