//! Input entities the engine reads from its collaborators.
//!
//! Charges group transactions, documents and type-specific metadata
//! (business trips, VAT months, spread records). The engine never mutates them.

pub mod types;

pub use types::{
    BusinessTrip, BusinessTripExpense, Charge, ChargeSpreadRecord, ChargeType, Document,
    DocumentType, EmployeePayment, Transaction, TripExpenseCategory, VatRecordRow, VatRecords,
};
