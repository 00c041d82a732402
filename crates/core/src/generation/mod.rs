//! Ledger generation per charge type.
//!
//! Each [`ChargeType`](crate::charge::ChargeType) has one generator. The
//! dispatcher picks it and converts failures into the boundary error.

pub mod business_trip;
pub mod common;
pub mod context;
pub mod dispatcher;
pub mod dividend;
pub mod fees;
pub mod financial;
pub mod internal_transfer;
pub mod monthly_vat;
pub mod result;


use async_trait::async_trait;

use crate::charge::Charge;
use crate::ledger::GenerationError;

pub use business_trip::BusinessTripGenerator;
pub use common::CommonGenerator;
pub use context::GenerationContext;
pub use dispatcher::{GenerateOptions, LedgerGenerationService};
pub use dividend::DividendGenerator;
pub use internal_transfer::{EXCHANGE_RECORD_DESCRIPTION, InternalTransferGenerator};
pub use monthly_vat::MonthlyVatGenerator;
pub use result::{GeneratedLedger, LedgerAccumulator};

/// Builds the ledger records of one charge type.
#[async_trait]
pub trait ChargeLedgerGenerator: Send + Sync {
    /// Generates records for `charge`.
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        charge: &Charge,
    ) -> Result<GeneratedLedger, GenerationError>;
}
