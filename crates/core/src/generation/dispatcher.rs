//! Generation entry point.

use std::sync::Arc;

use futures::future::join_all;
use ledgergen_shared::types::ChargeId;
use ledgergen_shared::{CommonError, EngineConfig};
use tracing::{debug, instrument, warn};

use super::context::GenerationContext;
use super::result::GeneratedLedger;
use super::{
    BusinessTripGenerator, ChargeLedgerGenerator, CommonGenerator, DividendGenerator,
    InternalTransferGenerator, MonthlyVatGenerator,
};
use crate::charge::{Charge, ChargeType};
use crate::providers::Providers;

/// Options for a generation call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Persist the generated records through the configured storage.
    pub insert: bool,
}

/// Generates ledger records for charges.
#[derive(Debug, Clone)]
pub struct LedgerGenerationService {
    config: Arc<EngineConfig>,
    providers: Providers,
}

impl LedgerGenerationService {
    /// Creates the service.
    #[must_use]
    pub fn new(config: Arc<EngineConfig>, providers: Providers) -> Self {
        Self { config, providers }
    }

    /// The generator responsible for a charge type.
    #[must_use]
    pub fn generator_for(charge_type: ChargeType) -> &'static dyn ChargeLedgerGenerator {
        match charge_type {
            ChargeType::Common => &CommonGenerator,
            ChargeType::InternalTransfer => &InternalTransferGenerator,
            ChargeType::Dividend => &DividendGenerator,
            ChargeType::MonthlyVat => &MonthlyVatGenerator,
            ChargeType::BusinessTrip => &BusinessTripGenerator,
        }
    }

    /// Generates, and optionally stores, the records of one charge.
    #[instrument(skip_all, fields(charge_id = %charge.id, charge_type = %charge.charge_type))]
    pub async fn generate(
        &self,
        charge: &Charge,
        options: GenerateOptions,
    ) -> Result<GeneratedLedger, CommonError> {
        let ctx = GenerationContext::new(&self.config, &self.providers);

        let ledger = Self::generator_for(charge.charge_type)
            .generate(&ctx, charge)
            .await
            .map_err(|err| {
                warn!(error = %err, code = err.error_code(), "ledger generation failed");
                err.into_common(charge.id)
            })?;
        debug!(records = ledger.records.len(), "generated ledger records");

        if options.insert {
            self.store(charge, &ledger).await?;
        }
        Ok(ledger)
    }

    /// Generates several charges concurrently; results keep input order.
    pub async fn generate_many(
        &self,
        charges: &[Charge],
        options: GenerateOptions,
    ) -> Vec<Result<GeneratedLedger, CommonError>> {
        join_all(charges.iter().map(|charge| self.generate(charge, options))).await
    }

    async fn store(&self, charge: &Charge, ledger: &GeneratedLedger) -> Result<(), CommonError> {
        let Some(storage) = &self.providers.storage else {
            return Err(storage_error(charge.id, "no ledger storage configured"));
        };
        storage
            .store_records(charge, &ledger.records)
            .await
            .map_err(|err| {
                warn!(error = %err, "failed to store ledger records");
                storage_error(charge.id, &err.to_string())
            })?;
        debug!(records = ledger.records.len(), "stored ledger records");
        Ok(())
    }
}

fn storage_error(charge_id: ChargeId, reason: &str) -> CommonError {
    CommonError::new(
        "STORAGE_ERROR",
        format!("Failed to store ledger records for charge {charge_id}: {reason}"),
    )
}
