//! Ledger generation runner.
//!
//! Reads a JSON fixture of charges and their inputs, generates the ledger
//! records of every charge and prints the results as JSON.
//!
//! ```text
//! ledgergen <FIXTURE> [--insert]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgergen_core::providers::{InMemoryProviders, Providers};
use ledgergen_core::{GenerateOptions, GeneratedLedger, LedgerGenerationService};
use ledgergen_shared::types::ChargeId;
use ledgergen_shared::{CommonError, EngineConfig};

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ChargeReport {
    Generated(GeneratedLedger),
    Failed { charge_id: ChargeId, error: CommonError },
}

/// Generates ledger records for every charge in a fixture.
#[derive(Parser, Debug)]
#[command(name = "ledgergen", version, about, long_about = None)]
struct Args {
    /// JSON fixture with charges and their inputs
    fixture: PathBuf,

    /// Store the generated records through the fixture's storage
    #[arg(long)]
    insert: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ledgergen=debug,ledgergen_core=debug".into());

    // Records go to stdout, so logs go to stderr.
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = EngineConfig::load().context("Failed to load configuration")?;
    info!(local_currency = %config.local_currency, "configuration loaded");

    let raw = tokio::fs::read_to_string(&args.fixture)
        .await
        .with_context(|| format!("Failed to read fixture {}", args.fixture.display()))?;
    let providers = Arc::new(InMemoryProviders::from_json(&raw).context("Invalid fixture")?);
    let charges = providers.fixture().charges.clone();
    info!(charges = charges.len(), fixture = %args.fixture.display(), "fixture loaded");

    let service =
        LedgerGenerationService::new(Arc::new(config), Providers::from_shared(providers));
    let options = GenerateOptions { insert: args.insert };

    let results = service.generate_many(&charges, options).await;
    let mut failed = 0usize;
    let reports: Vec<ChargeReport> = charges
        .iter()
        .zip(results)
        .map(|(charge, result)| match result {
            Ok(ledger) => ChargeReport::Generated(ledger),
            Err(error) => {
                warn!(charge_id = %charge.id, code = %error.code, "charge failed");
                failed += 1;
                ChargeReport::Failed { charge_id: charge.id, error }
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);

    if failed > 0 {
        bail!("{failed} of {} charges failed", charges.len());
    }
    Ok(())
}
