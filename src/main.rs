use clap::Parser;
use log::{error, info, warn};
use miette::{IntoDiagnostic, Result};
use payment_saga::application::idempotency::IdempotencyCache;
use payment_saga::application::orchestrator::PaymentOrchestrator;
use payment_saga::config::Cli;
use payment_saga::domain::ports::{BankGatewayRef, PaymentStoreRef};
use payment_saga::infrastructure::bank_gateway::HttpBankGateway;
use payment_saga::infrastructure::in_memory::InMemoryPaymentStore;
use payment_saga::infrastructure::simulated_bank::SimulatedBank;
use payment_saga::interfaces::csv::command_reader::CommandReader;
use payment_saga::interfaces::csv::payment_writer::PaymentWriter;
use payment_saga::interfaces::handler::{CommandHandler, Payload};
use payment_saga::logging::init_logging;
use std::fs::File;
use std::io;
use std::sync::Arc;

#[cfg(feature = "storage-rocksdb")]
fn build_store(cli: &Cli) -> Result<PaymentStoreRef> {
    use payment_saga::infrastructure::rocksdb::RocksDbPaymentStore;

    match &cli.db_path {
        Some(db_path) => {
            let store = RocksDbPaymentStore::open(db_path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemoryPaymentStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_store(cli: &Cli) -> Result<PaymentStoreRef> {
    if cli.db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryPaymentStore::new()))
}

fn build_gateway(cli: &Cli) -> Result<BankGatewayRef> {
    match &cli.bank_url {
        Some(url) => {
            if cli.simulate_decline.is_some() {
                warn!("--simulate-decline is ignored when a bank URL is configured");
            }
            let gateway = HttpBankGateway::new(url.as_str(), cli.bank_timeout()).into_diagnostic()?;
            info!("Using bank API at {}", gateway.base_url());
            Ok(Arc::new(gateway))
        }
        None => Ok(Arc::new(SimulatedBank::new(cli.bank_behavior()))),
    }
}

fn describe(payload: &Payload) -> String {
    match payload {
        Payload::Payment(p) => format!(
            "payment {} {} (code {})",
            p.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            p.status,
            p.code
        ),
        Payload::Payments(list) => format!("{} payments", list.len()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(env!("CARGO_PKG_NAME"), &cli.log_settings())
        .map_err(|e| miette::miette!("failed to initialize logging: {e}"))?;

    let store = build_store(&cli)?;
    let gateway = build_gateway(&cli)?;
    let orchestrator = PaymentOrchestrator::new(gateway, store);
    let handler = CommandHandler::new(orchestrator, IdempotencyCache::new(cli.idempotency_ttl()))
        .with_request_timeout(cli.request_timeout());

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let kind = record.r#type;
                match handler.handle(record).await {
                    Ok(outcome) => info!(
                        "Command {} ({:?}) -> {} {}",
                        line + 1,
                        kind,
                        outcome.status,
                        describe(&outcome.payload)
                    ),
                    Err(e) if e.is_client_error() => warn!(
                        "Command {} ({:?}) refused -> {}: {}",
                        line + 1,
                        kind,
                        e.status(),
                        e
                    ),
                    Err(e) => error!(
                        "Error processing command {} ({:?}) -> {}: {}",
                        line + 1,
                        kind,
                        e.status(),
                        e
                    ),
                }
            }
            Err(e) => error!("Error reading command {}: {}", line + 1, e),
        }
    }

    // Output the final ledger
    let payments = handler.ledger().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_payments(&payments).into_diagnostic()?;

    Ok(())
}
