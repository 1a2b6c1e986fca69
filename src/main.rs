use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stockhold::application::checkout::CheckoutCoordinator;
use stockhold::application::inventory::StockLedger;
use stockhold::config::{PaymentConfig, ReservationPolicy, ShopConfig};
use stockhold::domain::cart::carts_table;
use stockhold::domain::ports::PaymentGatewayRef;
use stockhold::domain::product::products_table;
use stockhold::domain::table::Schema;
use stockhold::infrastructure::payments::SimulatedPaymentGateway;
use stockhold::infrastructure::repositories::{CartRepository, ProductRepository};
use stockhold::infrastructure::store::TransactionalStore;
use stockhold::interfaces::csv::command_reader::{CommandReader, CommandType, ShopCommand};
use stockhold::interfaces::csv::stock_writer::StockWriter;
use stockhold::interfaces::seed::load_products;
use stockhold::logging::setup_logging;
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Product seed file: `.json` array, or CSV with header id,name,price,stock
    products: PathBuf,

    /// Command script, CSV with header op,owner,product,quantity
    commands: PathBuf,

    /// Probability in [0, 1] that the simulated payment provider declines
    #[arg(long, default_value_t = 0.5)]
    payment_failure_rate: f64,

    /// Simulated payment provider latency in milliseconds
    #[arg(long, default_value_t = 200)]
    payment_latency_ms: u64,

    /// How long a reservation waits for its checkout decision before aborting
    #[arg(long, default_value_t = 30_000)]
    decision_timeout_ms: u64,

    /// Keep reserved products locked until the reservation is finalized
    #[arg(long)]
    serialize_reservations: bool,

    /// Log filter directives, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn shop_config(&self) -> ShopConfig {
        ShopConfig {
            decision_timeout: Duration::from_millis(self.decision_timeout_ms),
            reservation_policy: if self.serialize_reservations {
                ReservationPolicy::SerializedPerProduct
            } else {
                ReservationPolicy::Optimistic
            },
        }
    }

    fn payment_config(&self) -> PaymentConfig {
        PaymentConfig {
            latency: Duration::from_millis(self.payment_latency_ms),
            failure_rate: self.payment_failure_rate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, !cli.log_json);

    let schema = Schema::new()
        .with_table(products_table())
        .with_table(carts_table());
    let store = TransactionalStore::new(schema).into_diagnostic()?;
    let products = ProductRepository::new(store.clone());
    load_products(&cli.products, &products)
        .await
        .into_diagnostic()?;

    let payments: PaymentGatewayRef =
        Arc::new(SimulatedPaymentGateway::new(cli.payment_config()).into_diagnostic()?);
    let ledger = Arc::new(StockLedger::new(products.clone(), cli.shop_config()));
    let coordinator = Arc::new(CheckoutCoordinator::new(
        ledger,
        payments,
        CartRepository::new(store),
    ));

    // Commands of one owner run in order, different owners run concurrently
    let file = File::open(&cli.commands).into_diagnostic()?;
    let mut shards: BTreeMap<String, Vec<ShopCommand>> = BTreeMap::new();
    for result in CommandReader::new(file).commands() {
        match result {
            Ok(command) => shards.entry(command.owner.clone()).or_default().push(command),
            Err(e) => tracing::warn!(error = %e, "Error reading command"),
        }
    }

    let mut workers = JoinSet::new();
    for (owner, commands) in shards {
        let coordinator = Arc::clone(&coordinator);
        workers.spawn(async move {
            for command in commands {
                if let Err(e) = execute(&coordinator, &command).await {
                    tracing::warn!(owner, op = ?command.op, error = %e, "Error processing command");
                }
            }
        });
    }
    while let Some(joined) = workers.join_next().await {
        joined.into_diagnostic()?;
    }

    let stock = products.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = StockWriter::new(stdout.lock());
    writer.write_products(&stock).into_diagnostic()?;

    Ok(())
}

async fn execute(
    coordinator: &CheckoutCoordinator,
    command: &ShopCommand,
) -> stockhold::error::Result<()> {
    match command.op {
        CommandType::Add => {
            let (product, quantity) = command.item()?;
            let contents = coordinator
                .add_item(&command.owner, product, quantity)
                .await?;
            tracing::info!(owner = %command.owner, ?contents, "cart updated");
        }
        CommandType::Checkout => {
            let contents = coordinator.checkout(&command.owner).await?;
            tracing::info!(owner = %command.owner, ?contents, "cart checked out");
        }
    }
    Ok(())
}
