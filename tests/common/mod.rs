#![allow(dead_code)]

use std::io::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stockhold::application::checkout::CheckoutCoordinator;
use stockhold::application::inventory::StockLedger;
use stockhold::config::ShopConfig;
use stockhold::domain::cart::carts_table;
use stockhold::domain::ports::PaymentGatewayRef;
use stockhold::domain::product::{Product, products_table};
use stockhold::domain::table::Schema;
use stockhold::infrastructure::repositories::{CartRepository, ProductRepository};
use stockhold::infrastructure::store::TransactionalStore;

pub fn write_products(dir: &Path, rows: &[[&str; 4]]) -> Result<PathBuf, Error> {
    let path = dir.join("products.csv");
    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record(["id", "name", "price", "stock"])?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(path)
}

pub fn write_commands(dir: &Path, rows: &[[&str; 4]]) -> Result<PathBuf, Error> {
    let path = dir.join("commands.csv");
    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record(["op", "owner", "product", "quantity"])?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(path)
}

/// A coordinator over a fresh store seeded with `seed`.
pub async fn shop(
    seed: &[Product],
    config: ShopConfig,
    payments: PaymentGatewayRef,
) -> CheckoutCoordinator {
    let store = TransactionalStore::new(
        Schema::new()
            .with_table(products_table())
            .with_table(carts_table()),
    )
    .unwrap();
    let products = ProductRepository::new(store.clone());
    products.put(seed).await.unwrap();
    let ledger = Arc::new(StockLedger::new(products, config));
    CheckoutCoordinator::new(ledger, payments, CartRepository::new(store))
}
