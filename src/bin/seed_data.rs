//! Seed data script - fills a data directory with a small demo inventory
//!
//! Run with: cargo run --bin seed-data -- --data-dir data
//!
//! This creates:
//! - 6 products (hardware, electrical, safety)
//! - 3 warehouses
//! - Stock rows for most product/warehouse pairs, some of them low
//! - A couple of past transfers

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::Parser;
use rust_decimal_macros::dec;
use tracing::info;

use stockpile_api::{
    models::{AlertItem, Product, StockItem, Transfer, Warehouse},
    store::RecordStore,
};

#[derive(Parser)]
#[command(name = "seed-data", about = "Populate a data directory with demo inventory")]
struct Args {
    #[arg(long, default_value = "data", help = "Directory to write the collections into")]
    data_dir: PathBuf,
    #[arg(long, help = "Overwrite collections that already hold records")]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    info!("=== Stockpile Seed Data ===");
    let store = RecordStore::open(&args.data_dir)
        .await
        .with_context(|| format!("failed to open {}", args.data_dir.display()))?;

    if !args.force && !store.products.load().await?.is_empty() {
        bail!(
            "{} already holds products; pass --force to overwrite",
            args.data_dir.display()
        );
    }

    let products = products();
    let warehouses = warehouses();
    let stock = stock();
    let transfers = transfers();

    store.products.save(&products).await?;
    info!("  Created {} products", products.len());
    store.warehouses.save(&warehouses).await?;
    info!("  Created {} warehouses", warehouses.len());
    store.stock.save(&stock).await?;
    info!("  Created {} stock rows", stock.len());
    store.transfers.save(&transfers).await?;
    info!("  Created {} transfers", transfers.len());
    store.alerts.save(&Vec::<AlertItem>::new()).await?;

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/stock");
    info!("  curl -X POST http://localhost:8080/api/checkLowStock");
    info!("  curl http://localhost:8080/api/dashboard/overview");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

fn products() -> Vec<Product> {
    let rows = [
        ("HW-001", "Hex Bolt M8", "Hardware", dec!(0.35), 200),
        ("HW-002", "Wood Screw 4x40", "Hardware", dec!(0.08), 500),
        ("EL-001", "Cable Tie 200mm", "Electrical", dec!(0.05), 0),
        ("EL-002", "Junction Box", "Electrical", dec!(4.90), 20),
        ("SF-001", "Safety Gloves", "Safety", dec!(6.50), 30),
        ("SF-002", "Ear Defenders", "Safety", dec!(18.00), 0),
    ];
    rows.into_iter()
        .zip(1..)
        .map(|((sku, name, category, unit_cost, reorder_point), id)| Product {
            id,
            sku: sku.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            unit_cost,
            reorder_point,
        })
        .collect()
}

fn warehouses() -> Vec<Warehouse> {
    [
        ("OSL-1", "Oslo North", "Oslo"),
        ("BGO-1", "Bergen Harbour", "Bergen"),
        ("TRD-1", "Trondheim Central", "Trondheim"),
    ]
    .into_iter()
    .zip(1..)
    .map(|((code, name, location), id)| Warehouse {
        id,
        code: code.to_string(),
        name: name.to_string(),
        location: location.to_string(),
    })
    .collect()
}

fn stock() -> Vec<StockItem> {
    let rows = [
        (1, 1, 420),
        (1, 2, 150),
        (2, 1, 1200),
        (2, 3, 80),
        (3, 1, 9),
        (3, 2, 0),
        (4, 2, 35),
        (4, 3, 4),
        (5, 1, 60),
        (6, 3, 3),
    ];
    rows.into_iter()
        .zip(1..)
        .map(|((product_id, warehouse_id, quantity), id)| StockItem {
            id,
            product_id,
            warehouse_id,
            quantity,
        })
        .collect()
}

fn transfers() -> Vec<Transfer> {
    let now = Utc::now();
    vec![
        Transfer {
            id: 1,
            product_id: 1,
            from_warehouse_id: 1,
            to_warehouse_id: 2,
            quantity: 50,
            date: now - Duration::days(6),
        },
        Transfer {
            id: 2,
            product_id: 4,
            from_warehouse_id: 2,
            to_warehouse_id: 3,
            quantity: 10,
            date: now - Duration::days(2),
        },
    ]
}
