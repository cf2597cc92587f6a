//! # Demo Data Seeder
//!
//! Creates a database, applies migrations and loads a small demo catalog
//! plus a few credit clients.
//!
//! ## Usage
//! ```bash
//! # Seed ./caja_dev.db
//! cargo run -p caja-db --bin seed
//!
//! # Specify database path
//! cargo run -p caja-db --bin seed -- --db ./data/caja.db
//! ```
//!
//! Seeding is skipped when the catalog already has products.

use std::env;

use caja_core::catalog::{new_product, NewProduct};
use caja_core::credit::{new_client, NewClient};
use caja_core::Money;
use caja_db::{Database, DbConfig};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (category, name, barcode, price, stock)
const CATALOG: &[(&str, &str, Option<&str>, i64, i64)] = &[
    ("Panaderia", "Pan amasado", None, 1800, 40),
    ("Panaderia", "Marraqueta", None, 1600, 60),
    ("Panaderia", "Hallulla", None, 1700, 3),
    ("Bebidas", "Coca-Cola 1.5L", Some("7801610001196"), 2190, 24),
    ("Bebidas", "Agua mineral 500ml", Some("7802820100503"), 790, 36),
    ("Bebidas", "Jugo naranja 1L", Some("7802950006102"), 1490, 4),
    ("Lacteos", "Leche entera 1L", Some("7802900001001"), 1090, 18),
    ("Lacteos", "Queso gauda 250g", Some("7802900250002"), 3290, 6),
    ("Lacteos", "Yogur frutilla", Some("7802900120003"), 450, 2),
    ("Abarrotes", "Arroz grado 1 1kg", Some("7801320000104"), 1390, 30),
    ("Abarrotes", "Fideos spaghetti 400g", Some("7801300004008"), 890, 25),
    ("Abarrotes", "Aceite maravilla 1L", Some("7802410000127"), 2490, 12),
    ("Abarrotes", "Azucar 1kg", Some("7801100001009"), 1190, 0),
    ("Cafe", "Cafe en grano 250g", Some("7613035260047"), 5990, 8),
    ("Cafe", "Te negro 20 bolsitas", Some("7802800500117"), 990, 14),
];

/// (name, credit limit, authorized)
const CLIENTS: &[(&str, i64, bool)] = &[
    ("Rosa Morales", 50000, true),
    ("Don Pedro", 30000, true),
    ("Carmen Soto", 20000, false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,caja=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./caja_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Caja POS Demo Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./caja_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let (total, applied) = db.migration_status().await?;
    info!(total, applied, "Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let now = Utc::now();
    let mut products = 0;
    for (category, name, barcode, price, stock) in CATALOG {
        let input = NewProduct {
            name: name.to_string(),
            category: category.to_string(),
            barcode: barcode.map(str::to_string),
            price: Money::from_minor(*price),
            stock: *stock,
            min_stock: None,
        };
        let product = new_product(&input, None, now)?;
        db.products().insert(&product).await?;
        products += 1;
    }

    let mut clients = 0;
    for (name, limit, authorized) in CLIENTS {
        let input = NewClient {
            name: name.to_string(),
            credit_limit: Money::from_minor(*limit),
            authorized: *authorized,
        };
        db.clients().insert(&new_client(&input, now)?).await?;
        clients += 1;
    }

    info!(products, clients, "Seed complete");
    db.close().await;
    Ok(())
}
