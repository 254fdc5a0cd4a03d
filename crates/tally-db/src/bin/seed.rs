//! # Seed Data Generator
//!
//! Populates the inventory with test products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! Codes look like `{CATEGORY}-{INDEX:04}`, e.g. `HW-0012`. Prices and stock
//! are derived from the index so reruns against a fresh file are identical.

use std::env;
use tally_core::Product;
use tally_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "HW",
        "hardware",
        &[
            "Hammer",
            "Screwdriver Set",
            "Wood Screws",
            "Wall Anchors",
            "Tape Measure",
            "Utility Knife",
            "Pliers",
            "Adjustable Wrench",
            "Drill Bits",
            "Sandpaper",
        ],
    ),
    (
        "EL",
        "electrical",
        &[
            "LED Bulb",
            "Extension Cord",
            "Power Strip",
            "Wall Switch",
            "Outlet Cover",
            "Electrical Tape",
            "Wire Nuts",
            "Circuit Breaker",
            "Cable Ties",
            "Fuse",
        ],
    ),
    (
        "PL",
        "plumbing",
        &[
            "PVC Pipe",
            "Pipe Elbow",
            "Teflon Tape",
            "Faucet Washer",
            "Drain Cleaner",
            "Shower Head",
            "Ball Valve",
            "Hose Clamp",
            "Sink Trap",
            "Pipe Glue",
        ],
    ),
    (
        "PT",
        "paint",
        &[
            "Interior Paint",
            "Exterior Paint",
            "Primer",
            "Paint Roller",
            "Paint Brush",
            "Masking Tape",
            "Drop Cloth",
            "Wood Stain",
            "Spray Paint",
            "Thinner",
        ],
    ),
];

/// Size variants with a price addon in cents.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 250),
    ("Large", 600),
    ("Pro", 1500),
    ("Bulk", 4000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding inventory");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let products = CATEGORIES
        .iter()
        .flat_map(|(prefix, category, names)| {
            names.iter().flat_map(move |name| {
                SIZES
                    .iter()
                    .map(move |(size, addon)| (*prefix, *category, *name, *size, *addon))
            })
        })
        .take(count)
        .enumerate();

    let mut generated = 0;
    for (index, (prefix, category, name, size, addon)) in products {
        let product = generate_product(prefix, category, name, size, addon, index);

        if let Err(e) = db.products().insert(&product).await {
            warn!(code = %product.code, error = %e, "Failed to insert product");
            continue;
        }
        generated += 1;
    }

    let hits = db.products().search_by_name("hammer", 10).await?;
    info!(
        generated,
        elapsed = ?start.elapsed(),
        hammer_matches = hits.len(),
        "Seed complete"
    );

    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(
    prefix: &str,
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let code = format!("{}-{:04}", prefix, seed);

    // base $1.99 - $19.98 plus the size addon
    let price_cents = 199 + ((seed * 37) % 1800) as i64 + price_addon;

    // 0 - 50 on hand; some products start out of stock
    let quantity = (seed % 51) as i64;

    let mut product = Product::new(code, format!("{} {}", name, size), price_cents, quantity);
    product.category = Some(category.to_string());
    product
}
