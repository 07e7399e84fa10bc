//! # Seed Data Generator
//!
//! Populates a database with a product catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p freedom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p freedom-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p freedom-db --bin seed -- --db ./data/freedom_pos.sqlite
//! ```
//!
//! ## Generated Products
//! Each product gets:
//! - A name built from an item and a size variant
//! - An in-store EAN-13 barcode (`200` prefix)
//! - A price between 1.99 and 9.99 plus the size surcharge
//! - Stock between 0 and 100
//! - Tax exemption for every product in the "Produce" category

use std::env;

use freedom_core::NewProduct;
use freedom_db::{Database, DbConfig};

/// Categories and their items
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Drinks",
        &[
            "Espresso",
            "Latte",
            "Cappuccino",
            "Iced Tea",
            "Orange Juice",
            "Lemonade",
            "Sparkling Water",
            "Hot Chocolate",
        ],
    ),
    (
        "Bakery",
        &[
            "Croissant",
            "Bagel",
            "Muffin",
            "Sourdough Loaf",
            "Cinnamon Roll",
            "Baguette",
        ],
    ),
    (
        "Snacks",
        &[
            "Potato Chips",
            "Granola Bar",
            "Trail Mix",
            "Pretzels",
            "Chocolate Bar",
        ],
    ),
    (
        "Produce",
        &["Apples", "Bananas", "Tomatoes", "Avocados", "Lemons"],
    ),
    (
        "Household",
        &["Dish Soap", "Paper Towels", "Batteries", "Candles"],
    ),
];

/// Size variants and their surcharge in cents
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("Family", 350),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./freedom_pos_dev.sqlite");

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
                println!("Freedom POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./freedom_pos_dev.sqlite)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Freedom POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category, items) in CATEGORIES {
        for (item_idx, item) in items.iter().enumerate() {
            for (size_idx, (size, surcharge)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let barcode = db.products().generate_barcode().await?;
                let product = generate_product(
                    category,
                    item,
                    size,
                    *surcharge,
                    generated * 7 + item_idx * 3 + size_idx,
                )
                .with_barcode(barcode);

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let low = db.reports().low_stock(None).await?;
    println!("  {} products start at or below their low-stock threshold", low.len());

    db.close().await;
    println!("✓ Seed complete!");

    Ok(())
}

fn generate_product(category: &str, item: &str, size: &str, surcharge: i64, seed: usize) -> NewProduct {
    let price_cents = 199 + ((seed * 17) % 800) as i64 + surcharge;
    let stock = (seed % 101) as i64;

    NewProduct::new(format!("{} {}", item, size), price_cents, stock, category)
        .tax_exempt(category == "Produce")
}
