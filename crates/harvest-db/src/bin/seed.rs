//! # Seed Data Generator
//!
//! Populates a tracker database with a small demo farm for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./harvest_dev.db
//! cargo run -p harvest-db --bin seed
//!
//! # Specify database path and number of days of history
//! cargo run -p harvest-db --bin seed -- --db ./data/harvest.db --days 120
//! ```
//!
//! ## Generated Data
//! - One farmer per region (North, South, East, West)
//! - A purchase every third day per farmer
//! - Weekly packaging runs into the fixed-weight categories
//! - Daily customer orders, mostly delivered

use std::env;

use chrono::{Days, Local, NaiveDate};
use harvest_core::orders::OrderInput;
use harvest_core::packaging::PackagingRequest;
use harvest_core::purchases::PurchaseInput;
use harvest_core::{Farmer, FixedClock, Money, Tracker, TrackerSettings};
use harvest_db::{Database, DbConfig, SqliteStore};

const FARMERS: &[(&str, &str, &str)] = &[
    ("F001", "Grace Wanjiru", "North"),
    ("F002", "Peter Otieno", "South"),
    ("F003", "Mary Njeri", "East"),
    ("F004", "John Kamau", "West"),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Corner Grocer", "0722000111"),
    ("Hilltop Hotel", "0733555777"),
    ("Fresh Mart", "0711222333"),
    ("Sunrise Cafe", "0700999888"),
];

/// (category, units per order)
const ORDER_MIX: &[(&str, i64)] = &[
    ("Small (100g)", 12),
    ("Medium (250g)", 8),
    ("Large (500g)", 4),
    ("Extra Large (1kg)", 2),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days: u64 = 90;
    let mut db_path = String::from("./harvest_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(90);
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
                println!("Harvest Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of history to generate (default: 90)");
                println!("  -d, --db <PATH>    Database file path (default: ./harvest_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Harvest Ledger Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.records().count().await?;
    if existing > 0 {
        println!("⚠ Database already holds {} collections", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let start = today
        .checked_sub_days(Days::new(days))
        .ok_or("history reaches before the calendar start")?;

    let store = SqliteStore::open(&db).await?;
    let mut tracker = Tracker::with_clock(store, FixedClock(today), TrackerSettings::default())?;
    tracker.reset()?;

    for (id, name, region) in FARMERS {
        tracker.upsert_farmer(farmer(id, name, region))?;
    }
    println!("✓ {} farmers", FARMERS.len());

    let mut purchases = 0;
    let mut packaging_runs = 0;
    let mut orders = 0;
    let mut rejected = 0;

    for offset in 0..=days {
        let Some(date) = start.checked_add_days(Days::new(offset)) else {
            break;
        };

        if offset % 3 == 0 {
            for (n, (farmer_id, _, _)) in FARMERS.iter().enumerate() {
                let kg = 20.0 + ((offset as usize + n * 7) % 25) as f64;
                let input = PurchaseInput {
                    purchase_id: format!("P{:05}", purchases + 1),
                    farmer_id: farmer_id.to_string(),
                    date: Some(date),
                    quantity: Some(kg),
                    price_per_kg: Some(Money::from_cents(180 + (n as i64) * 15)),
                };
                tracker.record_purchase(input)?;
                purchases += 1;
            }
        }

        if offset % 7 == 6 {
            for ((_, _, region), (category, _)) in FARMERS.iter().zip(ORDER_MIX) {
                let available = tracker.snapshot().raw.quantity(region);
                let request = PackagingRequest {
                    raw_category: region.to_string(),
                    packaged_category: category.to_string(),
                    quantity_kg: Some((available * 0.8).floor()),
                };
                if tracker.package(request).is_ok() {
                    packaging_runs += 1;
                }
            }
        }

        let (customer, contact) = CUSTOMERS[offset as usize % CUSTOMERS.len()];
        let (category, units) = ORDER_MIX[offset as usize % ORDER_MIX.len()];
        let order_id = format!("O{:05}", orders + rejected + 1);
        match tracker.place_order(order(&order_id, customer, contact, category, units, date)) {
            Ok(_) => {
                orders += 1;
                if offset + 7 < days {
                    tracker.update_order_status(&order_id, "Delivered")?;
                }
            }
            // early days have no packaged stock yet
            Err(_) => rejected += 1,
        }
    }

    tracker.store().flush().await?;

    println!("✓ {} purchases", purchases);
    println!("✓ {} packaging runs", packaging_runs);
    println!("✓ {} orders ({} skipped for stock)", orders, rejected);

    let stats = tracker.dashboard();
    println!();
    println!("Dashboard");
    println!("  Revenue:          {}", stats.total_revenue);
    println!("  Active orders:    {}", stats.active_orders);
    println!("  Low stock items:  {}", stats.low_stock_items);
    println!("  Suppliers:        {}", stats.suppliers);

    db.close().await;
    println!();
    println!("🎉 Seed complete!");

    Ok(())
}

fn farmer(id: &str, name: &str, region: &str) -> Farmer {
    let slug = name.split_whitespace().next().unwrap_or(id).to_lowercase();
    Farmer {
        farmer_id: id.to_string(),
        name: name.to_string(),
        phone: "0712345678".to_string(),
        email: format!("{}@harvest.example", slug),
        address: format!("{} Collection Point", region),
        region: region.to_string(),
        gps: "-0.42,36.95".to_string(),
    }
}

fn order(
    order_id: &str,
    customer: &str,
    contact: &str,
    category: &str,
    units: i64,
    date: NaiveDate,
) -> OrderInput {
    OrderInput {
        order_id: order_id.to_string(),
        customer_name: customer.to_string(),
        customer_contact: contact.to_string(),
        category: category.to_string(),
        quantity: Some(units),
        date: Some(date),
    }
}
