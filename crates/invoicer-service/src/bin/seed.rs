//! # Seed Data Generator
//!
//! Populates the database with a demo company for development.
//!
//! ## Usage
//! ```bash
//! # Demo company with 20 invoices (default)
//! cargo run -p invoicer-service --bin seed
//!
//! # More invoices
//! cargo run -p invoicer-service --bin seed -- --invoices 200
//!
//! # Specify database path
//! cargo run -p invoicer-service --bin seed -- --db ./data/invoicer.db
//! ```
//!
//! ## Generated Data
//! - One company ("Demo Trading Co.")
//! - A handful of customers
//! - A product catalogue with prices from 3.50 to 1,250.00
//! - Invoices spread over the last 30 days, 1-4 lines each
//!
//! Other settings (mode, tax rate, prefix) come from the usual
//! `INVOICER_*` environment variables.

use chrono::{Days, Utc};
use std::env;

use invoicer_core::{
    CreateInvoiceRequest, InvoiceLineRequest, Money, NewCompany, NewCustomer, NewProduct,
};
use invoicer_service::{init_tracing, AppConfig, Services};

const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Northwind Traders", Some("accounts@northwind.test")),
    ("Blue Harbor Cafe", Some("owner@blueharbor.test")),
    ("Greenfield School", None),
    ("Atlas Logistics", Some("billing@atlas.test")),
    ("Maple Street Dental", None),
];

/// Name and unit price in cents
const PRODUCTS: &[(&str, i64)] = &[
    ("Consulting Hour", 12_000),
    ("Website Maintenance (monthly)", 45_000),
    ("Laptop Stand", 3_999),
    ("Wireless Keyboard", 5_499),
    ("USB-C Cable", 1_299),
    ("Printer Paper (box)", 2_850),
    ("Coffee Beans 1kg", 2_200),
    ("Espresso", 350),
    ("Office Chair", 125_000),
    ("Desk Lamp", 4_750),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut config = AppConfig::from_env()?;
    let mut invoice_count: usize = 20;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--invoices" | "-n" => {
                if i + 1 < args.len() {
                    invoice_count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Invoicer Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --invoices <N>  Number of invoices to generate (default: 20)");
                println!("  -d, --db <PATH>     Database file path (default: $INVOICER_DB_PATH or ./invoicer.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Invoicer Seed Data Generator");
    println!("============================");
    println!("Database: {}", config.database_path.display());
    println!("Mode:     {}", config.mode);
    println!("Invoices: {}", invoice_count);
    println!();

    let services = Services::connect(&config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Stay idempotent: one demo company per database
    let existing = services.db.companies().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} companies", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let company = services
        .catalog
        .register_company(&NewCompany {
            name: "Demo Trading Co.".to_string(),
            tax_code: Some("DE123456789".to_string()),
            address: Some("1 Market Square, Springfield".to_string()),
            phone: Some("+1 555 0100".to_string()),
            email: Some("hello@demo-trading.test".to_string()),
        })
        .await?;
    let tenant_id = company.id;
    println!("✓ Company {} ({})", company.name, tenant_id);

    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, email) in CUSTOMERS {
        let customer = services
            .catalog
            .create_customer(
                &tenant_id,
                &NewCustomer {
                    name: name.to_string(),
                    email: email.map(str::to_string),
                    ..Default::default()
                },
            )
            .await?;
        customers.push(customer);
    }
    println!("✓ {} customers", customers.len());

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, price_cents) in PRODUCTS {
        let product = services
            .catalog
            .create_product(
                &tenant_id,
                &NewProduct {
                    name: name.to_string(),
                    unit_price_cents: *price_cents,
                    ..Default::default()
                },
            )
            .await?;
        products.push(product);
    }
    println!("✓ {} products", products.len());

    println!();
    println!("Generating invoices...");

    let today = Utc::now().date_naive();
    let start = std::time::Instant::now();
    let mut generated = 0;

    for n in 0..invoice_count {
        let line_count = 1 + n % 4;
        let items = (0..line_count)
            .map(|l| {
                let product = &products[(n * 3 + l * 7) % products.len()];
                InvoiceLineRequest::new(&product.id, 1 + ((n + l) % 5) as i64)
            })
            .collect();

        let request = CreateInvoiceRequest {
            customer_id: Some(customers[n % customers.len()].id.clone()),
            items,
            ..Default::default()
        };

        let issue_date = today
            .checked_sub_days(Days::new((n % 30) as u64))
            .unwrap_or(today);

        match services
            .invoices
            .create_invoice_on(&tenant_id, &request, issue_date)
            .await
        {
            Ok(invoice) => {
                generated += 1;
                if generated % 10 == 0 {
                    println!("  Generated {} invoices (last: {})", generated, invoice.invoice_number);
                }
            }
            Err(e) => eprintln!("Failed to create invoice #{}: {}", n + 1, e),
        }
    }

    println!();
    println!("✓ Generated {} invoices in {:?}", generated, start.elapsed());

    let summaries = services.invoices.list_invoices(&tenant_id).await?;
    let total: Money = summaries.iter().map(|s| Money::from_cents(s.total_cents)).sum();
    println!("  Invoiced total: {}", total);

    println!();
    println!("✓ Seed complete! Tenant id: {}", tenant_id);

    Ok(())
}
