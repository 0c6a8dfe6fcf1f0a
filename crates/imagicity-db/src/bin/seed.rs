//! # Seed Data Generator
//!
//! Populates a fresh database with the demo studio used in development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by imagicity.toml / IMAGICITY_DB_PATH
//! cargo run -p imagicity-db --bin seed
//!
//! # Specify database path
//! cargo run -p imagicity-db --bin seed -- --db ./data/imagicity.db
//!
//! # Use an explicit config file
//! cargo run -p imagicity-db --bin seed -- --config ./imagicity.toml
//! ```
//!
//! ## Seeded Records
//! - Organization: Imagicity Creative Studio (Karnataka)
//! - Client: Demo Client Pvt Ltd, state code 29
//! - Catalogue: brand identity package, product photography session
//! - Invoice: brand identity (₹45,000) + photography (₹12,000, 10% off),
//!   18% GST intra-state, grand total ₹65,844.00
//! - Estimate: the same two catalogue items, valid for 30 days

use chrono::Local;
use imagicity_core::{
    CatalogueItem, Client, DiscountType, Money, NewEstimate, NewInvoice, OrganizationSettings,
    TaxConfig, TaxPreference,
};
use imagicity_db::{AppConfig, Database};
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const INVOICE_TERMS: &str = "Payment due within 7 days. Late payments attract 1.5% monthly interest. \
UPI: demo@upi. Bank: Imagicity Bank, A/C 1234567890, IFSC IMAG0000123.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Imagicity Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (overrides config)");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("🌱 Imagicity Seed Data Generator");
    println!("================================");
    println!("Database: {}", config.database.path.display());
    println!();

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.invoices().list(None).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} invoices", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Settings
    db.settings()
        .update_organization(&OrganizationSettings {
            id: "org".to_string(),
            legal_name: "Imagicity Creative Studio".to_string(),
            address: Some("Indiranagar, Bengaluru, KA".to_string()),
            gstin: None,
            pan: None,
            default_place_of_supply: Some("29".to_string()),
        })
        .await?;
    db.settings().update_tax(&TaxConfig::default()).await?;

    if let Some(prefix) = &config.numbering.prefix {
        let mut numbering = db.settings().get_numbering().await?;
        numbering.prefix = prefix.clone();
        db.settings().update_numbering(&numbering).await?;
    }
    println!("✓ Settings saved");

    // Client
    let mut client = Client::new("Demo Client", "Demo Client Pvt Ltd");
    client.email = Some("billing@democlient.in".to_string());
    client.phone = Some("+91 98765 43210".to_string());
    client.billing_address = Some("221B Residency Road, Bengaluru, KA".to_string());
    client.shipping_address = client.billing_address.clone();
    client.gstin = Some("29ABCDE1234F1Z5".to_string());
    client.state_code = Some("29".to_string());
    client.notes = Some("Trusted partner for all demo journeys.".to_string());
    client.tags = vec!["priority".to_string()];
    let client = db.clients().insert(&client).await?;
    println!("✓ Client: {}", client.legal_name);

    // Catalogue
    let catalogue = [
        CatalogueItem {
            id: Uuid::new_v4().to_string(),
            name: "Brand Identity Package".to_string(),
            hsn_or_sac: Some("9983".to_string()),
            sku: None,
            unit: Some("service".to_string()),
            price: Money::from_rupees(45000),
            tax_preference: TaxPreference::Exclusive,
            description: Some("Visual identity exploration and delivery.".to_string()),
        },
        CatalogueItem {
            id: Uuid::new_v4().to_string(),
            name: "Product Photography Session".to_string(),
            hsn_or_sac: Some("9983".to_string()),
            sku: None,
            unit: Some("session".to_string()),
            price: Money::from_rupees(12000),
            tax_preference: TaxPreference::Exclusive,
            description: Some("Half-day shoot with editing.".to_string()),
        },
    ];
    for item in &catalogue {
        db.catalogue().insert(item).await?;
    }
    println!("✓ Catalogue: {} items", catalogue.len());

    let lines = vec![
        catalogue[0].to_line_item().without_discount(),
        catalogue[1]
            .to_line_item()
            .with_discount(DiscountType::PercentOfLine, Decimal::TEN),
    ];

    // Invoice
    let today = Local::now().date_naive();
    let mut new_invoice = NewInvoice::new(&client.id, today)
        .with_lines(lines.clone())
        .with_place_of_supply("29");
    new_invoice.notes = Some("Thank you for trusting Imagicity for your brand vision.".to_string());
    new_invoice.terms = Some(INVOICE_TERMS.to_string());

    let invoice = db.invoices().create(new_invoice).await?;
    info!(number = %invoice.number, "Seed invoice created");
    println!("✓ Invoice {}: {}", invoice.number, invoice.grand_total);

    // Estimate
    let estimate = db
        .estimates()
        .insert(NewEstimate {
            number: format!("EST-{}-001", today.format("%y")),
            date: today,
            client_id: client.id.clone(),
            line_items: lines,
            currency: invoice.currency.clone(),
            notes: Some("Valid for 30 days.".to_string()),
        })
        .await?;
    println!("✓ Estimate {}: {}", estimate.number, estimate.grand_total);

    println!();
    println!("Next invoice number: {}", db.invoices().peek_next_number().await?);
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Installs the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=imagicity=trace` - Show trace for imagicity crates only
/// - Default: `info,imagicity=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,imagicity=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
