//! # Seed Data Generator
//!
//! Populates a catalog database with demo media and products, going through
//! `MediaService` and `ProductService` so every row passes the upload checks
//! and validation, and every product lands in the log.
//!
//! Media bytes go to an in-memory store; only their metadata is persisted.
//!
//! ## Usage
//! ```bash
//! cargo run -p shopfront-db --bin seed
//! cargo run -p shopfront-db --bin seed -- --db ./data/shopfront.db --namespace acme
//! ```
//!
//! Other settings come from `SHOPFRONT_CONFIG` / `SHOPFRONT_*` variables.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use shopfront_catalog::in_memory::{InMemoryEventBus, InMemoryFileStorage, StaticAuthService};
use shopfront_catalog::{telemetry, CatalogConfig, MediaService, ProductService, RequestContext};
use shopfront_core::{Money, Product, ProductStatus, ProductVariant};
use shopfront_db::{Database, DbConfig};
use tracing::{info, warn};
use uuid::Uuid;

/// Caller recorded in the product log for seeded rows.
const SEED_USER: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0001);

/// Stand-in image body for every seeded media entry.
const PLACEHOLDER_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9];

/// (title, price in cents, stock, variants as (title, price in cents))
const PRODUCTS: &[(&str, i64, i64, &[(&str, i64)])] = &[
    ("Organic Cotton T-Shirt", 3990, 120, &[("Small", 3990), ("Medium", 3990), ("Large", 4490)]),
    ("Canvas Tote Bag", 2450, 60, &[]),
    ("Ceramic Coffee Mug", 1990, 200, &[("300ml", 1990), ("450ml", 2490)]),
    ("Wool Beanie", 5900, 35, &[]),
    ("Leather Notebook Cover", 8990, 12, &[("A5", 8990), ("A4", 10990)]),
    ("Stainless Water Bottle", 6490, 80, &[("500ml", 6490), ("750ml", 7490), ("1L", 8490)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config = CatalogConfig::load(None)?;
    let mut namespace = String::from("demo");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--namespace" | "-n" => {
                if i + 1 < args.len() {
                    namespace = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: from config)");
                println!("  -n, --namespace <NAME>   Namespace to seed (default: demo)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    telemetry::init(&config);

    let db = Database::new(DbConfig::from_catalog(&config)).await?;
    info!(path = %config.database_path.display(), "Connected to database");

    let existing = db.products().count(&namespace).await?;
    if existing > 0 {
        warn!(existing, namespace = %namespace, "Namespace already seeded, skipping");
        return Ok(());
    }

    let schema = db.schema_version().await?;
    if !schema.is_current() {
        warn!(known = schema.known, applied = schema.applied, "Schema is behind this build");
    }

    let auth = Arc::new(StaticAuthService::allow_all(SEED_USER));
    let ctx = RequestContext::new();

    let media_service = MediaService::new(
        auth.clone(),
        Arc::new(InMemoryFileStorage::new()),
        Arc::new(db.medias()),
        config.media_limits(),
    );
    let mut media_ids = Vec::with_capacity(PRODUCTS.len());
    for (title, ..) in PRODUCTS {
        let filename = format!("{}.jpg", title.to_lowercase().replace(' ', "-"));
        let media = media_service
            .save(&ctx, &namespace, &filename, "image/jpeg", PLACEHOLDER_JPEG)
            .await?;
        media_ids.push(media.id);
    }

    let service = ProductService::new(
        Arc::new(db.products()),
        Arc::new(InMemoryEventBus::new()),
        auth,
        Arc::new(db.medias()),
        config.validation_rules(),
    );

    let mut created = 0;
    for ((title, price, stock, variants), media_id) in PRODUCTS.iter().zip(media_ids) {
        let mut product = Product::new(*title, Money::from_cents(*price), ProductStatus::Available);
        product.stock = *stock;
        product.sku = format!("SF-{:04}", created + 1);
        product.medias = vec![media_id];
        product.variants = variants
            .iter()
            .map(|(name, cents)| ProductVariant::new(*name, Money::from_cents(*cents)))
            .collect();

        match service.create_product(&ctx, &namespace, &mut product).await {
            Ok(()) => created += 1,
            Err(e) => warn!(title, error = %e, "Failed to seed product"),
        }
    }

    info!(created, namespace = %namespace, "Seed complete");
    db.close().await;
    Ok(())
}
