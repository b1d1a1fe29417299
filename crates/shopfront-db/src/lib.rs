//! # shopfront-db: SQLite Persistence for Shopfront
//!
//! SQLite adapters for the catalog ports, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ProductService / MediaService (shopfront-catalog)                      │
//! │       │ Arc<dyn ProductRepository>, Arc<dyn MediaResolver>,             │
//! │       │ Arc<dyn MediaRepository>                                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   shopfront-db (THIS CRATE)                     │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌──────────────────┐    ┌────────────┐   │    │
//! │  │   │   Database    │    │   Repositories   │    │ Migrations │   │    │
//! │  │   │   (pool.rs)   │◄───│ SqliteProduct... │    │ (embedded) │   │    │
//! │  │   │  SqlitePool   │    │ SqliteMedia...   │    │ 001_...sql │   │    │
//! │  │   └───────────────┘    └──────────────────┘    └────────────┘   │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (CatalogConfig::database_path)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopfront.db")).await?;
//! let service = ProductService::new(
//!     Arc::new(db.products()),
//!     bus,
//!     auth,
//!     Arc::new(db.medias()),
//!     config.validation_rules(),
//! );
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{SqliteMediaRepository, SqliteProductRepository};
