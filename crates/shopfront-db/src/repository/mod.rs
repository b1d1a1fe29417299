//! # Repositories
//!
//! SQLite adapters for the catalog's storage ports.
//!
//! | Repository                | Port(s)                              | Tables                                  |
//! |---------------------------|--------------------------------------|-----------------------------------------|
//! | `SqliteProductRepository` | `ProductRepository`                  | products, product_variants, product_log |
//! | `SqliteMediaRepository`   | `MediaResolver`, `MediaRepository`   | media                                   |
//!
//! Each repository exposes inherent methods returning [`DbResult`](crate::DbResult)
//! and implements its port on top of them, mapping `DbError` at the boundary.

pub mod media;
pub mod product;

pub use media::SqliteMediaRepository;
pub use product::SqliteProductRepository;
