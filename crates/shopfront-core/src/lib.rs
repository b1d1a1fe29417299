//! # shopfront-core: Pure Catalog Domain for Shopfront
//!
//! This crate holds the catalog's data model and business rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Shopfront Catalog Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 shopfront-catalog (service layer)               │    │
//! │  │   ProductService ──► auth ──► validate ──► repo ──► event bus   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │             ★ shopfront-core (THIS CRATE) ★                     │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │  events   │  │ validation│    │    │
//! │  │   │  Product  │  │   Money   │  │  payloads │  │   rules   │    │    │
//! │  │   │  Variant  │  │   split   │  │  + kinds  │  │  checks   │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                 shopfront-db (SQLite adapters)                  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, ProductVariant, Media, log records and filters
//! - [`money`] - Integer-cent Money with exact split
//! - [`events`] - Event bus payloads
//! - [`validation`] - Title, price, spread, stock and status rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::Money;
//!
//! let price: Money = "10.00".parse().unwrap();
//! let parts = price.split(3);
//!
//! assert_eq!(parts[0].to_string(), "3.34");
//! assert_eq!(parts.into_iter().fold(Money::zero(), |a, b| a + b), price);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod events;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{MoneyError, PriceViolation, UnknownEvent, ValidationError};
pub use events::DomainEvent;
pub use money::Money;
pub use types::*;
pub use validation::{check_product, ValidationRules};
