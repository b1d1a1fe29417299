//! # Validation Module
//!
//! Pure product rules. Media resolution is the only rule that needs I/O and
//! lives next to the media port in `shopfront-catalog`.
//!
//! ## Check Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Product Validation Pipeline                        │
//! │                                                                         │
//! │  1. title length in [10, 100]           ── else InvalidTitle            │
//! │  2. price > 1.00                        ── else InvalidPrice            │
//! │  3. every variant price > 1.00          ── else InvalidPrice            │
//! │  4. max variant price <= 5 × min        ── else InvalidPrice            │
//! │  5. negative stock → 0                  (silent clamp, never an error)  │
//! │  6. status ∈ {draft, available, out_of_stock} ── else InvalidStatus     │
//! │  ─────────────────────── shopfront-catalog ───────────────────────────  │
//! │  7. every media id resolves             ── else InvalidMedia            │
//! │                                                                         │
//! │  First failing check wins; later checks do not run.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::Money;
//! use shopfront_core::types::{Product, ProductStatus};
//! use shopfront_core::validation::{check_product, ValidationRules};
//!
//! let mut product = Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Available);
//! product.stock = -3;
//!
//! check_product(&mut product, &ValidationRules::default()).unwrap();
//! assert_eq!(product.stock, 0);
//! ```

use crate::error::{PriceViolation, ValidationError};
use crate::money::Money;
use crate::types::{Product, ProductStatus, ProductVariant};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Rules
// =============================================================================

/// Tunable thresholds for the product rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Minimum title length in characters (inclusive).
    pub title_min_len: usize,
    /// Maximum title length in characters (inclusive).
    pub title_max_len: usize,
    /// Prices must be strictly greater than this.
    pub min_price: Money,
    /// Largest allowed `max / min` ratio across variant prices (inclusive).
    pub max_variant_spread: i64,
}

impl ValidationRules {
    pub const DEFAULT_TITLE_MIN_LEN: usize = 10;
    pub const DEFAULT_TITLE_MAX_LEN: usize = 100;
    pub const DEFAULT_MIN_PRICE: Money = Money::from_cents(100);
    pub const DEFAULT_MAX_VARIANT_SPREAD: i64 = 5;
}

impl Default for ValidationRules {
    fn default() -> Self {
        ValidationRules {
            title_min_len: Self::DEFAULT_TITLE_MIN_LEN,
            title_max_len: Self::DEFAULT_TITLE_MAX_LEN,
            min_price: Self::DEFAULT_MIN_PRICE,
            max_variant_spread: Self::DEFAULT_MAX_VARIANT_SPREAD,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs rules 1 to 6 against `product`, clamping negative stock in place.
pub fn check_product(product: &mut Product, rules: &ValidationRules) -> ValidationResult<()> {
    validate_title(&product.title, rules)?;
    validate_price(product.price, rules)?;
    validate_variant_prices(&product.variants, rules)?;
    clamp_stock(product);
    validate_status(&product.status)?;
    Ok(())
}

// =============================================================================
// Individual Rules
// =============================================================================

/// Title length, counted in characters rather than bytes.
pub fn validate_title(title: &str, rules: &ValidationRules) -> ValidationResult<()> {
    let length = title.chars().count();

    if length < rules.title_min_len || length > rules.title_max_len {
        return Err(ValidationError::InvalidTitle {
            length,
            min: rules.title_min_len,
            max: rules.title_max_len,
        });
    }

    Ok(())
}

/// Product price must be strictly above the floor.
pub fn validate_price(price: Money, rules: &ValidationRules) -> ValidationResult<()> {
    if price.less_or_equal(rules.min_price) {
        return Err(ValidationError::price(PriceViolation::BelowFloor {
            price,
            floor: rules.min_price,
        }));
    }

    Ok(())
}

/// Per-variant floor, then the spread between cheapest and dearest variant.
///
/// ## Spread Check
/// ```text
/// variants: [100.00, 10.00]
///      │
///      ▼
/// min = 10.00, max = 100.00   (seeded from the first variant)
///      │
///      ▼
/// 100.00 > 5 × 10.00 ?  → yes → InvalidPrice
///
/// variants: [50.00, 10.00] → 50.00 > 50.00 ? → no → OK (boundary inclusive)
/// ```
///
/// With no variants there is nothing to compare and the check passes.
pub fn validate_variant_prices(
    variants: &[ProductVariant],
    rules: &ValidationRules,
) -> ValidationResult<()> {
    for (index, variant) in variants.iter().enumerate() {
        if variant.price.less_or_equal(rules.min_price) {
            return Err(ValidationError::price(PriceViolation::VariantBelowFloor {
                index,
                price: variant.price,
                floor: rules.min_price,
            }));
        }
    }

    let Some(first) = variants.first() else {
        return Ok(());
    };

    let (min, max) = variants
        .iter()
        .fold((first.price, first.price), |(min, max), v| {
            (min.min(v.price), max.max(v.price))
        });

    // Every price is above a non-negative floor here, so min > 0 unless the
    // floor itself was configured negative.
    let spread_exceeded = if min.cents() <= 0 {
        max.cents() > 0
    } else {
        i128::from(max.cents()) > i128::from(min.cents()) * i128::from(rules.max_variant_spread)
    };

    if spread_exceeded {
        return Err(ValidationError::price(PriceViolation::SpreadTooWide {
            min,
            max,
            max_ratio: rules.max_variant_spread,
        }));
    }

    Ok(())
}

/// Floors negative stock to zero on the product and each variant.
pub fn clamp_stock(product: &mut Product) {
    product.stock = product.stock.max(0);
    for variant in &mut product.variants {
        variant.stock = variant.stock.max(0);
    }
}

/// Status token must belong to the closed set.
pub fn validate_status(status: &str) -> ValidationResult<ProductStatus> {
    status.parse()
}

// =============================================================================
// Unit Tests
// =============================================================================
