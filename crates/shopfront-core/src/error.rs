//! # Error Types
//!
//! Domain-specific error types for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfront-core errors (this file)                                      │
//! │  ├── ValidationError  - Product rejected by a business rule             │
//! │  ├── MoneyError       - Malformed amount text, division by zero         │
//! │  └── UnknownEvent     - Log event name outside the known set            │
//! │                                                                         │
//! │  shopfront-catalog errors (separate crate)                              │
//! │  └── CatalogError     - What callers of ProductService see              │
//! │                                                                         │
//! │  shopfront-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → CatalogError → caller                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (lengths, media id, status)
//! 3. Errors are enum variants, never String
//! 4. Validation errors are caller-fixable; none of them wrap I/O failures

use thiserror::Error;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Validation Error
// =============================================================================

/// A candidate product broke one of the catalog rules.
///
/// Only the first failing rule is reported; see
/// [`crate::validation::check_product`] for the order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title length (in characters) is outside the allowed range.
    #[error("invalid product title: length {length} is outside {min}..={max}")]
    InvalidTitle { length: usize, min: usize, max: usize },

    /// Product or variant price is at or below the floor, or the variant
    /// prices are spread too far apart.
    #[error("invalid product price: {reason}")]
    InvalidPrice { reason: PriceViolation },

    /// Status is not one of `draft`, `available`, `out_of_stock`.
    #[error("invalid product status: '{0}'")]
    InvalidStatus(String),

    /// A referenced media id could not be resolved.
    #[error("invalid media: {0}")]
    InvalidMedia(Uuid),
}

/// Which price rule was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceViolation {
    #[error("price {price} must be greater than {floor}")]
    BelowFloor { price: Money, floor: Money },

    #[error("variant #{index} price {price} must be greater than {floor}")]
    VariantBelowFloor { index: usize, price: Money, floor: Money },

    #[error("variant prices {min}..{max} spread more than {max_ratio}x")]
    SpreadTooWide { min: Money, max: Money, max_ratio: i64 },
}

impl ValidationError {
    pub(crate) fn price(reason: PriceViolation) -> Self {
        ValidationError::InvalidPrice { reason }
    }
}

// =============================================================================
// Money Error
// =============================================================================

/// Errors produced by [`Money`] parsing and division.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Text did not match `-?<digits>.<two digits>`.
    #[error("invalid money format: '{0}' (expected \"major.minor\")")]
    Format(String),

    #[error("division by zero")]
    DivisionByZero,
}

// =============================================================================
// Event Name Error
// =============================================================================

/// A stored event name did not match any [`crate::ProductEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown product event: '{0}'")]
pub struct UnknownEvent(pub String);

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::InvalidTitle {
            length: 5,
            min: 10,
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "invalid product title: length 5 is outside 10..=100"
        );

        let err = ValidationError::price(PriceViolation::BelowFloor {
            price: Money::from_cents(50),
            floor: Money::from_cents(100),
        });
        assert_eq!(
            err.to_string(),
            "invalid product price: price 0.50 must be greater than 1.00"
        );
    }

    #[test]
    fn test_money_error_messages() {
        assert_eq!(
            MoneyError::Format("12".to_string()).to_string(),
            "invalid money format: '12' (expected \"major.minor\")"
        );
        assert_eq!(MoneyError::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            UnknownEvent("product.renamed".to_string()).to_string(),
            "unknown product event: 'product.renamed'"
        );
    }
}
