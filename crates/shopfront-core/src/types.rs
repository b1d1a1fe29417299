//! # Domain Types
//!
//! Core domain types used throughout the catalog.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │ ProductVariant  │   │     Media       │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │◄──│  product_id     │   │  id (UUID)      │        │
//! │  │  namespace      │   │  title          │   │  url            │        │
//! │  │  title, sku     │   │  price (Money)  │   │  media_type     │        │
//! │  │  price (Money)  │   │  medias ────────┼──►│  size           │        │
//! │  │  medias ────────┼───┼─────────────────┼──►│                 │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │ ProductStatus   │   │  ProductEvent   │   │ ProductLogEvent │        │
//! │  │  Draft          │   │  created        │   │  namespace      │        │
//! │  │  Available      │   │  updated        │   │  product_id     │        │
//! │  │  OutOfStock     │   │  deleted ...    │   │  event, data    │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Server-Owned Fields
//! `id`, `created_at` and `updated_at` are assigned by the catalog service.
//! Whatever a client sends in those fields is overwritten on create.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{UnknownEvent, ValidationError};
use crate::money::Money;

// =============================================================================
// Product Status
// =============================================================================

/// Lifecycle status of a product. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Not yet visible to shoppers.
    Draft,
    /// Listed and purchasable.
    Available,
    /// Listed but no stock left.
    OutOfStock,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 3] = [
        ProductStatus::Draft,
        ProductStatus::Available,
        ProductStatus::OutOfStock,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Available => "available",
            ProductStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

// =============================================================================
// Product Event Kind
// =============================================================================

/// Kind of change recorded in the product log and published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductEvent {
    #[serde(rename = "product.created")]
    Created,
    #[serde(rename = "product.updated")]
    Updated,
    #[serde(rename = "product.deleted")]
    Deleted,
    #[serde(rename = "product.restored")]
    Restored,
    #[serde(rename = "product.stock.update")]
    StockUpdate,
}

impl ProductEvent {
    pub const ALL: [ProductEvent; 5] = [
        ProductEvent::Created,
        ProductEvent::Updated,
        ProductEvent::Deleted,
        ProductEvent::Restored,
        ProductEvent::StockUpdate,
    ];

    /// Name stored in the product log (`product.created`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductEvent::Created => "product.created",
            ProductEvent::Updated => "product.updated",
            ProductEvent::Deleted => "product.deleted",
            ProductEvent::Restored => "product.restored",
            ProductEvent::StockUpdate => "product.stock.update",
        }
    }

    /// Event bus topic (`product:created`).
    pub const fn topic(&self) -> &'static str {
        match self {
            ProductEvent::Created => "product:created",
            ProductEvent::Updated => "product:updated",
            ProductEvent::Deleted => "product:deleted",
            ProductEvent::Restored => "product:restored",
            ProductEvent::StockUpdate => "product:stock.update",
        }
    }
}

impl fmt::Display for ProductEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned identifier (UUID v4).
    pub id: Uuid,

    /// Tenant namespace this product belongs to.
    pub namespace: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set by the repository on soft delete, cleared on restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Display title, 10 to 100 characters by default.
    pub title: String,

    pub price: Money,

    /// Units on hand. Negative input is floored to zero during validation.
    pub stock: i64,

    /// Raw status token. Kept as text so that an unknown value reaches
    /// validation and is reported as `InvalidStatus`.
    pub status: String,

    /// Stock keeping unit.
    #[serde(default)]
    pub sku: String,

    /// Referenced media ids, resolved through the media collaborator.
    #[serde(default)]
    pub medias: Vec<Uuid>,

    /// Ordered variants (size, color, ...).
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Creates a candidate product; id and timestamps are left for the
    /// service to assign.
    pub fn new(title: impl Into<String>, price: Money, status: ProductStatus) -> Self {
        Product {
            title: title.into(),
            price,
            status: status.as_str().to_string(),
            ..Product::default()
        }
    }

    /// Parsed status, `None` if the token is not in the closed set.
    pub fn parsed_status(&self) -> Option<ProductStatus> {
        self.status.parse().ok()
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Product-level media ids followed by every variant's media ids,
    /// in sequence order.
    pub fn media_refs(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.medias
            .iter()
            .copied()
            .chain(self.variants.iter().flat_map(|v| v.medias.iter().copied()))
    }
}

// =============================================================================
// Product Variant
// =============================================================================

/// A priced, stocked sub-option of a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: Uuid,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Owning product.
    pub product_id: Uuid,

    pub title: String,
    pub price: Money,
    pub stock: i64,

    #[serde(default)]
    pub medias: Vec<Uuid>,

    #[serde(default)]
    pub short_desc: String,
    #[serde(default)]
    pub html_desc: String,
    #[serde(default)]
    pub text_desc: String,
}

impl ProductVariant {
    pub fn new(title: impl Into<String>, price: Money) -> Self {
        ProductVariant {
            title: title.into(),
            price,
            ..ProductVariant::default()
        }
    }
}

// =============================================================================
// Media
// =============================================================================

/// Stored media metadata. The binary lives elsewhere; `url` points at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub filename: String,
    /// Public link for the media.
    pub url: String,
    /// Content type, e.g. `image/png`.
    pub media_type: String,
    /// Size in bytes.
    pub size: i64,
}

// =============================================================================
// Product Log
// =============================================================================

/// Audit record of a product change, persisted by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLogEvent {
    pub namespace: String,
    pub product_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: ProductEvent,
    /// Opaque payload (usually the product snapshot or the event body).
    pub data: serde_json::Value,
    /// Acting user, nil when the change was not attributed.
    pub user_id: Uuid,
}

// =============================================================================
// Filters
// =============================================================================

/// Query filter for `find`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Restrict to these ids; empty means any id.
    #[serde(default)]
    pub ids: Vec<Uuid>,

    #[serde(default)]
    pub status: Option<ProductStatus>,

    /// Include soft-deleted products.
    #[serde(default)]
    pub include_deleted: bool,

    #[serde(default)]
    pub limit: Option<u32>,
}

impl ProductFilter {
    pub fn by_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        ProductFilter {
            ids: ids.into_iter().collect(),
            ..ProductFilter::default()
        }
    }

    /// Whether `product` passes every criterion except `limit`.
    pub fn matches(&self, product: &Product) -> bool {
        if !self.ids.is_empty() && !self.ids.contains(&product.id) {
            return false;
        }
        if let Some(status) = self.status {
            if product.status != status.as_str() {
                return false;
            }
        }
        self.include_deleted || !product.is_deleted()
    }
}

/// Query filter for the product log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductLogFilter {
    pub namespace: String,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
    #[serde(default)]
    pub events: Vec<ProductEvent>,
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ProductLogFilter {
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        ProductLogFilter {
            namespace: namespace.into(),
            ..ProductLogFilter::default()
        }
    }

    /// Whether `entry` passes every criterion except paging.
    pub fn matches(&self, entry: &ProductLogEvent) -> bool {
        entry.namespace == self.namespace
            && (self.product_ids.is_empty() || self.product_ids.contains(&entry.product_id))
            && (self.events.is_empty() || self.events.contains(&entry.event))
            && (self.user_ids.is_empty() || self.user_ids.contains(&entry.user_id))
            && self.start.map_or(true, |start| entry.timestamp >= start)
            && self.end.map_or(true, |end| entry.timestamp < end)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("draft".parse::<ProductStatus>().unwrap(), ProductStatus::Draft);
        assert_eq!(
            "out_of_stock".parse::<ProductStatus>().unwrap(),
            ProductStatus::OutOfStock
        );
        assert_eq!(
            "archived".parse::<ProductStatus>(),
            Err(ValidationError::InvalidStatus("archived".to_string()))
        );
        assert!("".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ProductEvent::Created.as_str(), "product.created");
        assert_eq!(ProductEvent::Created.topic(), "product:created");
        assert_eq!(
            serde_json::to_string(&ProductEvent::StockUpdate).unwrap(),
            "\"product.stock.update\""
        );
        assert_eq!(
            "product.restored".parse::<ProductEvent>().unwrap(),
            ProductEvent::Restored
        );
    }

    #[test]
    fn test_unknown_event_name_is_typed_error() {
        // Bus topics are not log names.
        assert_eq!(
            "product:created".parse::<ProductEvent>(),
            Err(UnknownEvent("product:created".to_string()))
        );
        assert!("".parse::<ProductEvent>().is_err());
    }

    #[test]
    fn test_new_product_has_no_identity() {
        let product = Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Available);
        assert!(product.id.is_nil());
        assert_eq!(product.status, "available");
        assert_eq!(product.parsed_status(), Some(ProductStatus::Available));
    }

    #[test]
    fn test_media_refs_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let mut product = Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Draft);
        product.medias = vec![a];
        let mut variant = ProductVariant::new("Large", Money::from_cents(5000));
        variant.medias = vec![b, c];
        product.variants.push(variant);

        assert_eq!(product.media_refs().collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn test_filter_hides_deleted_by_default() {
        let mut product = Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Draft);
        product.id = Uuid::new_v4();
        product.deleted_at = Some(Utc::now());

        assert!(!ProductFilter::default().matches(&product));
        assert!(ProductFilter {
            include_deleted: true,
            ..ProductFilter::default()
        }
        .matches(&product));
        assert!(!ProductFilter::by_ids([Uuid::new_v4()]).matches(&product));
    }

    #[test]
    fn test_product_json_uses_money_text() {
        let product = Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Draft);
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], "50.00");
        assert_eq!(json["status"], "draft");
    }
}
