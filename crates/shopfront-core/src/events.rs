//! # Event Payloads
//!
//! Bodies published on the event bus after a successful product change.
//! Each payload knows its [`ProductEvent`] kind, which gives the topic.
//!
//! ```text
//! ProductService::create_product ──► "product:created"  ProductCreated
//! ProductService::update_product ──► "product:updated"  ProductUpdated
//! ProductService::delete_product ──► "product:deleted"  ProductDeleted
//! ProductService::restore_product ─► "product:restored" ProductRestored
//! ProductService::adjust_stock ────► "product:stock.update" ProductStockUpdated
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ProductEvent;

/// A serializable event body with a fixed kind.
pub trait DomainEvent: Serialize {
    const KIND: ProductEvent;

    fn product_id(&self) -> Uuid;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub id: Uuid,
    pub title: String,
    pub created_on: DateTime<Utc>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdated {
    pub id: Uuid,
    pub updated_on: DateTime<Utc>,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub id: Uuid,
    pub deleted_on: DateTime<Utc>,
    pub deleted_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRestored {
    pub id: Uuid,
    pub restored_on: DateTime<Utc>,
    pub restored_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStockUpdated {
    pub id: Uuid,
    pub delta: i64,
    pub stock: i64,
    pub updated_on: DateTime<Utc>,
    pub updated_by: Uuid,
}

impl DomainEvent for ProductCreated {
    const KIND: ProductEvent = ProductEvent::Created;

    fn product_id(&self) -> Uuid {
        self.id
    }
}

impl DomainEvent for ProductUpdated {
    const KIND: ProductEvent = ProductEvent::Updated;

    fn product_id(&self) -> Uuid {
        self.id
    }
}

impl DomainEvent for ProductDeleted {
    const KIND: ProductEvent = ProductEvent::Deleted;

    fn product_id(&self) -> Uuid {
        self.id
    }
}

impl DomainEvent for ProductRestored {
    const KIND: ProductEvent = ProductEvent::Restored;

    fn product_id(&self) -> Uuid {
        self.id
    }
}

impl DomainEvent for ProductStockUpdated {
    const KIND: ProductEvent = ProductEvent::StockUpdate;

    fn product_id(&self) -> Uuid {
        self.id
    }
}
