//! # Ports
//!
//! What the catalog needs from the outside world, as traits.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ProductService                                 │
//! │                                                                         │
//! │   AuthService ─────── who is calling, may they do this?                 │
//! │   MediaResolver ───── does this media id exist in the namespace?        │
//! │                                                                         │
//! │                           MediaService                                  │
//! │                                                                         │
//! │   FileStorage ─────── where uploaded bytes live, returns their URL      │
//! │   MediaRepository ─── durable media metadata                            │
//! │   ProductRepository ─ durable state, soft delete, product log           │
//! │   EventBus ────────── best-effort change notifications                  │
//! │                                                                         │
//! │   Adapters: in_memory (tests/dev), shopfront-db (SQLite),               │
//! │             auth::JwtAuthService (bearer tokens)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every port is `Send + Sync` and used as `Arc<dyn Port>`.

use std::sync::Arc;

use async_trait::async_trait;
use shopfront_core::types::{Media, Product, ProductFilter, ProductLogEvent, ProductLogFilter};
use thiserror::Error;
use uuid::Uuid;

use crate::context::RequestContext;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("auth backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn product_not_found(id: Uuid) -> Self {
        RepositoryError::NotFound {
            entity: "Product",
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventBusError {
    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("handler failed: {0}")]
    Handler(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("media not found: {0}")]
    NotFound(Uuid),

    #[error("media backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("cannot store '{filename}': {reason}")]
    Write { filename: String, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Auth
// =============================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Identity of the caller behind `ctx`.
    async fn resolve_caller_id(&self, ctx: &RequestContext) -> Result<Uuid, AuthError>;

    /// Whether `caller` holds `permission` (e.g. `product:create`) in `namespace`.
    async fn check_permission(
        &self,
        ctx: &RequestContext,
        caller: Uuid,
        namespace: &str,
        permission: &str,
    ) -> Result<bool, AuthError>;
}

// =============================================================================
// Product Repository
// =============================================================================

/// Durable product storage. Owns soft-delete semantics and the product log.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &Product,
    ) -> Result<(), RepositoryError>;

    async fn update(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &Product,
    ) -> Result<(), RepositoryError>;

    async fn delete(&self, ctx: &RequestContext, namespace: &str, id: Uuid)
        -> Result<(), RepositoryError>;

    async fn restore(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<(), RepositoryError>;

    async fn find(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<Product, RepositoryError>;

    async fn get_product_log(
        &self,
        ctx: &RequestContext,
        filter: &ProductLogFilter,
    ) -> Result<Vec<ProductLogEvent>, RepositoryError>;

    /// Applies `delta` to the product's stock, flooring at zero.
    /// Returns the new stock level.
    async fn adjust_stock(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
        delta: i64,
    ) -> Result<i64, RepositoryError>;
}

// =============================================================================
// Event Bus
// =============================================================================

/// Receives payloads published on a subscribed topic.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<(), EventBusError>;
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(
        &self,
        ctx: &RequestContext,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<(), EventBusError>;

    async fn subscribe(
        &self,
        ctx: &RequestContext,
        topic: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError>;
}

// =============================================================================
// Media
// =============================================================================

#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<Media, MediaError>;
}

/// Write side of media metadata.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn save(&self, ctx: &RequestContext, namespace: &str, media: &Media) -> Result<(), MediaError>;
}

/// Blob storage for uploaded files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `data` under `filename` in `namespace` and returns the public URL.
    /// An existing file with the same name is replaced.
    async fn save(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<String, StorageError>;
}
