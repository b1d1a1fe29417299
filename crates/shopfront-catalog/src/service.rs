//! # Product Service
//!
//! The product mutation orchestrator. Every operation is one linear pass:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         create_product                                  │
//! │                                                                         │
//! │  resolve caller ──► check "product:create" ──► assign id + timestamps   │
//! │        │                    │                          │                │
//! │   err / nil id         err / denied                    ▼                │
//! │        └──────► Unauthorized ◄──┘              validate (rules + media) │
//! │                                                        │                │
//! │                                              err ──► Validation(..)     │
//! │                                                        ▼                │
//! │                                                  repo.create            │
//! │                                                        │                │
//! │                                              err ──► FailedToCreate     │
//! │                                                        ▼                │
//! │                                  publish "product:created" (best-effort)│
//! │                                                        ▼                │
//! │                                                       Ok                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Update, delete, restore and stock adjustments follow the same shape but
//! return repository errors unchanged. Reads only authorize and delegate.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! # use shopfront_catalog::in_memory::*;
//! # use shopfront_catalog::{ProductService, RequestContext};
//! # use shopfront_core::{Money, Product, ProductStatus, ValidationRules};
//! # use uuid::Uuid;
//! # tokio_test_block(async {
//! let service = ProductService::new(
//!     Arc::new(InMemoryProductRepository::new()),
//!     Arc::new(InMemoryEventBus::new()),
//!     Arc::new(StaticAuthService::allow_all(Uuid::new_v4())),
//!     Arc::new(InMemoryMediaStore::new()),
//!     ValidationRules::default(),
//! );
//!
//! let mut product = Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Available);
//! service.create_product(&RequestContext::new(), "acme", &mut product).await.unwrap();
//! assert!(!product.id.is_nil());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::sync::Arc;

use chrono::Utc;
use shopfront_core::events::{
    DomainEvent, ProductCreated, ProductDeleted, ProductRestored, ProductStockUpdated,
    ProductUpdated,
};
use shopfront_core::types::{Product, ProductFilter, ProductLogEvent, ProductLogFilter};
use shopfront_core::validation::ValidationRules;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{CatalogError, CatalogResult};
use crate::ports::{AuthService, EventBus, MediaResolver, ProductRepository};
use crate::validate::validate_product;

/// Permission names checked by [`ProductService`] and [`crate::MediaService`].
pub mod permissions {
    pub const CREATE: &str = "product:create";
    pub const UPDATE: &str = "product:update";
    pub const DELETE: &str = "product:delete";
    pub const RESTORE: &str = "product:restore";
    pub const READ: &str = "product:read";
    pub const MEDIA_CREATE: &str = "media:create";
}

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    bus: Arc<dyn EventBus>,
    auth: Arc<dyn AuthService>,
    media: Arc<dyn MediaResolver>,
    rules: ValidationRules,
}

impl ProductService {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        bus: Arc<dyn EventBus>,
        auth: Arc<dyn AuthService>,
        media: Arc<dyn MediaResolver>,
        rules: ValidationRules,
    ) -> Self {
        ProductService {
            repo,
            bus,
            auth,
            media,
            rules,
        }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates `product` in `namespace`.
    ///
    /// Id, timestamps and namespace are assigned here and written back into
    /// `product`, overwriting whatever the caller supplied. Repository
    /// failures are reported as [`CatalogError::FailedToCreate`]; the cause
    /// is only logged.
    #[instrument(
        name = "catalog.create_product",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %namespace, product_id = tracing::field::Empty)
    )]
    pub async fn create_product(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &mut Product,
    ) -> CatalogResult<()> {
        let ctx = self.authorize(ctx, namespace, permissions::CREATE).await?;
        let caller = ctx.caller_or_nil();

        let now = Utc::now();
        product.id = Uuid::new_v4();
        product.namespace = namespace.to_string();
        product.created_at = now;
        product.updated_at = now;
        product.deleted_at = None;
        for variant in &mut product.variants {
            variant.id = Uuid::new_v4();
            variant.product_id = product.id;
            variant.namespace = namespace.to_string();
            variant.created_at = now;
            variant.updated_at = now;
        }
        tracing::Span::current().record("product_id", tracing::field::display(product.id));

        validate_product(&ctx, namespace, product, &self.rules, self.media.as_ref()).await?;

        if let Err(e) = self.repo.create(&ctx, namespace, product).await {
            error!(product_id = %product.id, error = %e, "Failed to persist new product");
            return Err(CatalogError::FailedToCreate);
        }

        self.publish_best_effort(
            &ctx,
            &ProductCreated {
                id: product.id,
                title: product.title.clone(),
                created_on: product.created_at,
                created_by: caller,
            },
        )
        .await;

        info!(product_id = %product.id, created_by = %caller, "Product created");
        Ok(())
    }

    /// Replaces the stored product with `product` after full re-validation.
    #[instrument(
        name = "catalog.update_product",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %namespace, product_id = %product.id)
    )]
    pub async fn update_product(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &mut Product,
    ) -> CatalogResult<()> {
        let ctx = self.authorize(ctx, namespace, permissions::UPDATE).await?;
        let caller = ctx.caller_or_nil();

        validate_product(&ctx, namespace, product, &self.rules, self.media.as_ref()).await?;

        let now = Utc::now();
        product.namespace = namespace.to_string();
        product.updated_at = now;
        for variant in &mut product.variants {
            if variant.id.is_nil() {
                variant.id = Uuid::new_v4();
                variant.created_at = now;
            }
            variant.product_id = product.id;
            variant.namespace = namespace.to_string();
            variant.updated_at = now;
        }

        self.repo
            .update(&ctx, namespace, product)
            .await
            .inspect_err(|e| error!(product_id = %product.id, error = %e, "Failed to update product"))?;

        self.publish_best_effort(
            &ctx,
            &ProductUpdated {
                id: product.id,
                updated_on: now,
                updated_by: caller,
            },
        )
        .await;

        info!(product_id = %product.id, updated_by = %caller, "Product updated");
        Ok(())
    }

    /// Soft-deletes a product; the repository owns what that means.
    #[instrument(
        name = "catalog.delete_product",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %namespace, product_id = %id)
    )]
    pub async fn delete_product(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> CatalogResult<()> {
        let ctx = self.authorize(ctx, namespace, permissions::DELETE).await?;
        let caller = ctx.caller_or_nil();

        self.repo
            .delete(&ctx, namespace, id)
            .await
            .inspect_err(|e| warn!(product_id = %id, error = %e, "Failed to delete product"))?;

        self.publish_best_effort(
            &ctx,
            &ProductDeleted {
                id,
                deleted_on: Utc::now(),
                deleted_by: caller,
            },
        )
        .await;

        info!(product_id = %id, deleted_by = %caller, "Product deleted");
        Ok(())
    }

    #[instrument(
        name = "catalog.restore_product",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %namespace, product_id = %id)
    )]
    pub async fn restore_product(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> CatalogResult<()> {
        let ctx = self.authorize(ctx, namespace, permissions::RESTORE).await?;
        let caller = ctx.caller_or_nil();

        self.repo
            .restore(&ctx, namespace, id)
            .await
            .inspect_err(|e| warn!(product_id = %id, error = %e, "Failed to restore product"))?;

        self.publish_best_effort(
            &ctx,
            &ProductRestored {
                id,
                restored_on: Utc::now(),
                restored_by: caller,
            },
        )
        .await;

        info!(product_id = %id, restored_by = %caller, "Product restored");
        Ok(())
    }

    /// Adds `delta` to the product's stock (floored at zero) and returns the
    /// new level.
    #[instrument(
        name = "catalog.adjust_stock",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %namespace, product_id = %id, delta = delta)
    )]
    pub async fn adjust_stock(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
        delta: i64,
    ) -> CatalogResult<i64> {
        let ctx = self.authorize(ctx, namespace, permissions::UPDATE).await?;
        let caller = ctx.caller_or_nil();

        let stock = self
            .repo
            .adjust_stock(&ctx, namespace, id, delta)
            .await
            .inspect_err(|e| warn!(product_id = %id, error = %e, "Failed to adjust stock"))?;

        self.publish_best_effort(
            &ctx,
            &ProductStockUpdated {
                id,
                delta,
                stock,
                updated_on: Utc::now(),
                updated_by: caller,
            },
        )
        .await;

        info!(product_id = %id, delta, stock, "Stock adjusted");
        Ok(stock)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[instrument(
        name = "catalog.find",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %namespace)
    )]
    pub async fn find(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        filter: &ProductFilter,
    ) -> CatalogResult<Vec<Product>> {
        let ctx = self.authorize(ctx, namespace, permissions::READ).await?;
        let products = self.repo.find(&ctx, namespace, filter).await?;
        debug!(count = products.len(), "Products found");
        Ok(products)
    }

    #[instrument(
        name = "catalog.get_product",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %namespace, product_id = %id)
    )]
    pub async fn get_product(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> CatalogResult<Product> {
        let ctx = self.authorize(ctx, namespace, permissions::READ).await?;
        Ok(self.repo.get_by_id(&ctx, namespace, id).await?)
    }

    /// Audit trail, authorized against `filter.namespace`.
    #[instrument(
        name = "catalog.product_log",
        skip_all,
        fields(request_id = %ctx.request_id, namespace = %filter.namespace)
    )]
    pub async fn product_log(
        &self,
        ctx: &RequestContext,
        filter: &ProductLogFilter,
    ) -> CatalogResult<Vec<ProductLogEvent>> {
        let ctx = self
            .authorize(ctx, &filter.namespace, permissions::READ)
            .await?;
        Ok(self.repo.get_product_log(&ctx, filter).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn authorize(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        permission: &str,
    ) -> CatalogResult<RequestContext> {
        authorize(self.auth.as_ref(), ctx, namespace, permission).await
    }

    /// Fire-and-forget publish. Failures are logged and never returned.
    async fn publish_best_effort<E: DomainEvent + Sync>(&self, ctx: &RequestContext, event: &E) {
        let topic = E::KIND.topic();

        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(topic, product_id = %event.product_id(), error = %e, "Failed to encode event");
                return;
            }
        };

        if let Err(e) = self.bus.publish(ctx, topic, &payload).await {
            error!(topic, product_id = %event.product_id(), error = %e, "Failed to publish event");
        }
    }
}

/// Resolves the caller and checks `permission` in `namespace`.
/// Returns the context attributed to the caller.
pub(crate) async fn authorize(
    auth: &dyn AuthService,
    ctx: &RequestContext,
    namespace: &str,
    permission: &str,
) -> CatalogResult<RequestContext> {
    let caller = auth.resolve_caller_id(ctx).await.map_err(|e| {
        debug!(error = %e, "Caller resolution failed");
        CatalogError::from(e)
    })?;

    if caller.is_nil() {
        debug!("Caller resolved to nil id");
        return Err(CatalogError::unauthorized());
    }

    let allowed = auth.check_permission(ctx, caller, namespace, permission).await?;

    if !allowed {
        info!(%caller, permission, "Permission denied");
        return Err(CatalogError::unauthorized());
    }

    Ok(ctx.with_caller(caller))
}
