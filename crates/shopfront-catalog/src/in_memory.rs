//! In-memory adapters for tests and local development.
//!
//! - No persistence; state lives as long as the adapter
//! - Same observable semantics as the SQLite adapters (soft delete,
//!   namespace scoping, product log rows on every mutation)

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use shopfront_core::types::{
    Media, Product, ProductEvent, ProductFilter, ProductLogEvent, ProductLogFilter,
};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::ports::{
    AuthError, AuthService, EventBus, EventBusError, EventHandler, FileStorage, MediaError,
    MediaRepository, MediaResolver, ProductRepository, RepositoryError, StorageError,
};

// =============================================================================
// Product Repository
// =============================================================================

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<Uuid, Product>>,
    log: RwLock<Vec<ProductLogEvent>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored products, deleted ones included.
    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    async fn record(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product_id: Uuid,
        event: ProductEvent,
        data: serde_json::Value,
    ) {
        self.log.write().await.push(ProductLogEvent {
            namespace: namespace.to_string(),
            product_id,
            timestamp: Utc::now(),
            event,
            data,
            user_id: ctx.caller_or_nil(),
        });
    }
}

fn snapshot(product: &Product) -> serde_json::Value {
    serde_json::to_value(product).unwrap_or(serde_json::Value::Null)
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &Product,
    ) -> Result<(), RepositoryError> {
        {
            let mut products = self.products.write().await;
            if products.contains_key(&product.id) {
                return Err(RepositoryError::Conflict(format!(
                    "product {} already exists",
                    product.id
                )));
            }
            let mut stored = product.clone();
            stored.namespace = namespace.to_string();
            products.insert(product.id, stored);
        }

        self.record(ctx, namespace, product.id, ProductEvent::Created, snapshot(product))
            .await;
        Ok(())
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &Product,
    ) -> Result<(), RepositoryError> {
        {
            let mut products = self.products.write().await;
            let existing = products
                .get_mut(&product.id)
                .filter(|p| p.namespace == namespace && !p.is_deleted())
                .ok_or_else(|| RepositoryError::product_not_found(product.id))?;

            let created_at = existing.created_at;
            *existing = product.clone();
            existing.namespace = namespace.to_string();
            existing.created_at = created_at;
        }

        self.record(ctx, namespace, product.id, ProductEvent::Updated, snapshot(product))
            .await;
        Ok(())
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        {
            let mut products = self.products.write().await;
            let existing = products
                .get_mut(&id)
                .filter(|p| p.namespace == namespace && !p.is_deleted())
                .ok_or_else(|| RepositoryError::product_not_found(id))?;
            existing.deleted_at = Some(Utc::now());
        }

        self.record(ctx, namespace, id, ProductEvent::Deleted, json!({ "id": id }))
            .await;
        Ok(())
    }

    async fn restore(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        {
            let mut products = self.products.write().await;
            let existing = products
                .get_mut(&id)
                .filter(|p| p.namespace == namespace)
                .ok_or_else(|| RepositoryError::product_not_found(id))?;
            if !existing.is_deleted() {
                return Err(RepositoryError::Conflict(format!("product {} is not deleted", id)));
            }
            existing.deleted_at = None;
            existing.updated_at = Utc::now();
        }

        self.record(ctx, namespace, id, ProductEvent::Restored, json!({ "id": id }))
            .await;
        Ok(())
    }

    async fn find(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = products
            .values()
            .filter(|p| p.namespace == namespace && filter.matches(p))
            .cloned()
            .collect();

        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = filter.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn get_by_id(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<Product, RepositoryError> {
        self.products
            .read()
            .await
            .get(&id)
            .filter(|p| p.namespace == namespace && !p.is_deleted())
            .cloned()
            .ok_or_else(|| RepositoryError::product_not_found(id))
    }

    async fn get_product_log(
        &self,
        _ctx: &RequestContext,
        filter: &ProductLogFilter,
    ) -> Result<Vec<ProductLogEvent>, RepositoryError> {
        let log = self.log.read().await;
        let mut entries: Vec<ProductLogEvent> =
            log.iter().filter(|e| filter.matches(e)).cloned().collect();
        entries.sort_by_key(|e| e.timestamp);

        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(entries
            .into_iter()
            .skip(filter.offset as usize)
            .take(limit)
            .collect())
    }

    async fn adjust_stock(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
        delta: i64,
    ) -> Result<i64, RepositoryError> {
        let stock = {
            let mut products = self.products.write().await;
            let existing = products
                .get_mut(&id)
                .filter(|p| p.namespace == namespace && !p.is_deleted())
                .ok_or_else(|| RepositoryError::product_not_found(id))?;
            existing.stock = existing.stock.saturating_add(delta).max(0);
            existing.updated_at = Utc::now();
            existing.stock
        };

        self.record(
            ctx,
            namespace,
            id,
            ProductEvent::StockUpdate,
            json!({ "delta": delta, "stock": stock }),
        )
        .await;
        Ok(stock)
    }
}

// =============================================================================
// Event Bus
// =============================================================================

/// Topic → handlers fan-out. Every publish is kept in the history.
#[derive(Default)]
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    published: Mutex<Vec<(String, serde_json::Value)>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    pub async fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().await.clone()
    }

    /// Payloads published on `topic`, in order.
    pub async fn published_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .await
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(
        &self,
        ctx: &RequestContext,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<(), EventBusError> {
        self.published
            .lock()
            .await
            .push((topic.to_string(), payload.clone()));

        let handlers = self
            .handlers
            .read()
            .await
            .get(topic)
            .cloned()
            .unwrap_or_default();

        // Every handler runs; the first failure is reported.
        let mut first_failure = None;
        for handler in handlers {
            if let Err(e) = handler.handle(ctx, topic, payload).await {
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(EventBusError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn subscribe(
        &self,
        _ctx: &RequestContext,
        topic: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError> {
        self.handlers
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }
}

// =============================================================================
// Media
// =============================================================================

/// Media metadata keyed by id. Lookups are recorded in order.
#[derive(Default)]
pub struct InMemoryMediaStore {
    medias: RwLock<HashMap<Uuid, Media>>,
    lookups: Mutex<Vec<Uuid>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, media: Media) {
        self.medias.write().await.insert(media.id, media);
    }

    /// Stores a small PNG entry in `namespace` and returns its id.
    pub async fn insert_placeholder(&self, namespace: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.insert(Media {
            id,
            namespace: namespace.to_string(),
            created_at: now,
            updated_at: now,
            filename: format!("{}.png", id),
            url: format!("/media/{}/{}.png", namespace, id),
            media_type: "image/png".to_string(),
            size: 1024,
        })
        .await;
        id
    }

    pub async fn len(&self) -> usize {
        self.medias.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.medias.read().await.is_empty()
    }

    /// Ids passed to `get_by_id`, in call order.
    pub async fn lookups(&self) -> Vec<Uuid> {
        self.lookups.lock().await.clone()
    }
}

#[async_trait]
impl MediaResolver for InMemoryMediaStore {
    async fn get_by_id(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<Media, MediaError> {
        self.lookups.lock().await.push(id);
        self.medias
            .read()
            .await
            .get(&id)
            .filter(|m| m.namespace == namespace)
            .cloned()
            .ok_or(MediaError::NotFound(id))
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaStore {
    async fn save(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        media: &Media,
    ) -> Result<(), MediaError> {
        let mut medias = self.medias.write().await;
        if medias.contains_key(&media.id) {
            return Err(MediaError::Backend(format!("duplicate media id {}", media.id)));
        }
        let mut media = media.clone();
        media.namespace = namespace.to_string();
        medias.insert(media.id, media);
        Ok(())
    }
}

/// File bytes keyed by URL (`/media/{namespace}/{filename}`).
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn save(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        if filename.is_empty() || filename.contains('/') || filename == ".." {
            return Err(StorageError::Write {
                filename: filename.to_string(),
                reason: "not a plain file name".to_string(),
            });
        }
        let url = format!("/media/{}/{}", namespace, filename);
        self.files.write().await.insert(url.clone(), data.to_vec());
        Ok(url)
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Fixed caller with a fixed set of `(namespace, permission)` grants.
/// `"*"` in either position matches anything.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthService {
    caller: Option<Uuid>,
    grants: HashSet<(String, String)>,
}

impl StaticAuthService {
    pub fn new(caller: Uuid) -> Self {
        StaticAuthService {
            caller: Some(caller),
            grants: HashSet::new(),
        }
    }

    /// Caller holding every permission in every namespace.
    pub fn allow_all(caller: Uuid) -> Self {
        Self::new(caller).grant("*", "*")
    }

    /// No caller at all; identity resolution fails.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn grant(mut self, namespace: impl Into<String>, permission: impl Into<String>) -> Self {
        self.grants.insert((namespace.into(), permission.into()));
        self
    }
}

#[async_trait]
impl AuthService for StaticAuthService {
    async fn resolve_caller_id(&self, _ctx: &RequestContext) -> Result<Uuid, AuthError> {
        self.caller.ok_or(AuthError::MissingCredentials)
    }

    async fn check_permission(
        &self,
        _ctx: &RequestContext,
        caller: Uuid,
        namespace: &str,
        permission: &str,
    ) -> Result<bool, AuthError> {
        if self.caller != Some(caller) {
            return Ok(false);
        }
        Ok(self.grants.iter().any(|(ns, perm)| {
            (ns == "*" || ns == namespace) && (perm == "*" || perm == permission)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::money::Money;
    use shopfront_core::types::ProductStatus;

    fn stored_product(namespace: &str) -> Product {
        let mut p = Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Available);
        p.id = Uuid::new_v4();
        p.namespace = namespace.to_string();
        p.stock = 3;
        p.created_at = Utc::now();
        p.updated_at = p.created_at;
        p
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let repo = InMemoryProductRepository::new();
        let ctx = RequestContext::new().with_caller(Uuid::new_v4());
        let p = stored_product("acme");
        repo.create(&ctx, "acme", &p).await.unwrap();

        repo.delete(&ctx, "acme", p.id).await.unwrap();
        assert!(repo.get_by_id(&ctx, "acme", p.id).await.is_err());
        assert_eq!(repo.len().await, 1);

        let with_deleted = ProductFilter {
            include_deleted: true,
            ..ProductFilter::default()
        };
        assert_eq!(repo.find(&ctx, "acme", &with_deleted).await.unwrap().len(), 1);
        assert!(repo.find(&ctx, "acme", &ProductFilter::default()).await.unwrap().is_empty());

        assert_eq!(
            repo.delete(&ctx, "acme", p.id).await,
            Err(RepositoryError::product_not_found(p.id))
        );

        repo.restore(&ctx, "acme", p.id).await.unwrap();
        assert_eq!(repo.get_by_id(&ctx, "acme", p.id).await.unwrap().id, p.id);
        assert!(matches!(
            repo.restore(&ctx, "acme", p.id).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let repo = InMemoryProductRepository::new();
        let ctx = RequestContext::new();
        let p = stored_product("acme");
        repo.create(&ctx, "acme", &p).await.unwrap();

        assert!(repo.get_by_id(&ctx, "globex", p.id).await.is_err());
        assert!(repo.delete(&ctx, "globex", p.id).await.is_err());
        assert!(repo.find(&ctx, "globex", &ProductFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjust_stock_floors_at_zero() {
        let repo = InMemoryProductRepository::new();
        let ctx = RequestContext::new();
        let p = stored_product("acme");
        repo.create(&ctx, "acme", &p).await.unwrap();

        assert_eq!(repo.adjust_stock(&ctx, "acme", p.id, 4).await.unwrap(), 7);
        assert_eq!(repo.adjust_stock(&ctx, "acme", p.id, -10).await.unwrap(), 0);
        assert_eq!(repo.adjust_stock(&ctx, "acme", p.id, i64::MAX).await.unwrap(), i64::MAX);
        assert_eq!(repo.adjust_stock(&ctx, "acme", p.id, 1).await.unwrap(), i64::MAX);
    }

    #[tokio::test]
    async fn test_log_records_every_mutation() {
        let repo = InMemoryProductRepository::new();
        let user = Uuid::new_v4();
        let ctx = RequestContext::new().with_caller(user);
        let p = stored_product("acme");

        repo.create(&ctx, "acme", &p).await.unwrap();
        repo.update(&ctx, "acme", &p).await.unwrap();
        repo.adjust_stock(&ctx, "acme", p.id, 1).await.unwrap();
        repo.delete(&ctx, "acme", p.id).await.unwrap();
        repo.restore(&ctx, "acme", p.id).await.unwrap();

        let log = repo
            .get_product_log(&ctx, &ProductLogFilter::for_namespace("acme"))
            .await
            .unwrap();
        let events: Vec<ProductEvent> = log.iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                ProductEvent::Created,
                ProductEvent::Updated,
                ProductEvent::StockUpdate,
                ProductEvent::Deleted,
                ProductEvent::Restored,
            ]
        );
        assert!(log.iter().all(|e| e.user_id == user && e.product_id == p.id));

        let page = repo
            .get_product_log(
                &ctx,
                &ProductLogFilter {
                    offset: 1,
                    limit: Some(2),
                    ..ProductLogFilter::for_namespace("acme")
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].event, ProductEvent::Updated);
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            _topic: &str,
            _payload: &serde_json::Value,
        ) -> Result<(), EventBusError> {
            Err(EventBusError::Handler("boom".to_string()))
        }
    }

    struct Counting(Mutex<usize>);

    #[async_trait]
    impl EventHandler for Counting {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            _topic: &str,
            _payload: &serde_json::Value,
        ) -> Result<(), EventBusError> {
            *self.0.lock().await += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_bus_fans_out_and_reports_failures() {
        let bus = InMemoryEventBus::new();
        let ctx = RequestContext::new();
        let counter = Arc::new(Counting(Mutex::new(0)));

        bus.subscribe(&ctx, "product:created", Arc::new(Failing)).await.unwrap();
        bus.subscribe(&ctx, "product:created", counter.clone()).await.unwrap();

        let result = bus.publish(&ctx, "product:created", &json!({ "id": 1 })).await;
        assert!(matches!(result, Err(EventBusError::Publish { .. })));
        assert_eq!(*counter.0.lock().await, 1);

        bus.publish(&ctx, "product:updated", &json!({})).await.unwrap();
        assert_eq!(bus.published().await.len(), 2);
        assert_eq!(bus.published_on("product:created").await, vec![json!({ "id": 1 })]);
    }

    #[tokio::test]
    async fn test_static_auth_grants() {
        let caller = Uuid::new_v4();
        let auth = StaticAuthService::new(caller).grant("acme", "product:read");
        let ctx = RequestContext::new();

        assert!(auth.check_permission(&ctx, caller, "acme", "product:read").await.unwrap());
        assert!(!auth.check_permission(&ctx, caller, "acme", "product:create").await.unwrap());
        assert!(!auth.check_permission(&ctx, Uuid::new_v4(), "acme", "product:read").await.unwrap());
        assert!(StaticAuthService::anonymous().resolve_caller_id(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_file_storage_keys_by_namespace() {
        let storage = InMemoryFileStorage::new();
        let ctx = RequestContext::new();

        let url = storage.save(&ctx, "acme", "logo.png", b"png").await.unwrap();
        assert_eq!(url, "/media/acme/logo.png");
        storage.save(&ctx, "globex", "logo.png", b"other").await.unwrap();
        assert_eq!(storage.len().await, 2);
        assert_eq!(storage.get(&url).await, Some(b"png".to_vec()));

        let err = storage.save(&ctx, "acme", "../escape.png", b"x").await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[tokio::test]
    async fn test_media_store_saves_into_namespace() {
        let store = InMemoryMediaStore::new();
        let ctx = RequestContext::new();
        let id = store.insert_placeholder("acme").await;
        let mut media = store.get_by_id(&ctx, "acme", id).await.unwrap();

        assert!(MediaRepository::save(&store, &ctx, "acme", &media).await.is_err());

        media.id = Uuid::new_v4();
        MediaRepository::save(&store, &ctx, "globex", &media).await.unwrap();
        assert!(store.get_by_id(&ctx, "acme", media.id).await.is_err());
        assert_eq!(store.get_by_id(&ctx, "globex", media.id).await.unwrap().url, media.url);
    }
}
