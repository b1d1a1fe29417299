// Hand-written fakes shared by the service tests.
//
// - RecordingRepository wraps the in-memory repository, counts calls and can
//   be told to fail every call with a fixed error.
// - FailingBus rejects every publish.
// - ErroringAuth / NilCallerAuth cover the two auth failure shapes.
// - FailingStorage / FailingMediaRepository reject every media write.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shopfront_catalog::context::RequestContext;
use shopfront_catalog::in_memory::{
    InMemoryEventBus, InMemoryMediaStore, InMemoryProductRepository, StaticAuthService,
};
use shopfront_catalog::ports::{
    AuthError, AuthService, EventBus, EventBusError, EventHandler, FileStorage, MediaError,
    MediaRepository, ProductRepository, RepositoryError, StorageError,
};
use shopfront_catalog::ProductService;
use shopfront_core::money::Money;
use shopfront_core::types::{Media, Product, ProductFilter, ProductLogEvent, ProductLogFilter, ProductStatus};
use shopfront_core::validation::ValidationRules;
use uuid::Uuid;

pub const NAMESPACE: &str = "acme";

// =============================================================================
// Repository
// =============================================================================

#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryProductRepository,
    calls: AtomicUsize,
    fail_with: Option<RepositoryError>,
}

impl RecordingRepository {
    pub fn failing(err: RepositoryError) -> Self {
        RecordingRepository {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProductRepository for RecordingRepository {
    async fn create(&self, ctx: &RequestContext, ns: &str, p: &Product) -> Result<(), RepositoryError> {
        self.enter()?;
        self.inner.create(ctx, ns, p).await
    }

    async fn update(&self, ctx: &RequestContext, ns: &str, p: &Product) -> Result<(), RepositoryError> {
        self.enter()?;
        self.inner.update(ctx, ns, p).await
    }

    async fn delete(&self, ctx: &RequestContext, ns: &str, id: Uuid) -> Result<(), RepositoryError> {
        self.enter()?;
        self.inner.delete(ctx, ns, id).await
    }

    async fn restore(&self, ctx: &RequestContext, ns: &str, id: Uuid) -> Result<(), RepositoryError> {
        self.enter()?;
        self.inner.restore(ctx, ns, id).await
    }

    async fn find(
        &self,
        ctx: &RequestContext,
        ns: &str,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.enter()?;
        self.inner.find(ctx, ns, filter).await
    }

    async fn get_by_id(&self, ctx: &RequestContext, ns: &str, id: Uuid) -> Result<Product, RepositoryError> {
        self.enter()?;
        self.inner.get_by_id(ctx, ns, id).await
    }

    async fn get_product_log(
        &self,
        ctx: &RequestContext,
        filter: &ProductLogFilter,
    ) -> Result<Vec<ProductLogEvent>, RepositoryError> {
        self.enter()?;
        self.inner.get_product_log(ctx, filter).await
    }

    async fn adjust_stock(
        &self,
        ctx: &RequestContext,
        ns: &str,
        id: Uuid,
        delta: i64,
    ) -> Result<i64, RepositoryError> {
        self.enter()?;
        self.inner.adjust_stock(ctx, ns, id, delta).await
    }
}

// =============================================================================
// Event Bus
// =============================================================================

#[derive(Default)]
pub struct FailingBus {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl EventBus for FailingBus {
    async fn publish(
        &self,
        _ctx: &RequestContext,
        topic: &str,
        _payload: &serde_json::Value,
    ) -> Result<(), EventBusError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EventBusError::Publish {
            topic: topic.to_string(),
            reason: "broker unavailable".to_string(),
        })
    }

    async fn subscribe(
        &self,
        _ctx: &RequestContext,
        topic: &str,
        _handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError> {
        Err(EventBusError::Subscribe {
            topic: topic.to_string(),
            reason: "broker unavailable".to_string(),
        })
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Resolves a caller but fails every permission check.
pub struct ErroringAuth(pub Uuid);

#[async_trait]
impl AuthService for ErroringAuth {
    async fn resolve_caller_id(&self, _ctx: &RequestContext) -> Result<Uuid, AuthError> {
        Ok(self.0)
    }

    async fn check_permission(
        &self,
        _ctx: &RequestContext,
        _caller: Uuid,
        _namespace: &str,
        _permission: &str,
    ) -> Result<bool, AuthError> {
        Err(AuthError::Backend("policy store down".to_string()))
    }
}

/// Resolves every caller to the nil id and allows everything.
pub struct NilCallerAuth;

#[async_trait]
impl AuthService for NilCallerAuth {
    async fn resolve_caller_id(&self, _ctx: &RequestContext) -> Result<Uuid, AuthError> {
        Ok(Uuid::nil())
    }

    async fn check_permission(
        &self,
        _ctx: &RequestContext,
        _caller: Uuid,
        _namespace: &str,
        _permission: &str,
    ) -> Result<bool, AuthError> {
        Ok(true)
    }
}

// =============================================================================
// Media
// =============================================================================

#[derive(Default)]
pub struct FailingStorage {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl FileStorage for FailingStorage {
    async fn save(
        &self,
        _ctx: &RequestContext,
        _namespace: &str,
        _filename: &str,
        _data: &[u8],
    ) -> Result<String, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Backend("disk full".to_string()))
    }
}

pub struct FailingMediaRepository;

#[async_trait]
impl MediaRepository for FailingMediaRepository {
    async fn save(&self, _ctx: &RequestContext, _namespace: &str, _media: &Media) -> Result<(), MediaError> {
        Err(MediaError::Backend("metadata store down".to_string()))
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub service: ProductService,
    pub repo: Arc<RecordingRepository>,
    pub bus: Arc<InMemoryEventBus>,
    pub media: Arc<InMemoryMediaStore>,
    pub caller: Uuid,
}

impl Harness {
    /// Caller holding every permission, healthy collaborators.
    pub fn new() -> Self {
        let caller = Uuid::new_v4();
        Self::build(
            RecordingRepository::default(),
            Arc::new(StaticAuthService::allow_all(caller)),
            caller,
        )
    }

    pub fn with_auth(auth: Arc<dyn AuthService>, caller: Uuid) -> Self {
        Self::build(RecordingRepository::default(), auth, caller)
    }

    pub fn with_repo(repo: RecordingRepository) -> Self {
        let caller = Uuid::new_v4();
        Self::build(repo, Arc::new(StaticAuthService::allow_all(caller)), caller)
    }

    fn build(repo: RecordingRepository, auth: Arc<dyn AuthService>, caller: Uuid) -> Self {
        let repo = Arc::new(repo);
        let bus = Arc::new(InMemoryEventBus::new());
        let media = Arc::new(InMemoryMediaStore::new());
        let service = ProductService::new(
            repo.clone(),
            bus.clone(),
            auth,
            media.clone(),
            ValidationRules::default(),
        );
        Harness {
            service,
            repo,
            bus,
            media,
            caller,
        }
    }

    pub fn ctx(&self) -> RequestContext {
        RequestContext::new()
    }

    /// Creates a valid product and returns it with its assigned id.
    pub async fn seeded(&self) -> Product {
        let mut product = valid_product();
        self.service
            .create_product(&self.ctx(), NAMESPACE, &mut product)
            .await
            .expect("seed product");
        product
    }
}

pub fn valid_product() -> Product {
    Product::new("Valid Product Title", Money::from_cents(5000), ProductStatus::Available)
}
