// Media upload behavior: permission, type allowlist, size limit, and what
// reaches storage and the metadata store.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rstest::rstest;
use shopfront_catalog::in_memory::{InMemoryFileStorage, InMemoryMediaStore, StaticAuthService};
use shopfront_catalog::ports::{AuthService, MediaError, MediaResolver, StorageError};
use shopfront_catalog::service::permissions;
use shopfront_catalog::{CatalogError, MediaLimits, MediaService, RequestContext};
use uuid::Uuid;

use common::*;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake image body";

struct MediaHarness {
    service: MediaService,
    storage: Arc<InMemoryFileStorage>,
    store: Arc<InMemoryMediaStore>,
}

fn limits(max_size: u64) -> MediaLimits {
    MediaLimits {
        allowed_types: vec!["image/png".to_string(), "image/jpeg".to_string()],
        max_size,
    }
}

fn harness_with(auth: Arc<dyn AuthService>, limits: MediaLimits) -> MediaHarness {
    let storage = Arc::new(InMemoryFileStorage::new());
    let store = Arc::new(InMemoryMediaStore::new());
    let service = MediaService::new(auth, storage.clone(), store.clone(), limits);
    MediaHarness {
        service,
        storage,
        store,
    }
}

fn harness() -> MediaHarness {
    harness_with(Arc::new(StaticAuthService::allow_all(Uuid::new_v4())), limits(1024))
}

fn ctx() -> RequestContext {
    RequestContext::new()
}

#[tokio::test]
async fn save_stores_bytes_and_records_media() {
    let h = harness();

    let media = h
        .service
        .save(&ctx(), NAMESPACE, "logo.png", "image/png", PNG)
        .await
        .unwrap();

    assert!(!media.id.is_nil());
    assert_eq!(media.namespace, NAMESPACE);
    assert_eq!(media.filename, "logo.png");
    assert_eq!(media.media_type, "image/png");
    assert_eq!(media.size, PNG.len() as i64);
    assert_eq!(media.created_at, media.updated_at);
    assert_eq!(h.storage.get(&media.url).await, Some(PNG.to_vec()));

    // products can now reference it
    let resolved = h.store.get_by_id(&ctx(), NAMESPACE, media.id).await.unwrap();
    assert_eq!(resolved, media);
    assert_eq!(h.store.len().await, 1);
}

#[rstest]
#[case::html("text/html")]
#[case::svg("image/svg+xml")]
#[case::empty("")]
#[tokio::test]
async fn save_rejects_types_outside_allowlist(#[case] media_type: &str) {
    let h = harness();

    let err = h
        .service
        .save(&ctx(), NAMESPACE, "page.bin", media_type, PNG)
        .await
        .unwrap_err();

    match err {
        CatalogError::InvalidMediaType(t) => assert_eq!(t, media_type),
        other => panic!("expected invalid media type, got {:?}", other),
    }
    assert!(h.storage.is_empty().await);
}

#[tokio::test]
async fn save_matches_type_case_insensitively() {
    let h = harness();
    let media = h
        .service
        .save(&ctx(), NAMESPACE, "photo.jpg", "IMAGE/JPEG", PNG)
        .await
        .unwrap();
    assert_eq!(media.media_type, "IMAGE/JPEG");
}

#[tokio::test]
async fn save_rejects_oversized_file() {
    let h = harness_with(
        Arc::new(StaticAuthService::allow_all(Uuid::new_v4())),
        limits(PNG.len() as u64 - 1),
    );

    let err = h
        .service
        .save(&ctx(), NAMESPACE, "logo.png", "image/png", PNG)
        .await
        .unwrap_err();

    match err {
        CatalogError::FileTooLarge { size, max } => {
            assert_eq!(size, PNG.len() as u64);
            assert_eq!(max, PNG.len() as u64 - 1);
        }
        other => panic!("expected file too large, got {:?}", other),
    }
    assert!(h.storage.is_empty().await);
}

#[tokio::test]
async fn save_accepts_file_at_exact_limit() {
    let h = harness_with(
        Arc::new(StaticAuthService::allow_all(Uuid::new_v4())),
        limits(PNG.len() as u64),
    );
    assert!(h.service.save(&ctx(), NAMESPACE, "logo.png", "image/png", PNG).await.is_ok());
}

#[tokio::test]
async fn save_requires_media_create_permission() {
    let caller = Uuid::new_v4();
    // product permissions do not cover uploads
    let auth = StaticAuthService::new(caller).grant(NAMESPACE, permissions::CREATE);
    let h = harness_with(Arc::new(auth), limits(1024));

    let err = h
        .service
        .save(&ctx(), NAMESPACE, "logo.png", "image/png", PNG)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(h.storage.is_empty().await);

    let auth = StaticAuthService::new(caller).grant(NAMESPACE, permissions::MEDIA_CREATE);
    let h = harness_with(Arc::new(auth), limits(1024));
    assert!(h.service.save(&ctx(), NAMESPACE, "logo.png", "image/png", PNG).await.is_ok());
    assert!(h.service.save(&ctx(), "globex", "logo.png", "image/png", PNG).await.unwrap_err().is_unauthorized());
}

#[rstest]
#[case::auth_backend_error(Arc::new(ErroringAuth(Uuid::new_v4())) as Arc<dyn AuthService>)]
#[case::nil_caller(Arc::new(NilCallerAuth) as Arc<dyn AuthService>)]
#[case::anonymous(Arc::new(StaticAuthService::anonymous()) as Arc<dyn AuthService>)]
#[tokio::test]
async fn save_unauthorized_before_any_check(#[case] auth: Arc<dyn AuthService>) {
    let h = harness_with(auth, limits(1024));

    // an invalid type must not leak through ahead of authorization
    let err = h
        .service
        .save(&ctx(), NAMESPACE, "page.html", "text/html", PNG)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(h.storage.is_empty().await);
}

#[tokio::test]
async fn storage_failure_records_nothing() {
    let storage = Arc::new(FailingStorage::default());
    let store = Arc::new(InMemoryMediaStore::new());
    let service = MediaService::new(
        Arc::new(StaticAuthService::allow_all(Uuid::new_v4())),
        storage.clone(),
        store.clone(),
        limits(1024),
    );

    let err = service
        .save(&ctx(), NAMESPACE, "logo.png", "image/png", PNG)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Storage(StorageError::Backend(_))));
    assert_eq!(storage.attempts.load(Ordering::SeqCst), 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn metadata_failure_is_returned() {
    let storage = Arc::new(InMemoryFileStorage::new());
    let service = MediaService::new(
        Arc::new(StaticAuthService::allow_all(Uuid::new_v4())),
        storage.clone(),
        Arc::new(FailingMediaRepository),
        limits(1024),
    );

    let err = service
        .save(&ctx(), NAMESPACE, "logo.png", "image/png", PNG)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Media(MediaError::Backend(_))));
    // the file was written before the record failed
    assert_eq!(storage.len().await, 1);
}
