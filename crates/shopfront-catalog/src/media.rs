//! # Media Service
//!
//! Accepts an uploaded file, stores its bytes and records its metadata so
//! products can reference it by id.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              save                                       │
//! │                                                                         │
//! │  resolve caller ──► check "media:create" ──► type in allowlist?         │
//! │        │                    │                     │                     │
//! │   err / nil id         err / denied          no ──► InvalidMediaType    │
//! │        └──────► Unauthorized ◄──┘                 ▼                     │
//! │                                           size <= max_size?             │
//! │                                                   │                     │
//! │                                          no ──► FileTooLarge            │
//! │                                                   ▼                     │
//! │                                           storage.save ──► url          │
//! │                                                   │                     │
//! │                                          err ──► Storage(..)            │
//! │                                                   ▼                     │
//! │                                    repo.save(new id, now, url, size)    │
//! │                                                   │                     │
//! │                                          err ──► Media(..)              │
//! │                                                   ▼                     │
//! │                                                  Ok(Media)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing touches storage until the caller is authorized and the upload
//! passes both checks.

use std::sync::Arc;

use chrono::Utc;
use shopfront_core::types::Media;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{CatalogError, CatalogResult};
use crate::ports::{AuthService, FileStorage, MediaRepository};
use crate::service::{authorize, permissions};

/// Which uploads are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLimits {
    /// MIME types, compared case-insensitively.
    pub allowed_types: Vec<String>,
    /// Largest accepted upload in bytes.
    pub max_size: u64,
}

impl MediaLimits {
    pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

    pub fn default_types() -> Vec<String> {
        ["image/png", "image/jpeg", "image/webp", "image/gif"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn allows_type(&self, media_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
    }
}

impl Default for MediaLimits {
    fn default() -> Self {
        MediaLimits {
            allowed_types: Self::default_types(),
            max_size: Self::DEFAULT_MAX_SIZE,
        }
    }
}

pub struct MediaService {
    auth: Arc<dyn AuthService>,
    storage: Arc<dyn FileStorage>,
    repo: Arc<dyn MediaRepository>,
    limits: MediaLimits,
}

impl MediaService {
    pub fn new(
        auth: Arc<dyn AuthService>,
        storage: Arc<dyn FileStorage>,
        repo: Arc<dyn MediaRepository>,
        limits: MediaLimits,
    ) -> Self {
        MediaService {
            auth,
            storage,
            repo,
            limits,
        }
    }

    pub fn limits(&self) -> &MediaLimits {
        &self.limits
    }

    /// Stores `data` as `filename` in `namespace` and records it.
    ///
    /// A storage failure leaves no metadata behind. A metadata failure after
    /// a successful store leaves the file orphaned; it is logged with its URL.
    #[instrument(
        name = "catalog.save_media",
        skip_all,
        fields(
            request_id = %ctx.request_id,
            namespace = %namespace,
            media_type = %media_type,
            size = data.len() as u64,
            media_id = tracing::field::Empty
        )
    )]
    pub async fn save(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        filename: &str,
        media_type: &str,
        data: &[u8],
    ) -> CatalogResult<Media> {
        let ctx = authorize(self.auth.as_ref(), ctx, namespace, permissions::MEDIA_CREATE).await?;

        if !self.limits.allows_type(media_type) {
            info!("Rejected media type");
            return Err(CatalogError::InvalidMediaType(media_type.to_string()));
        }

        let size = data.len() as u64;
        if size > self.limits.max_size {
            info!(max = self.limits.max_size, "Rejected oversized upload");
            return Err(CatalogError::FileTooLarge {
                size,
                max: self.limits.max_size,
            });
        }

        let url = self
            .storage
            .save(&ctx, namespace, filename, data)
            .await
            .map_err(|e| {
                error!(filename, error = %e, "Failed to store media file");
                CatalogError::from(e)
            })?;

        let now = Utc::now();
        let media = Media {
            id: Uuid::new_v4(),
            namespace: namespace.to_string(),
            created_at: now,
            updated_at: now,
            filename: filename.to_string(),
            url,
            media_type: media_type.to_string(),
            size: size as i64,
        };
        tracing::Span::current().record("media_id", tracing::field::display(media.id));

        if let Err(e) = self.repo.save(&ctx, namespace, &media).await {
            warn!(url = %media.url, error = %e, "Stored file has no media record");
            return Err(e.into());
        }

        info!("Media saved");
        Ok(media)
    }
}
