//! # Catalog Errors
//!
//! What callers of [`crate::ProductService`] and [`crate::MediaService`] see.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Source                       │ Surfaces as                             │
//! │  ─────────────────────────────┼──────────────────────────────────────── │
//! │  auth error / nil caller      │ Unauthorized (wrapping the cause)       │
//! │  permission denied            │ Unauthorized                            │
//! │  rule violation               │ Validation(ValidationError)             │
//! │  repo error on create         │ FailedToCreate (detail only logged)     │
//! │  repo error elsewhere         │ Repository(RepositoryError), verbatim   │
//! │  publish error                │ never surfaces                          │
//! │  media type not allowed       │ InvalidMediaType(type)                  │
//! │  upload over the size limit   │ FileTooLarge { size, max }              │
//! │  file storage error           │ Storage(StorageError)                   │
//! │  media metadata error         │ Media(MediaError)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shopfront_core::error::ValidationError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::ports::{AuthError, MediaError, RepositoryError, StorageError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unauthorized")]
    Unauthorized {
        #[source]
        source: Option<AuthError>,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to create product")]
    FailedToCreate,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid media type: '{0}'")]
    InvalidMediaType(String),

    #[error("file too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl CatalogError {
    pub fn unauthorized() -> Self {
        CatalogError::Unauthorized { source: None }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CatalogError::Unauthorized { .. })
    }
}

impl From<AuthError> for CatalogError {
    fn from(err: AuthError) -> Self {
        CatalogError::Unauthorized { source: Some(err) }
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_unauthorized_keeps_cause() {
        let err = CatalogError::from(AuthError::InvalidToken("expired".to_string()));
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "unauthorized");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("invalid token: expired".to_string())
        );
    }

    #[test]
    fn test_validation_is_transparent() {
        let err = CatalogError::from(ValidationError::InvalidStatus("gone".to_string()));
        assert_eq!(err.to_string(), "invalid product status: 'gone'");
    }

    #[test]
    fn test_upload_rejections_carry_detail() {
        let err = CatalogError::InvalidMediaType("text/html".to_string());
        assert_eq!(err.to_string(), "invalid media type: 'text/html'");

        let err = CatalogError::FileTooLarge { size: 2048, max: 1024 };
        assert_eq!(err.to_string(), "file too large: 2048 bytes (max 1024)");
    }
}
