//! JWT authentication adapter.
//!
//! Bearer tokens carry the caller id and the permissions it holds per
//! namespace:
//!
//! ```text
//! {
//!   "sub": "6f1c...",                      caller id
//!   "iat": 1700000000, "exp": 1700003600,
//!   "jti": "b2a4...",
//!   "grants": {
//!     "acme":   ["product:*"],             every product permission
//!     "globex": ["product:read"],
//!     "*":      ["product:read"]           any namespace
//!   }
//! }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::context::RequestContext;
use crate::ports::{AuthError, AuthService};

/// Matches any namespace or any permission.
pub const WILDCARD: &str = "*";

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (caller id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,

    /// Namespace → granted permissions
    #[serde(default)]
    pub grants: HashMap<String, Vec<String>>,
}

impl Claims {
    /// Whether the grants cover `permission` in `namespace`.
    pub fn allows(&self, namespace: &str, permission: &str) -> bool {
        [namespace, WILDCARD]
            .iter()
            .filter_map(|ns| self.grants.get(*ns))
            .flatten()
            .any(|granted| permission_matches(granted, permission))
    }
}

/// `*` matches everything; `product:*` matches every `product:` permission.
fn permission_matches(granted: &str, requested: &str) -> bool {
    if granted == WILDCARD || granted == requested {
        return true;
    }
    match granted.strip_suffix('*') {
        Some(prefix) if prefix.ends_with(':') => requested.starts_with(prefix),
        _ => false,
    }
}

/// HS256 bearer-token auth.
pub struct JwtAuthService {
    secret: String,
    lifetime_secs: i64,
}

impl JwtAuthService {
    pub fn new(secret: impl Into<String>, lifetime_secs: i64) -> Self {
        JwtAuthService {
            secret: secret.into(),
            lifetime_secs,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_lifetime_secs)
    }

    /// Issues a token for `caller` holding `grants`.
    pub fn issue_token(
        &self,
        caller: Uuid,
        grants: HashMap<String, Vec<String>>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: caller.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            grants,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Backend(format!("Failed to generate token: {}", e)))
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn claims_from(&self, ctx: &RequestContext) -> Result<Claims, AuthError> {
        let token = ctx
            .bearer_token
            .as_deref()
            .ok_or(AuthError::MissingCredentials)?;
        self.validate_token(token)
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn resolve_caller_id(&self, ctx: &RequestContext) -> Result<Uuid, AuthError> {
        let claims = self.claims_from(ctx)?;
        Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken(format!("subject is not a uuid: {}", claims.sub)))
    }

    async fn check_permission(
        &self,
        ctx: &RequestContext,
        caller: Uuid,
        namespace: &str,
        permission: &str,
    ) -> Result<bool, AuthError> {
        let claims = self.claims_from(ctx)?;
        if claims.sub != caller.to_string() {
            debug!(%caller, subject = %claims.sub, "Token subject does not match caller");
            return Ok(false);
        }
        Ok(claims.allows(namespace, permission))
    }
}
