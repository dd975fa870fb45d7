//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Request context extraction (principal, locale, request id)
//!
//! Authentication is optional. With a JWT secret configured every request
//! must carry a valid `Bearer` token and writes need the `write` scope.
//! Without one, requests run as an anonymous principal holding every scope.

use crate::errors::{AppError, Result};
use crate::locale::Locale;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, Method},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Scope allowing reads
pub const SCOPE_READ: &str = "read";

/// Scope allowing creates, updates and deletes
pub const SCOPE_WRITE: &str = "write";

/// Scope implying every other scope
pub const SCOPE_ADMIN: &str = "admin";

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Subject of the token, `anonymous` when authentication is disabled
    pub subject: String,

    /// Scopes/permissions
    pub scopes: Vec<String>,
}

impl Principal {
    /// Caller used when authentication is disabled
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            scopes: vec![
                SCOPE_READ.to_string(),
                SCOPE_WRITE.to_string(),
                SCOPE_ADMIN.to_string(),
            ],
        }
    }

    /// Check if the principal has a specific scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope || s == SCOPE_ADMIN)
    }

    /// Require a specific scope, returning error if not present
    pub fn require_scope(&self, scope: &str) -> Result<()> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Missing required scope: {}", scope),
            })
        }
    }
}

/// Extracted context available to handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub principal: Principal,

    /// Language of user-facing messages
    pub locale: Locale,

    /// Request ID for tracing
    pub request_id: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user name or id)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, subject: &str, scopes: Vec<String>) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: subject.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            scopes,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid token".to_string(),
                },
            })
    }

    /// Principal carried by a valid token
    pub fn authenticate(&self, token: &str) -> Result<Principal> {
        let claims = self.validate_token(token)?;
        Ok(Principal {
            subject: claims.sub,
            scopes: claims.scopes,
        })
    }
}

/// Token manager held in router state; `None` disables authentication
#[derive(Clone, Default)]
pub struct Authenticator(pub Option<Arc<JwtManager>>);

impl Authenticator {
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn with_secret(secret: &str, expiration_secs: u64) -> Self {
        Self(Some(Arc::new(JwtManager::new(secret, expiration_secs))))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    /// Resolve the principal of a request
    ///
    /// Writes are any method other than GET, HEAD and OPTIONS.
    pub fn principal(&self, method: &Method, auth_header: Option<&str>) -> Result<Principal> {
        let Some(manager) = self.0.as_ref() else {
            return Ok(Principal::anonymous());
        };

        let token = auth_header
            .and_then(extract_bearer)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let principal = manager.authenticate(token)?;
        if is_write(method) {
            principal.require_scope(SCOPE_WRITE)?;
        } else {
            principal.require_scope(SCOPE_READ)?;
        }
        Ok(principal)
    }
}

fn is_write(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Extract the token from an Authorization header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Axum extractor for RequestContext
impl<S> FromRequestParts<S> for RequestContext
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Locale::from_accept_language)
            .unwrap_or_default();

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let principal = Authenticator::from_ref(state).principal(&parts.method, auth_header)?;

        Ok(RequestContext {
            principal,
            locale,
            request_id,
        })
    }
}
