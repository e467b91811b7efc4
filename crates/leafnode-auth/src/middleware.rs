//! Request caller identification

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use leafnode_core::INTERNAL_SECRET_HEADER;
use leafnode_db::UserRole;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;
use crate::internal::InternalSecret;
use crate::jwt::{Claims, JwtManager};

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub.parse().unwrap_or(0),
            username: claims.username.clone(),
            role: claims.role.parse().unwrap_or(UserRole::Reader),
        }
    }
}

/// Who is calling an endpoint
#[derive(Debug, Clone)]
pub enum Caller {
    /// Another job, authenticated by the shared secret
    Internal,
    User(AuthUser),
    /// Authentication is disabled
    Anonymous,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        match self {
            Caller::Internal | Caller::Anonymous => true,
            Caller::User(user) => user.role.is_admin(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Caller::Internal => "internal".to_string(),
            Caller::User(user) => user.username.clone(),
            Caller::Anonymous => "anonymous".to_string(),
        }
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Identify the caller from request headers.
///
/// A present secret header must match; otherwise a bearer token is
/// required. Role checks are left to the caller.
pub fn identify_caller(
    headers: &HeaderMap,
    jwt: &JwtManager,
    secret: Option<&InternalSecret>,
) -> Result<Caller, AuthError> {
    if let Some(presented) = headers
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        return match secret {
            Some(secret) if secret.matches(presented) => Ok(Caller::Internal),
            _ => Err(AuthError::InvalidSecret),
        };
    }

    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(header)?;
    let claims = jwt.validate_token(token)?;
    let user = AuthUser::from_claims(&claims);

    debug!("Authenticated user: {} ({})", user.username, user.role.as_str());

    Ok(Caller::User(user))
}
