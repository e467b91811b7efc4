//! Authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::request::Parts,
    routing::post,
};
use leafnode_auth::{Caller, identify_caller, verify_password};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse};

// ==================== Auth Extractors ====================

/// Identify the caller of a request against the configured credentials
pub(crate) fn authenticate(state: &AppState, parts: &Parts) -> Result<Caller, ApiError> {
    if !state.auth_enabled {
        return Ok(Caller::Anonymous);
    }
    let caller = identify_caller(&parts.headers, &state.jwt, state.internal_secret.as_ref())?;
    debug!("Request from {}", caller.label());
    Ok(caller)
}

/// Extractor for any authenticated caller
pub struct RequireAuth(pub Caller);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        authenticate(&app_state, parts).map(RequireAuth)
    }
}

/// Extractor for admin users and other jobs
pub struct RequireAdmin(pub Caller);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(caller) = RequireAuth::from_request_parts(parts, state).await?;

        if !caller.is_admin() {
            return Err(ApiError::Forbidden);
        }

        Ok(RequireAdmin(caller))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length
const MAX_PASSWORD_LENGTH: usize = 256;

fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    if request.username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if request.username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// Valid argon2 hash that never verifies, checked when the user is unknown
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_login(&request)?;
    debug!("Login attempt for user: {}", request.username);

    let user = state.db.get_user_by_username(&request.username).await?;

    // Verify even for unknown users so both paths take the same time
    let hash = user
        .as_ref()
        .map(|u| u.password_hash.as_str())
        .unwrap_or(DUMMY_HASH);
    let password_valid = verify_password(&request.password, hash)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(ApiError::Unauthorized),
    };

    let token = state.jwt.generate_token(&user)?;

    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt.token_expiry_hours() * 3600,
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/auth/login", post(login))
}
