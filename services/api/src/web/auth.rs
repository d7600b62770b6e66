//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, and logout.
//! Successful register/login calls issue an opaque bearer token backed by an
//! `auth_sessions` row.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::ports::PortError;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::{middleware::bearer_token, state::AppState};

const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    /// Send as `Authorization: Bearer <token>` on protected routes.
    pub token: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an auth session for `user_id` and returns its token. Expired sessions are
/// swept on the way.
async fn issue_token(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    match state.db.delete_expired_auth_sessions().await {
        Ok(0) => {}
        Ok(purged) => debug!("Purged {} expired auth sessions", purged),
        Err(e) => warn!("Failed to purge expired auth sessions: {}", e),
    }

    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.auth_session_days);
    state
        .db
        .create_auth_session(&token, user_id, expires_at)
        .await?;
    Ok(token)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    if !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create user and session
    let user = state.db.create_user_with_email(&email, &password_hash).await?;
    let token = issue_token(&state, user.user_id).await?;
    info!("Registered user {}", user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.user_id,
            email: user.email,
            token,
        }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);

    // 1. Get user by email; an unknown email looks the same as a wrong password.
    let user_creds = match state.db.get_user_by_email(&email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(PortError::Unauthorized.into()),
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| PortError::Unauthorized)?;

    // 3. Issue a bearer token
    let token = issue_token(&state, user_creds.user_id).await?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            user_id: user_creds.user_id,
            email: user_creds.email,
            token,
        }),
    ))
}

/// POST /api/auth/logout - Invalidate the presented bearer token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logout successful"),
        (status = 401, description = "No active session", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(PortError::Unauthorized)?;
    state.db.delete_auth_session(token).await?;
    Ok(StatusCode::NO_CONTENT)
}
