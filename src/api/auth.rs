use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::api::types::{AdminCreatedDto, LoginRequest, RegisterRequest, TokenPairDto};
use crate::state::AppState;

/// Verified administrator identity, injected into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub id: i32,
    pub username: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    Some(token.trim().to_string())
}

/// Gate for every mutating project operation: verify the bearer access
/// token and re-check that the administrator still exists before letting the
/// request through.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers).ok_or_else(ApiError::invalid_token)?;

    let claims = state
        .tokens
        .verify(&token)
        .map_err(|_| ApiError::invalid_token())?;

    let admin = state
        .store
        .get_admin_by_username(&claims.sub)
        .await?
        .ok_or_else(ApiError::invalid_token)?;

    request.extensions_mut().insert(AdminIdentity {
        id: admin.id,
        username: admin.username,
    });

    Ok(next.run(request).await)
}

/// POST /admin/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<AdminCreatedDto>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    let admin = state
        .store
        .create_admin(&payload.username, &payload.password, &state.config.security)
        .await?;

    Ok(ApiResponse::created(
        "administrator registered",
        AdminCreatedDto {
            id: admin.id,
            username: admin.username,
        },
    ))
}

/// POST /admin/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<TokenPairDto>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::invalid_credentials());
    }

    let admin = state
        .store
        .verify_admin_credentials(&payload.username, &payload.password)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    let tokens = issue_token_pair(&state, admin.id, &admin.username)?;
    Ok(ApiResponse::ok("login succeeded", tokens))
}

/// GET /admin/refresh-token
///
/// Accepts the refresh token as the bearer credential and rotates both
/// tokens.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<ApiResponse<TokenPairDto>, ApiError> {
    let token = bearer_token(&headers).ok_or_else(ApiError::invalid_token)?;

    let claims = state
        .tokens
        .verify(&token)
        .map_err(|_| ApiError::invalid_token())?;

    let admin = state
        .store
        .get_admin_by_username(&claims.sub)
        .await?
        .ok_or_else(ApiError::invalid_token)?;

    let tokens = issue_token_pair(&state, admin.id, &admin.username)?;
    Ok(ApiResponse::ok("token refreshed", tokens))
}

/// DELETE /admin/delete
///
/// Authenticated self-service removal; owned projects go with the account.
pub async fn delete_admin(
    State(state): State<Arc<AppState>>,
    axum::Extension(admin): axum::Extension<AdminIdentity>,
) -> Result<ApiResponse<()>, ApiError> {
    if !state.store.delete_admin(admin.id).await? {
        return Err(ApiError::NotFound(format!(
            "administrator {} not found",
            admin.username
        )));
    }

    Ok(ApiResponse::ok("administrator deleted", ()))
}

fn issue_token_pair(
    state: &AppState,
    admin_id: i32,
    username: &str,
) -> Result<TokenPairDto, ApiError> {
    let access_token = state
        .tokens
        .sign_access(admin_id, username)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let refresh_token = state
        .tokens
        .sign_refresh(admin_id, username)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(TokenPairDto {
        access_token,
        refresh_token,
        token_type: "bearer",
        username: username.to_string(),
    })
}
