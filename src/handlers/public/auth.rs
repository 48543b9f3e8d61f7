// handlers/public/auth.rs - POST /api/auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use crate::api::{LoginRequest, LoginResponse};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/auth/login - exchange username/password for a bearer token
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    request.validate()?;

    // bcrypt verification is CPU bound; keep it off the async workers
    let authenticator = state.authenticator.clone();
    let (username, password) = (request.username.clone(), request.password);
    let outcome = tokio::task::spawn_blocking(move || authenticator.authenticate(&username, &password))
        .await
        .map_err(|e| {
            tracing::error!("Login task failed: {}", e);
            ApiError::internal_server_error("Authentication unavailable")
        })?;

    let principal = match outcome {
        Ok(principal) => principal,
        Err(e) => {
            tracing::warn!("Failed login for user {}", request.username);
            return Err(e.into());
        }
    };

    let token = state.jwt.generate_token(&principal.username)?;
    tracing::info!("Issued token for user {} ({})", principal.username, principal.role);
    Ok(ApiResponse::success(LoginResponse::bearer(token)))
}
