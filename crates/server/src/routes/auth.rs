use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use reservations_core::auth::{LoginRequest, RefreshRequest};
use reservations_core::{TokenKind, TokenPair};
use tracing::info;

use crate::error::ApiError;
use crate::extractor::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login)).route("/auth/refresh", post(refresh))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user_id = state.auth.authenticate(&request.username, &request.password).await?;
    let pair = state.tokens.issue_pair(user_id)?;
    info!(event_name = "auth.login.succeeded", user_id = user_id.0, "token pair issued");
    Ok(Json(pair))
}

/// Exchanges a refresh token for a new pair, provided the account is still active.
async fn refresh(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user_id = state
        .tokens
        .verify(&request.refresh, TokenKind::Refresh)
        .map_err(|error| ApiError::unauthorized(error.to_string()))?;

    if !state.auth.has_access(user_id).await? {
        return Err(ApiError::unauthorized(format!("user {} has no access", user_id.0)));
    }

    Ok(Json(state.tokens.issue_pair(user_id)?))
}
