use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use reservations_core::{Accepted, AcceptedCreate, AcceptedId, ApplicationError, NewAccepted};
use tracing::info;

use super::CreatedId;
use crate::error::ApiError;
use crate::extractor::{AuthorizedUser, JsonBody, NumericPath};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accepted", get(list_accepted))
        .route("/accepted/process", post(process_inquiry))
        .route("/accepted/{id}", delete(delete_accepted))
}

async fn list_accepted(
    _user: AuthorizedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Accepted>>, ApiError> {
    Ok(Json(state.accepted.list().await?))
}

/// Stores the caller-resolved acceptance. Removing the source inquiry is a separate
/// call.
async fn process_inquiry(
    user: AuthorizedUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AcceptedCreate>,
) -> Result<Json<CreatedId>, ApiError> {
    let accepted = NewAccepted::try_from(payload).map_err(ApplicationError::validation)?;
    let id = state.accepted.process(accepted).await?;
    info!(
        event_name = "accepted.processed.by_user",
        accepted_id = id.0,
        user_id = user.user_id.0,
        "inquiry processed"
    );
    Ok(Json(CreatedId { id: id.0 }))
}

async fn delete_accepted(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.accepted.delete(AcceptedId(id)).await?;
    Ok(StatusCode::OK)
}
