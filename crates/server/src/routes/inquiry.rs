use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use reservations_core::{ApplicationError, Inquiry, InquiryCreate, InquiryId, NewInquiry};

use super::CreatedId;
use crate::error::ApiError;
use crate::extractor::{JsonBody, NumericPath};
use crate::state::AppState;

/// Public endpoints: anyone may leave an inquiry.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inquiry", get(list_inquiries).post(create_inquiry))
        .route("/inquiry/{id}", delete(delete_inquiry))
}

async fn create_inquiry(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<InquiryCreate>,
) -> Result<(StatusCode, Json<CreatedId>), ApiError> {
    let inquiry = NewInquiry::try_from(payload).map_err(ApplicationError::validation)?;
    let id = state.inquiries.create(inquiry).await?;
    Ok((StatusCode::CREATED, Json(CreatedId { id: id.0 })))
}

async fn list_inquiries(State(state): State<AppState>) -> Result<Json<Vec<Inquiry>>, ApiError> {
    Ok(Json(state.inquiries.list().await?))
}

async fn delete_inquiry(
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.inquiries.delete(InquiryId(id)).await?;
    Ok(StatusCode::OK)
}
