use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use reservations_core::validation::{validate_item_create, validate_item_update};
use reservations_core::{ApplicationError, Item, ItemId, PriceSnapshot};
use serde::Deserialize;
use tracing::info;

use super::CreatedId;
use crate::error::ApiError;
use crate::extractor::{AuthorizedUser, JsonBody, NumericPath};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PriceQuery {
    pub at: Option<DateTime<Utc>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/item", get(list_items).post(create_item).put(update_item))
        .route("/item/{id}", get(get_item).delete(delete_item))
        .route("/item/{id}/price", get(item_price))
}

async fn list_items(
    _user: AuthorizedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.items.list().await?))
}

async fn get_item(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<Json<Item>, ApiError> {
    state
        .items
        .find_by_id(ItemId(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApplicationError::NotFound(format!("item {id}")).into())
}

async fn item_price(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceSnapshot>, ApiError> {
    let at = query.at.unwrap_or_else(Utc::now);
    Ok(Json(state.items.resolve_price(ItemId(id), at).await?))
}

async fn create_item(
    user: AuthorizedUser,
    State(state): State<AppState>,
    JsonBody(item): JsonBody<Item>,
) -> Result<(StatusCode, Json<CreatedId>), ApiError> {
    let errors = validate_item_create(&item);
    if !errors.is_empty() {
        return Err(ApplicationError::validation(errors).into());
    }

    let id = state.items.create(item).await?;
    info!(event_name = "item.created", item_id = id.0, user_id = user.user_id.0, "item created");
    Ok((StatusCode::CREATED, Json(CreatedId { id: id.0 })))
}

/// Replaces the item and reconciles its date prices to exactly the submitted list.
async fn update_item(
    user: AuthorizedUser,
    State(state): State<AppState>,
    JsonBody(item): JsonBody<Item>,
) -> Result<StatusCode, ApiError> {
    let errors = validate_item_update(&item);
    if !errors.is_empty() {
        return Err(ApplicationError::validation(errors).into());
    }

    let id = item.id;
    state.items.update(item).await?;
    info!(event_name = "item.updated", item_id = id.0, user_id = user.user_id.0, "item updated");
    Ok(StatusCode::OK)
}

async fn delete_item(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.items.delete(ItemId(id)).await?;
    Ok(StatusCode::OK)
}
