use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use reservations_core::validation::{validate_tenant_create, validate_tenant_update};
use reservations_core::{ApplicationError, Tenant, TenantId, UserId};

use super::CreatedId;
use crate::error::ApiError;
use crate::extractor::{AuthorizedUser, JsonBody, NumericPath};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tenant", get(list_tenants).post(create_tenant).put(update_tenant))
        .route("/tenant/{id}", get(get_tenant).delete(delete_tenant))
        .route("/tenant/{id}/user/{user_id}", put(attach_user).delete(detach_user))
}

async fn list_tenants(
    _user: AuthorizedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    Ok(Json(state.tenants.list().await?))
}

async fn get_tenant(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<Json<Tenant>, ApiError> {
    state
        .tenants
        .find_by_id(TenantId(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApplicationError::NotFound(format!("tenant {id}")).into())
}

async fn create_tenant(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    JsonBody(tenant): JsonBody<Tenant>,
) -> Result<(StatusCode, Json<CreatedId>), ApiError> {
    let errors = validate_tenant_create(&tenant);
    if !errors.is_empty() {
        return Err(ApplicationError::validation(errors).into());
    }

    let id = state.tenants.create(tenant).await?;
    Ok((StatusCode::CREATED, Json(CreatedId { id: id.0 })))
}

async fn update_tenant(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    JsonBody(tenant): JsonBody<Tenant>,
) -> Result<StatusCode, ApiError> {
    let errors = validate_tenant_update(&tenant);
    if !errors.is_empty() {
        return Err(ApplicationError::validation(errors).into());
    }

    state.tenants.update(tenant).await?;
    Ok(StatusCode::OK)
}

async fn delete_tenant(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.tenants.delete(TenantId(id)).await?;
    Ok(StatusCode::OK)
}

async fn attach_user(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath((tenant_id, user_id)): NumericPath<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.tenants.add_user(TenantId(tenant_id), UserId(user_id)).await?;
    Ok(StatusCode::OK)
}

async fn detach_user(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath((tenant_id, user_id)): NumericPath<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.tenants.remove_user(TenantId(tenant_id), UserId(user_id)).await?;
    Ok(StatusCode::OK)
}
