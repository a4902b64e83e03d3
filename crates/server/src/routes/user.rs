use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use reservations_core::auth::hash_password;
use reservations_core::validation::{validate_user_create, validate_user_update};
use reservations_core::{ApplicationError, NewUser, User, UserId, UserPayload, UserUpdate};

use super::CreatedId;
use crate::error::ApiError;
use crate::extractor::{AuthorizedUser, JsonBody, NumericPath};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users).post(create_user).put(update_user))
        .route("/user/{id}", get(get_user).delete(delete_user))
}

async fn hash_off_runtime(password: String, cost: u32) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|error| ApplicationError::Persistence(format!("hashing task failed: {error}")))??;
    Ok(hashed)
}

async fn list_users(
    _user: AuthorizedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list().await?))
}

async fn get_user(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .find_by_id(UserId(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApplicationError::NotFound(format!("user {id}")).into())
}

async fn create_user(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<(StatusCode, Json<CreatedId>), ApiError> {
    let errors = validate_user_create(&payload);
    if !errors.is_empty() {
        return Err(ApplicationError::validation(errors).into());
    }

    let password_hash = hash_off_runtime(payload.password, state.bcrypt_cost).await?;
    let id = state
        .users
        .create(NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            username: payload.username.trim().to_string(),
            email: payload.email,
            password_hash,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedId { id: id.0 })))
}

/// Username and password are only changed when supplied.
async fn update_user(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<StatusCode, ApiError> {
    let errors = validate_user_update(&payload);
    if !errors.is_empty() {
        return Err(ApplicationError::validation(errors).into());
    }

    let password_hash = if payload.password.is_empty() {
        None
    } else {
        Some(hash_off_runtime(payload.password, state.bcrypt_cost).await?)
    };
    let username = Some(payload.username.trim().to_string()).filter(|name| !name.is_empty());

    state
        .users
        .update(UserUpdate {
            id: payload.id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            username,
            email: payload.email,
            password_hash,
        })
        .await?;
    Ok(StatusCode::OK)
}

async fn delete_user(
    _user: AuthorizedUser,
    State(state): State<AppState>,
    NumericPath(id): NumericPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(UserId(id)).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use reservations_core::auth::verify_password;
    use reservations_core::{UserId, UserPayload};

    use super::{create_user, update_user};
    use crate::extractor::{AuthorizedUser, JsonBody};
    use crate::state::test_support::state;

    const ADMIN: AuthorizedUser = AuthorizedUser { user_id: UserId(1) };

    fn payload(password: &str, confirm: &str) -> UserPayload {
        UserPayload {
            first_name: "Miha".to_string(),
            last_name: "Kos".to_string(),
            username: "miha".to_string(),
            email: "miha@example.com".to_string(),
            password: password.to_string(),
            confirm: confirm.to_string(),
            ..UserPayload::default()
        }
    }

    async fn stored_hash(pool: &sqlx::SqlitePool, id: i64) -> String {
        sqlx::query_scalar("SELECT pass FROM reservation_user WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .expect("stored hash")
    }

    #[tokio::test]
    async fn create_stores_bcrypt_hash_not_plain_password() {
        let (pool, state) = state().await;

        let (status, created) =
            create_user(ADMIN, State(state), JsonBody(payload("s3cret-pass", "s3cret-pass")))
                .await
                .expect("create");

        assert_eq!(status, StatusCode::CREATED);
        let hash = stored_hash(&pool, created.0.id).await;
        assert_ne!(hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &hash).expect("verify"));
    }

    #[tokio::test]
    async fn create_rejects_mismatched_confirmation() {
        let (_pool, state) = state().await;

        let error = create_user(ADMIN, State(state), JsonBody(payload("s3cret-pass", "other")))
            .await
            .expect_err("confirmation must match");

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert!(error.interface().fields().iter().any(|field| field.field == "confirm"));
    }

    #[tokio::test]
    async fn update_without_password_keeps_existing_hash() {
        let (pool, state) = state().await;
        let (_, created) = create_user(
            ADMIN,
            State(state.clone()),
            JsonBody(payload("s3cret-pass", "s3cret-pass")),
        )
        .await
        .expect("create");
        let before = stored_hash(&pool, created.0.id).await;

        update_user(
            ADMIN,
            State(state),
            JsonBody(UserPayload {
                id: UserId(created.0.id),
                last_name: "Kos Novak".to_string(),
                ..payload("", "")
            }),
        )
        .await
        .expect("update");

        assert_eq!(stored_hash(&pool, created.0.id).await, before);
    }

    #[tokio::test]
    async fn duplicate_username_is_bad_request() {
        let (_pool, state) = state().await;
        create_user(
            ADMIN,
            State(state.clone()),
            JsonBody(payload("s3cret-pass", "s3cret-pass")),
        )
        .await
        .expect("first create");

        let error = create_user(
            ADMIN,
            State(state),
            JsonBody(payload("s3cret-pass", "s3cret-pass")),
        )
        .await
        .expect_err("duplicate");

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
