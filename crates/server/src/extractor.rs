use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::{Json, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use reservations_core::{ApplicationError, FieldError, TokenKind, UserId};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Caller authenticated by a valid access token in the `Authorization` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizedUser {
    pub user_id: UserId,
}

impl FromRequestParts<AppState> for AuthorizedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|rejection| ApiError::unauthorized(rejection.to_string()))?;

        let user_id = state
            .tokens
            .verify(bearer.token(), TokenKind::Access)
            .map_err(|error| ApiError::unauthorized(error.to_string()))?;

        Ok(Self { user_id })
    }
}

/// Path parameters that must parse as numbers. Anything else is treated as an
/// unknown route.
#[derive(Debug)]
pub struct NumericPath<T>(pub T);

impl<S, T> FromRequestParts<S> for NumericPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(
                    event_name = "http.path.rejected",
                    path = %parts.uri.path(),
                    reason = %rejection.body_text(),
                    "non-numeric path parameter"
                );
                Err(StatusCode::NOT_FOUND)
            }
        }
    }
}

/// `Json` whose rejections use the same error body as every other bad request.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await.map_err(|rejection| {
            ApiError::new(ApplicationError::validation(vec![FieldError::new(
                "body",
                rejection.body_text(),
            )]))
        })?;
        Ok(Self(value))
    }
}
