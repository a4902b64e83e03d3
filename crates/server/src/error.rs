use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reservations_core::auth::AuthError;
use reservations_core::{ApplicationError, FieldError, InterfaceError};
use reservations_db::repositories::RepositoryError;
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

/// Handler error. Carries the client-safe interface error; the internal cause is
/// only written to the log.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'static str,
    fields: &'a [FieldError],
    correlation_id: &'a str,
}

impl ApiError {
    pub fn new(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::new(ApplicationError::Unauthenticated(reason.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[cfg(test)]
    pub fn interface(&self) -> &InterfaceError {
        &self.0
    }
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self::new(value)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        Self::new(value.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::new(ApplicationError::Configuration(value.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            InterfaceError::Internal { message, correlation_id } => {
                error!(
                    event_name = "http.request.failed",
                    correlation_id = %correlation_id,
                    error = %message,
                    "request failed"
                );
            }
            InterfaceError::BadRequest { message, correlation_id, .. }
            | InterfaceError::Unauthorized { message, correlation_id } => {
                warn!(
                    event_name = "http.request.rejected",
                    correlation_id = %correlation_id,
                    status = status.as_u16(),
                    reason = %message,
                    "request rejected"
                );
            }
        }

        let body = ErrorBody {
            error: self.0.user_message(),
            fields: self.0.fields(),
            correlation_id: self.0.correlation_id(),
        };
        (status, Json(body)).into_response()
    }
}
