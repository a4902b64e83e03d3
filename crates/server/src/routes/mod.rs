use axum::Router;
use serde::Serialize;

use crate::state::AppState;

pub mod accepted;
pub mod auth;
pub mod inquiry;
pub mod item;
pub mod tenant;
pub mod user;

/// Body of every `201 Created` response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CreatedId {
    pub id: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(inquiry::router())
        .merge(accepted::router())
        .merge(item::router())
        .merge(tenant::router())
        .merge(user::router())
        .merge(auth::router())
        .with_state(state)
}
