use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use reservations_db::{migrations, DbPool};
use serde::Serialize;

/// Readiness report: the store answers and its schema is at the version this build embeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub status: &'static str,
    pub schema_version: Option<i64>,
    pub expected_schema_version: i64,
    pub detail: String,
    pub checked_at: DateTime<Utc>,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(readiness)).with_state(db_pool)
}

pub async fn readiness(State(pool): State<DbPool>) -> (StatusCode, Json<Readiness>) {
    let expected = migrations::expected_version();
    let (schema_version, detail) = match migrations::applied_version(&pool).await {
        Ok(Some(version)) if version >= expected => (Some(version), "schema current".to_string()),
        Ok(Some(version)) => (Some(version), format!("schema behind: {version} < {expected}")),
        Ok(None) => (None, "no migrations applied".to_string()),
        Err(error) => (None, format!("database unreachable: {error}")),
    };
    let ready = schema_version.is_some_and(|version| version >= expected);

    if !ready {
        tracing::warn!(event_name = "system.health.degraded", detail = %detail, "not ready");
    }

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status_code,
        Json(Readiness {
            status: if ready { "ready" } else { "degraded" },
            schema_version,
            expected_schema_version: expected,
            detail,
            checked_at: Utc::now(),
        }),
    )
}
