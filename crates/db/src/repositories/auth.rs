use sqlx::Row;
use tracing::warn;

use reservations_core::auth::verify_password;
use reservations_core::domain::user::{UserCredentials, UserId};

use super::{AuthRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAuthRepository {
    pool: DbPool,
}

impl SqlAuthRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn credentials(&self, username: &str) -> Result<Option<UserCredentials>, RepositoryError> {
        let row = sqlx::query("SELECT id, pass, active FROM reservation_user WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<UserCredentials, RepositoryError> {
            Ok(UserCredentials {
                id: UserId(row.try_get("id")?),
                password_hash: row.try_get("pass")?,
                active: row.try_get("active")?,
            })
        })
        .transpose()
    }
}

#[async_trait::async_trait]
impl AuthRepository for SqlAuthRepository {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserId, RepositoryError> {
        let Some(credentials) = self.credentials(username).await? else {
            return Err(RepositoryError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = credentials.password_hash;
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|error| RepositoryError::PasswordCheck(error.to_string()))?
            .map_err(|error| RepositoryError::PasswordCheck(error.to_string()))?;

        if !matches {
            return Err(RepositoryError::InvalidCredentials);
        }
        if !credentials.active {
            warn!(
                event_name = "auth.login.inactive",
                user_id = credentials.id.0,
                "login attempt for inactive user"
            );
            return Err(RepositoryError::InvalidCredentials);
        }
        Ok(credentials.id)
    }

    async fn has_access(&self, id: UserId) -> Result<bool, RepositoryError> {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT active FROM reservation_user WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        Ok(active.unwrap_or(false))
    }
}
