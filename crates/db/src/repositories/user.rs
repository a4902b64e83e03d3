use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use reservations_core::domain::user::{NewUser, User, UserId, UserUpdate};

use super::{is_unique_violation, RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn row_to_user(row: &SqliteRow) -> Result<User, RepositoryError> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
    })
}

fn username_conflict(username: &str) -> impl Fn(sqlx::Error) -> RepositoryError + '_ {
    move |error| {
        if is_unique_violation(&error) {
            RepositoryError::Conflict(format!("username `{username}` is already taken"))
        } else {
            RepositoryError::Database(error)
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, first_name, last_name, username, email FROM reservation_user ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, username, email FROM reservation_user WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<UserId, RepositoryError> {
        let inserted = sqlx::query(
            "INSERT INTO reservation_user (first_name, last_name, username, email, pass)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(username_conflict(&user.username))?;

        Ok(UserId(inserted.last_insert_rowid()))
    }

    async fn update(&self, user: UserUpdate) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE reservation_user
             SET first_name = ?, last_name = ?, email = ?,
                 username = COALESCE(?, username),
                 pass = COALESCE(?, pass)
             WHERE id = ?",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.id.0)
        .execute(&self.pool)
        .await
        .map_err(username_conflict(user.username.as_deref().unwrap_or_default()))?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", user.id.0)));
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM reservation_user WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", id.0)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use reservations_core::domain::user::{NewUser, UserId, UserUpdate};

    use super::SqlUserRepository;
    use crate::repositories::{RepositoryError, UserRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            first_name: "Nina".to_string(),
            last_name: "Horvat".to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$2b$04$placeholderhashplaceholderhashplaceholderha".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let pool = setup().await;
        let repo = SqlUserRepository::new(pool);
        repo.create(new_user("nina")).await.expect("create");

        let result = repo.create(new_user("nina")).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_without_password_keeps_stored_hash() {
        let pool = setup().await;
        let repo = SqlUserRepository::new(pool.clone());
        let id = repo.create(new_user("nina")).await.expect("create");

        repo.update(UserUpdate {
            id,
            first_name: "Nina".to_string(),
            last_name: "Horvat Novak".to_string(),
            username: None,
            email: "nina@example.org".to_string(),
            password_hash: None,
        })
        .await
        .expect("update");

        let user = repo.find_by_id(id).await.expect("find").expect("user exists");
        assert_eq!(user.last_name, "Horvat Novak");
        assert_eq!(user.username, "nina");
        let hash: String = sqlx::query_scalar("SELECT pass FROM reservation_user WHERE id = ?")
            .bind(id.0)
            .fetch_one(&pool)
            .await
            .expect("hash");
        assert_eq!(hash, new_user("nina").password_hash);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_user_are_not_found() {
        let pool = setup().await;
        let repo = SqlUserRepository::new(pool);

        let update = repo
            .update(UserUpdate {
                id: UserId(9),
                first_name: "Nina".to_string(),
                last_name: "Horvat".to_string(),
                username: None,
                email: "nina@example.com".to_string(),
                password_hash: None,
            })
            .await;

        assert!(matches!(update, Err(RepositoryError::NotFound(_))));
        assert!(matches!(repo.delete(UserId(9)).await, Err(RepositoryError::NotFound(_))));
    }
}
