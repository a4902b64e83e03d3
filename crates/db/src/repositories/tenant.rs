use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::info;

use reservations_core::domain::tenant::{Tenant, TenantId};
use reservations_core::domain::user::UserId;

use super::user::row_to_user;
use super::{is_foreign_key_violation, RepositoryError, TenantRepository};
use crate::DbPool;

pub struct SqlTenantRepository {
    pool: DbPool,
}

impl SqlTenantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_tenant(row: &SqliteRow) -> Result<Tenant, RepositoryError> {
    Ok(Tenant {
        id: TenantId(row.try_get("id")?),
        title: row.try_get("title")?,
        email: row.try_get("email")?,
        users: Vec::new(),
    })
}

#[async_trait::async_trait]
impl TenantRepository for SqlTenantRepository {
    async fn list(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let rows = sqlx::query("SELECT id, title, email FROM tenant ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_tenant).collect()
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query("SELECT id, title, email FROM tenant WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut tenant = row_to_tenant(&row)?;

        let user_rows = sqlx::query(
            "SELECT u.id, u.first_name, u.last_name, u.username, u.email
             FROM reservation_user u
             JOIN tenant_has_reservation_user t ON t.reservation_user_id = u.id
             WHERE t.tenant_id = ?
             ORDER BY u.id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;
        tenant.users = user_rows.iter().map(row_to_user).collect::<Result<_, _>>()?;

        Ok(Some(tenant))
    }

    async fn create(&self, tenant: Tenant) -> Result<TenantId, RepositoryError> {
        let inserted = sqlx::query("INSERT INTO tenant (title, email) VALUES (?, ?)")
            .bind(&tenant.title)
            .bind(&tenant.email)
            .execute(&self.pool)
            .await?;

        Ok(TenantId(inserted.last_insert_rowid()))
    }

    async fn update(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        let updated = sqlx::query("UPDATE tenant SET title = ?, email = ? WHERE id = ?")
            .bind(&tenant.title)
            .bind(&tenant.email)
            .bind(tenant.id.0)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("tenant {}", tenant.id.0)));
        }
        Ok(())
    }

    async fn delete(&self, id: TenantId) -> Result<(), RepositoryError> {
        let deleted =
            sqlx::query("DELETE FROM tenant WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("tenant {}", id.0)));
        }
        Ok(())
    }

    async fn add_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tenant_has_reservation_user (tenant_id, reservation_user_id)
             VALUES (?, ?)
             ON CONFLICT (tenant_id, reservation_user_id) DO NOTHING",
        )
        .bind(tenant_id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                RepositoryError::NotFound(format!("tenant {} or user {}", tenant_id.0, user_id.0))
            } else {
                RepositoryError::Database(error)
            }
        })?;

        info!(
            event_name = "tenant.user.attached",
            tenant_id = tenant_id.0,
            user_id = user_id.0,
            "user attached to tenant"
        );
        Ok(())
    }

    async fn remove_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let deleted = sqlx::query(
            "DELETE FROM tenant_has_reservation_user
             WHERE tenant_id = ? AND reservation_user_id = ?",
        )
        .bind(tenant_id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "user {} of tenant {}",
                user_id.0, tenant_id.0
            )));
        }
        Ok(())
    }
}
