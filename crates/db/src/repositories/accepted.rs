use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::info;

use reservations_core::domain::accepted::{Accepted, AcceptedId, NewAccepted};
use reservations_core::domain::item::ItemId;

use super::{AcceptedRepository, RepositoryError};
use crate::codec::{decode_optional_timestamp, decode_timestamp, encode_timestamp};
use crate::DbPool;

pub struct SqlAcceptedRepository {
    pool: DbPool,
}

impl SqlAcceptedRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_accepted(row: &SqliteRow) -> Result<Accepted, RepositoryError> {
    let date_reservation: String = row.try_get("date_reservation")?;
    let date_inquiry_created: Option<String> = row.try_get("date_inquiry_created")?;
    let date_accepted: String = row.try_get("date_accepted")?;
    let item_id: Option<i64> = row.try_get("item_id")?;

    Ok(Accepted {
        id: AcceptedId(row.try_get("id")?),
        inquirer: row.try_get("inquirer")?,
        inquirer_email: row.try_get("inquirer_email")?,
        inquirer_phone: row.try_get("inquirer_phone")?,
        inquirer_comment: row.try_get("inquirer_comment")?,
        item_id: item_id.map(ItemId),
        item_title: row.try_get("item_title")?,
        item_price: row.try_get("item_price")?,
        notes: row.try_get("notes")?,
        date_reservation: decode_timestamp("date_reservation", &date_reservation)?,
        date_inquiry_created: decode_optional_timestamp(
            "date_inquiry_created",
            date_inquiry_created,
        )?,
        date_accepted: decode_timestamp("date_accepted", &date_accepted)?,
    })
}

#[async_trait::async_trait]
impl AcceptedRepository for SqlAcceptedRepository {
    async fn list(&self) -> Result<Vec<Accepted>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, inquirer, inquirer_email, inquirer_phone, inquirer_comment,
                    item_id, item_title, item_price, notes,
                    date_reservation, date_inquiry_created, date_accepted
             FROM accepted
             ORDER BY date_accepted DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_accepted).collect()
    }

    async fn process(&self, accepted: NewAccepted) -> Result<AcceptedId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(item_id) = accepted.item_id {
            let known: Option<i64> = sqlx::query_scalar("SELECT id FROM item WHERE id = ?")
                .bind(item_id.0)
                .fetch_optional(&mut *tx)
                .await?;
            if known.is_none() {
                return Err(RepositoryError::NotFound(format!("item {}", item_id.0)));
            }
        }

        let inserted = sqlx::query(
            "INSERT INTO accepted (inquirer, inquirer_email, inquirer_phone, inquirer_comment,
                                   item_id, item_title, item_price, notes,
                                   date_reservation, date_inquiry_created, date_accepted)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&accepted.inquirer)
        .bind(&accepted.inquirer_email)
        .bind(&accepted.inquirer_phone)
        .bind(&accepted.inquirer_comment)
        .bind(accepted.item_id.map(|id| id.0))
        .bind(&accepted.item_title)
        .bind(accepted.item_price)
        .bind(&accepted.notes)
        .bind(encode_timestamp(accepted.date_reservation))
        .bind(accepted.date_inquiry_created.map(encode_timestamp))
        .bind(encode_timestamp(Utc::now()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let id = AcceptedId(inserted.last_insert_rowid());
        info!(
            event_name = "accepted.processed",
            accepted_id = id.0,
            item_id = accepted.item_id.map(|item_id| item_id.0),
            "inquiry accepted"
        );
        Ok(id)
    }

    async fn delete(&self, id: AcceptedId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted =
            sqlx::query("DELETE FROM accepted WHERE id = ?").bind(id.0).execute(&mut *tx).await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("accepted {}", id.0)));
        }

        tx.commit().await?;
        Ok(())
    }
}
