use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::info;

use reservations_core::domain::inquiry::{Inquiry, InquiryId, LiveItem, NewInquiry};
use reservations_core::domain::item::ItemId;

use super::item::resolve_price_in;
use super::{InquiryRepository, RepositoryError};
use crate::codec::{decode_timestamp, encode_timestamp};
use crate::DbPool;

pub struct SqlInquiryRepository {
    pool: DbPool,
}

impl SqlInquiryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_inquiry(row: &SqliteRow) -> Result<Inquiry, RepositoryError> {
    let date_reservation: String = row.try_get("date_reservation")?;
    let date_created: String = row.try_get("date_created")?;
    let live_item_id: Option<i64> = row.try_get("live_item_id")?;

    let item = match live_item_id {
        Some(id) => Some(LiveItem {
            id: ItemId(id),
            title: row.try_get("live_item_title")?,
            price: row.try_get("live_item_price")?,
        }),
        None => None,
    };

    Ok(Inquiry {
        id: InquiryId(row.try_get("id")?),
        inquirer: row.try_get("inquirer")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        item,
        item_title: row.try_get("item_title")?,
        item_price: row.try_get("item_price")?,
        date_reservation: decode_timestamp("date_reservation", &date_reservation)?,
        date_created: decode_timestamp("date_created", &date_created)?,
        comment: row.try_get("comment")?,
    })
}

#[async_trait::async_trait]
impl InquiryRepository for SqlInquiryRepository {
    async fn create(&self, inquiry: NewInquiry) -> Result<InquiryId, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let snapshot = resolve_price_in(&mut tx, inquiry.item_id, now).await?;

        let inserted = sqlx::query(
            "INSERT INTO inquiry (inquirer, email, phone, item_id, item_title, item_price,
                                  date_reservation, date_created, comment)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&inquiry.inquirer)
        .bind(&inquiry.email)
        .bind(&inquiry.phone)
        .bind(inquiry.item_id.0)
        .bind(&snapshot.title)
        .bind(snapshot.price)
        .bind(encode_timestamp(inquiry.date_reservation))
        .bind(encode_timestamp(now))
        .bind(&inquiry.comment)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let id = InquiryId(inserted.last_insert_rowid());
        info!(
            event_name = "inquiry.created",
            inquiry_id = id.0,
            item_id = inquiry.item_id.0,
            item_price = snapshot.price,
            "inquiry created with frozen item snapshot"
        );
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<Inquiry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT q.id, q.inquirer, q.email, q.phone, q.item_title, q.item_price,
                    q.date_reservation, q.date_created, q.comment,
                    i.id AS live_item_id, i.title AS live_item_title, i.price AS live_item_price
             FROM inquiry q
             LEFT JOIN item i ON i.id = q.item_id
             ORDER BY q.id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_inquiry).collect()
    }

    async fn delete(&self, id: InquiryId) -> Result<(), RepositoryError> {
        let deleted =
            sqlx::query("DELETE FROM inquiry WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("inquiry {}", id.0)));
        }

        info!(event_name = "inquiry.deleted", inquiry_id = id.0, "inquiry deleted");
        Ok(())
    }
}
