use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::info;

use reservations_core::domain::item::{
    DatePriceId, DatePricePlan, Item, ItemDatePrice, ItemId, PriceSnapshot,
};

use super::{ItemRepository, RepositoryError};
use crate::codec::{decode_optional_timestamp, decode_timestamp, encode_timestamp};
use crate::DbPool;

pub struct SqlItemRepository {
    pool: DbPool,
}

impl SqlItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Title plus the effective price at `as_of`, read on the caller's connection so it
/// can share a transaction with a dependent write.
///
/// Overlapping windows are not rejected on write; the latest-starting one wins here.
pub(crate) async fn resolve_price_in(
    conn: &mut SqliteConnection,
    id: ItemId,
    as_of: DateTime<Utc>,
) -> Result<PriceSnapshot, RepositoryError> {
    let as_of = encode_timestamp(as_of);
    let row = sqlx::query(
        "SELECT i.title,
                COALESCE(
                    (SELECT p.price FROM item_date_range_price p
                     WHERE p.item_id = i.id AND p.date_from <= ? AND p.date_to >= ?
                     ORDER BY p.date_from DESC, p.id DESC
                     LIMIT 1),
                    i.price
                ) AS price
         FROM item i
         WHERE i.id = ?",
    )
    .bind(&as_of)
    .bind(&as_of)
    .bind(id.0)
    .fetch_optional(&mut *conn)
    .await?;

    let row = row.ok_or_else(|| RepositoryError::NotFound(format!("item {}", id.0)))?;
    Ok(PriceSnapshot { title: row.try_get("title")?, price: row.try_get("price")? })
}

fn row_to_item(row: &SqliteRow) -> Result<Item, RepositoryError> {
    let show_from: Option<String> = row.try_get("show_from")?;
    let show_to: Option<String> = row.try_get("show_to")?;

    Ok(Item {
        id: ItemId(row.try_get("id")?),
        title: row.try_get("title")?,
        show_from: decode_optional_timestamp("show_from", show_from)?,
        show_to: decode_optional_timestamp("show_to", show_to)?,
        price: row.try_get("price")?,
        date_prices: Vec::new(),
    })
}

fn row_to_date_price(row: &SqliteRow) -> Result<ItemDatePrice, RepositoryError> {
    let date_from: String = row.try_get("date_from")?;
    let date_to: String = row.try_get("date_to")?;

    Ok(ItemDatePrice {
        id: Some(DatePriceId(row.try_get("id")?)),
        item_id: ItemId(row.try_get("item_id")?),
        date_from: decode_timestamp("date_from", &date_from)?,
        date_to: decode_timestamp("date_to", &date_to)?,
        price: row.try_get("price")?,
    })
}

async fn insert_date_price(
    conn: &mut SqliteConnection,
    item_id: ItemId,
    entry: &ItemDatePrice,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO item_date_range_price (item_id, date_from, date_to, price)
         VALUES (?, ?, ?, ?)",
    )
    .bind(item_id.0)
    .bind(encode_timestamp(entry.date_from))
    .bind(encode_timestamp(entry.date_to))
    .bind(entry.price)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl ItemRepository for SqlItemRepository {
    async fn list(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query("SELECT id, title, show_from, show_to, price FROM item ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query("SELECT id, title, show_from, show_to, price FROM item WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut item = row_to_item(&row)?;

        let price_rows = sqlx::query(
            "SELECT id, item_id, date_from, date_to, price
             FROM item_date_range_price
             WHERE item_id = ?
             ORDER BY date_from, id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;
        item.date_prices = price_rows.iter().map(row_to_date_price).collect::<Result<_, _>>()?;

        Ok(Some(item))
    }

    async fn create(&self, item: Item) -> Result<ItemId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO item (title, show_from, show_to, price) VALUES (?, ?, ?, ?)",
        )
        .bind(&item.title)
        .bind(item.show_from.map(encode_timestamp))
        .bind(item.show_to.map(encode_timestamp))
        .bind(item.price)
        .execute(&mut *tx)
        .await?;
        let item_id = ItemId(inserted.last_insert_rowid());

        for entry in &item.date_prices {
            insert_date_price(&mut tx, item_id, entry).await?;
        }

        tx.commit().await?;

        info!(
            event_name = "item.created",
            item_id = item_id.0,
            date_prices = item.date_prices.len(),
            "item created"
        );
        Ok(item_id)
    }

    async fn update(&self, item: Item) -> Result<(), RepositoryError> {
        let plan = DatePricePlan::from_desired(item.id, &item.date_prices);
        let mut tx = self.pool.begin().await?;

        // First statement is a write, so the transaction holds the database write
        // lock until commit and concurrent updates of this item serialize.
        let updated = sqlx::query(
            "UPDATE item SET title = ?, show_from = ?, show_to = ?, price = ? WHERE id = ?",
        )
        .bind(&item.title)
        .bind(item.show_from.map(encode_timestamp))
        .bind(item.show_to.map(encode_timestamp))
        .bind(item.price)
        .bind(item.id.0)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("item {}", item.id.0)));
        }

        let removed = if plan.removes_all() {
            sqlx::query("DELETE FROM item_date_range_price WHERE item_id = ?")
                .bind(item.id.0)
                .execute(&mut *tx)
                .await?
        } else {
            let mut builder =
                QueryBuilder::<Sqlite>::new("DELETE FROM item_date_range_price WHERE item_id = ");
            builder.push_bind(item.id.0);
            builder.push(" AND id NOT IN (");
            let mut keep = builder.separated(", ");
            for id in &plan.keep {
                keep.push_bind(id.0);
            }
            keep.push_unseparated(")");
            builder.build().execute(&mut *tx).await?
        };

        for entry in &plan.updates {
            let Some(entry_id) = entry.id else {
                continue;
            };
            let changed = sqlx::query(
                "UPDATE item_date_range_price
                 SET date_from = ?, date_to = ?, price = ?
                 WHERE id = ? AND item_id = ?",
            )
            .bind(encode_timestamp(entry.date_from))
            .bind(encode_timestamp(entry.date_to))
            .bind(entry.price)
            .bind(entry_id.0)
            .bind(item.id.0)
            .execute(&mut *tx)
            .await?;

            if changed.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!(
                    "date price {} of item {}",
                    entry_id.0, item.id.0
                )));
            }
        }

        for entry in &plan.inserts {
            insert_date_price(&mut tx, item.id, entry).await?;
        }

        tx.commit().await?;

        info!(
            event_name = "item.date_prices.reconciled",
            item_id = item.id.0,
            removed = removed.rows_affected(),
            updated = plan.updates.len(),
            inserted = plan.inserts.len(),
            "item date prices reconciled"
        );
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        let deleted =
            sqlx::query("DELETE FROM item WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("item {}", id.0)));
        }
        Ok(())
    }

    async fn resolve_price(
        &self,
        id: ItemId,
        as_of: DateTime<Utc>,
    ) -> Result<PriceSnapshot, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        resolve_price_in(&mut conn, id, as_of).await
    }
}
