//! SQLite backend (sqlx).
//!
//! Referential integrity lives in the schema: `ON DELETE CASCADE` foreign
//! keys plus `foreign_keys(true)` on every pooled connection, so deleting a
//! process removes its items and their quotes in one statement. The reorder
//! runs inside a single transaction (all renumbered or nothing).
//!
//! Ids are stored as TEXT (hyphenated uuid), `created_at` as RFC 3339 and
//! `quote_date` as `YYYY-MM-DD`, all of which sort correctly as strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use pricelab_core::{ItemId, ProcessId, QuoteId};
use pricelab_pricing::{Item, PricingStrategy, Process, Quote, QuoteType};

use crate::json::validate_reorder;
use crate::store::{HistoryEntry, PriceStore, StoreError};

const DATE_FMT: &str = "%Y-%m-%d";

/// SQLite-backed store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` (e.g. `sqlite://pricelab.db`), creating the file and
    /// the schema when missing.
    #[instrument(err)]
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS processes (
                id              TEXT PRIMARY KEY,
                process_number  TEXT NOT NULL,
                object          TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id                TEXT PRIMARY KEY,
                process_id        TEXT NOT NULL REFERENCES processes(id) ON DELETE CASCADE,
                item_number       INTEGER NOT NULL,
                specification     TEXT NOT NULL,
                unit              TEXT NOT NULL,
                quantity          REAL NOT NULL,
                pricing_strategy  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS quotes (
                id          TEXT PRIMARY KEY,
                item_id     TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                source      TEXT NOT NULL,
                quote_date  TEXT NOT NULL,
                unit_price  REAL NOT NULL,
                quote_type  TEXT NOT NULL,
                is_outlier  INTEGER NOT NULL DEFAULT 0
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_items_process ON items(process_id)",
            "CREATE INDEX IF NOT EXISTS idx_quotes_item ON quotes(item_id)",
        ];

        for stmt in statements {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn process_exists(&self, id: ProcessId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM processes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn item_exists(&self, id: ItemId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

impl PriceStore for SqliteStore {
    async fn create_process(&self, process: Process) -> Result<Process, StoreError> {
        sqlx::query(
            "INSERT INTO processes (id, process_number, object, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(process.id.to_string())
        .bind(&process.process_number)
        .bind(&process.object)
        .bind(process.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(process)
    }

    async fn list_processes(&self) -> Result<Vec<Process>, StoreError> {
        let rows = sqlx::query("SELECT * FROM processes ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(process_from_row).collect()
    }

    async fn get_process(&self, id: ProcessId) -> Result<Option<Process>, StoreError> {
        let row = sqlx::query("SELECT * FROM processes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(process_from_row).transpose()
    }

    async fn update_process(&self, process: Process) -> Result<Process, StoreError> {
        let res = sqlx::query("UPDATE processes SET process_number = ?, object = ? WHERE id = ?")
            .bind(&process.process_number)
            .bind(&process.object)
            .bind(process.id.to_string())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(process)
    }

    #[instrument(skip(self), fields(process_id = %id), err)]
    async fn delete_process(&self, id: ProcessId) -> Result<(), StoreError> {
        // Items and quotes go with it via ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM processes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_item(&self, item: Item) -> Result<Item, StoreError> {
        if !self.process_exists(item.process_id).await? {
            return Err(StoreError::NotFound);
        }
        insert_item(&self.pool, &item).await?;
        Ok(item)
    }

    async fn create_items(&self, items: Vec<Item>) -> Result<Vec<Item>, StoreError> {
        for item in &items {
            if !self.process_exists(item.process_id).await? {
                return Err(StoreError::NotFound);
            }
        }
        let mut tx = self.pool.begin().await?;
        for item in &items {
            insert_item(&mut *tx, item).await?;
        }
        tx.commit().await?;
        Ok(items)
    }

    async fn list_items(&self, process_id: ProcessId) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query("SELECT * FROM items WHERE process_id = ? ORDER BY item_number ASC")
            .bind(process_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query("SELECT * FROM items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn update_item(&self, item: Item) -> Result<Item, StoreError> {
        let res = sqlx::query(
            "UPDATE items SET item_number = ?, specification = ?, unit = ?, quantity = ?, \
             pricing_strategy = ? WHERE id = ?",
        )
        .bind(item.item_number)
        .bind(&item.specification)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.pricing_strategy.as_str())
        .bind(item.id.to_string())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(item)
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, ordered), fields(process_id = %process_id, count = ordered.len()), err)]
    async fn reorder_items(
        &self,
        process_id: ProcessId,
        ordered: Vec<ItemId>,
    ) -> Result<(), StoreError> {
        if !self.process_exists(process_id).await? {
            return Err(StoreError::NotFound);
        }

        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("SELECT id FROM items WHERE process_id = ?")
            .bind(process_id.to_string())
            .fetch_all(&mut *tx)
            .await?;
        let existing = rows
            .iter()
            .map(|row| parse_id::<ItemId>(row, "id"))
            .collect::<Result<Vec<_>, _>>()?;

        validate_reorder(existing.into_iter(), &ordered)?;

        for (pos, id) in ordered.iter().enumerate() {
            sqlx::query("UPDATE items SET item_number = ? WHERE id = ?")
                .bind((pos + 1) as u32)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_quote(&self, quote: Quote) -> Result<Quote, StoreError> {
        if !self.item_exists(quote.item_id).await? {
            return Err(StoreError::NotFound);
        }
        insert_quote(&self.pool, &quote).await?;
        Ok(quote)
    }

    async fn create_quotes(&self, quotes: Vec<Quote>) -> Result<Vec<Quote>, StoreError> {
        for quote in &quotes {
            if !self.item_exists(quote.item_id).await? {
                return Err(StoreError::NotFound);
            }
        }
        let mut tx = self.pool.begin().await?;
        for quote in &quotes {
            insert_quote(&mut *tx, quote).await?;
        }
        tx.commit().await?;
        Ok(quotes)
    }

    async fn list_quotes(&self, item_id: ItemId) -> Result<Vec<Quote>, StoreError> {
        let rows = sqlx::query("SELECT * FROM quotes WHERE item_id = ? ORDER BY quote_date DESC")
            .bind(item_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(quote_from_row).collect()
    }

    async fn get_quote(&self, id: QuoteId) -> Result<Option<Quote>, StoreError> {
        let row = sqlx::query("SELECT * FROM quotes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(quote_from_row).transpose()
    }

    async fn update_quote(&self, quote: Quote) -> Result<Quote, StoreError> {
        let res = sqlx::query(
            "UPDATE quotes SET source = ?, quote_date = ?, unit_price = ?, quote_type = ?, \
             is_outlier = ? WHERE id = ?",
        )
        .bind(&quote.source)
        .bind(quote.quote_date.format(DATE_FMT).to_string())
        .bind(quote.unit_price)
        .bind(quote.quote_type.as_str())
        .bind(quote.is_outlier)
        .bind(quote.id.to_string())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(quote)
    }

    async fn delete_quote(&self, id: QuoteId) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM quotes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                q.id, q.item_id, q.source, q.quote_date, q.unit_price, q.quote_type, q.is_outlier,
                i.item_number, i.specification, i.unit,
                p.id AS process_id, p.process_number, p.object
            FROM quotes q
            JOIN items i ON q.item_id = i.id
            JOIN processes p ON i.process_id = p.id
            ORDER BY q.quote_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(HistoryEntry {
                    quote: quote_from_row(row)?,
                    item_number: row.try_get::<i64, _>("item_number").map_err(StoreError::from)?
                        as u32,
                    specification: row.try_get("specification").map_err(StoreError::from)?,
                    unit: row.try_get("unit").map_err(StoreError::from)?,
                    process_id: parse_id(row, "process_id")?,
                    process_number: row.try_get("process_number").map_err(StoreError::from)?,
                    object: row.try_get("object").map_err(StoreError::from)?,
                })
            })
            .collect()
    }
}

async fn insert_item<'e, E>(executor: E, item: &Item) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO items (id, process_id, item_number, specification, unit, quantity, \
         pricing_strategy) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item.id.to_string())
    .bind(item.process_id.to_string())
    .bind(item.item_number)
    .bind(&item.specification)
    .bind(&item.unit)
    .bind(item.quantity)
    .bind(item.pricing_strategy.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

async fn insert_quote<'e, E>(executor: E, quote: &Quote) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO quotes (id, item_id, source, quote_date, unit_price, quote_type, is_outlier) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(quote.id.to_string())
    .bind(quote.item_id.to_string())
    .bind(&quote.source)
    .bind(quote.quote_date.format(DATE_FMT).to_string())
    .bind(quote.unit_price)
    .bind(quote.quote_type.as_str())
    .bind(quote.is_outlier)
    .execute(executor)
    .await?;
    Ok(())
}

// -- row decoding (TEXT columns back into domain types)

fn parse_id<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| StoreError::Database(format!("corrupt {column} column: {e}")))
}

fn process_from_row(row: &SqliteRow) -> Result<Process, StoreError> {
    let created_raw: String = row.try_get("created_at")?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|e| StoreError::Database(format!("corrupt created_at column: {e}")))?
        .with_timezone(&Utc);

    Ok(Process {
        id: parse_id(row, "id")?,
        process_number: row.try_get("process_number")?,
        object: row.try_get("object")?,
        created_at,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<Item, StoreError> {
    let strategy_raw: String = row.try_get("pricing_strategy")?;
    let pricing_strategy = PricingStrategy::parse(&strategy_raw)
        .map_err(|e| StoreError::Database(format!("corrupt pricing_strategy column: {e}")))?;

    Ok(Item {
        id: parse_id(row, "id")?,
        process_id: parse_id(row, "process_id")?,
        item_number: row.try_get::<i64, _>("item_number")? as u32,
        specification: row.try_get("specification")?,
        unit: row.try_get("unit")?,
        quantity: row.try_get("quantity")?,
        pricing_strategy,
    })
}

fn quote_from_row(row: &SqliteRow) -> Result<Quote, StoreError> {
    let date_raw: String = row.try_get("quote_date")?;
    let quote_date = NaiveDate::parse_from_str(&date_raw, DATE_FMT)
        .map_err(|e| StoreError::Database(format!("corrupt quote_date column: {e}")))?;

    let type_raw: String = row.try_get("quote_type")?;
    let quote_type = QuoteType::parse(&type_raw)
        .map_err(|e| StoreError::Database(format!("corrupt quote_type column: {e}")))?;

    Ok(Quote {
        id: parse_id(row, "id")?,
        item_id: parse_id(row, "item_id")?,
        source: row.try_get("source")?,
        quote_date,
        unit_price: row.try_get("unit_price")?,
        quote_type,
        is_outlier: row.try_get("is_outlier")?,
    })
}
