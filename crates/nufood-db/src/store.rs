//! Postgres implementation of [`MenuStore`].
//!
//! Batches are written with a single `INSERT … SELECT * FROM UNNEST(…)` per
//! call. Every write that touches more than one row set runs inside one
//! transaction, so readers never see a half-written window, day or schedule.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use nufood_core::{
    AdvanceReport, LocationOperatingTimes, MenuItem, MenuStore, StoreError, UniqueItemName, WeeklyEntry,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::columns::{HoursColumns, ItemColumns};

const INSERT_MENU_ITEMS: &str = "INSERT INTO menu_items \
         (name, description, served_on, location, station, meal, portion, \
          calories, protein_g, carbs_g, fat_g) \
     SELECT * FROM UNNEST(\
          $1::text[], $2::text[], $3::date[], $4::text[], $5::text[], $6::text[], $7::text[], \
          $8::float8[], $9::float8[], $10::float8[], $11::float8[])";

const INSERT_WEEKLY_ENTRIES: &str = "INSERT INTO weekly_menu_items \
         (day_offset, name, description, served_on, location, station, meal, portion, \
          calories, protein_g, carbs_g, fat_g) \
     SELECT * FROM UNNEST(\
          $1::int4[], $2::text[], $3::text[], $4::date[], $5::text[], $6::text[], $7::text[], \
          $8::text[], $9::float8[], $10::float8[], $11::float8[], $12::float8[])";

#[derive(Debug, Clone)]
pub struct PgMenuStore {
    pool: PgPool,
}

impl PgMenuStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, operation: &'static str) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| StoreError::write(operation, e))
    }
}

async fn insert_weekly_columns(
    tx: &mut Transaction<'static, Postgres>,
    offsets: &[i32],
    columns: &ItemColumns,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(INSERT_WEEKLY_ENTRIES)
        .bind(offsets)
        .bind(&columns.names)
        .bind(&columns.descriptions)
        .bind(&columns.served_on)
        .bind(&columns.locations)
        .bind(&columns.stations)
        .bind(&columns.meals)
        .bind(&columns.portions)
        .bind(&columns.calories)
        .bind(&columns.protein_g)
        .bind(&columns.carbs_g)
        .bind(&columns.fat_g)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl MenuStore for PgMenuStore {
    async fn known_unique_names(&self) -> Result<HashSet<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM unique_item_names")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::read("known_unique_names", e))?;
        Ok(names.into_iter().collect())
    }

    async fn insert_unique_names(&self, names: &[UniqueItemName]) -> Result<u64, StoreError> {
        if names.is_empty() {
            return Ok(0);
        }
        let names: Vec<&str> = names.iter().map(|n| n.name.as_str()).collect();
        let result = sqlx::query(
            "INSERT INTO unique_item_names (name) \
             SELECT * FROM UNNEST($1::text[]) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(&names)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::write("insert_unique_names", e))?;
        Ok(result.rows_affected())
    }

    async fn replace_menu_items(&self, date: NaiveDate, items: &[MenuItem]) -> Result<u64, StoreError> {
        const OP: &str = "replace_menu_items";
        let columns: ItemColumns = items.iter().collect();

        let mut tx = self.begin(OP).await?;
        let cleared = sqlx::query("DELETE FROM menu_items")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::write(OP, e))?
            .rows_affected();
        let written = if columns.is_empty() {
            0
        } else {
            sqlx::query(INSERT_MENU_ITEMS)
                .bind(&columns.names)
                .bind(&columns.descriptions)
                .bind(&columns.served_on)
                .bind(&columns.locations)
                .bind(&columns.stations)
                .bind(&columns.meals)
                .bind(&columns.portions)
                .bind(&columns.calories)
                .bind(&columns.protein_g)
                .bind(&columns.carbs_g)
                .bind(&columns.fat_g)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::write(OP, e))?
                .rows_affected()
        };
        tx.commit().await.map_err(|e| StoreError::write(OP, e))?;

        tracing::debug!(%date, cleared, rows = written, "daily menu items replaced");
        Ok(written)
    }

    async fn replace_weekly_window(&self, entries: &[WeeklyEntry]) -> Result<u64, StoreError> {
        const OP: &str = "replace_weekly_window";
        let offsets: Vec<i32> = entries.iter().map(|e| e.offset).collect();
        let columns: ItemColumns = entries.iter().map(|e| &e.item).collect();

        let mut tx = self.begin(OP).await?;
        sqlx::query("DELETE FROM weekly_menu_items")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::write(OP, e))?;
        let written = if columns.is_empty() {
            0
        } else {
            insert_weekly_columns(&mut tx, &offsets, &columns)
                .await
                .map_err(|e| StoreError::write(OP, e))?
        };
        tx.commit().await.map_err(|e| StoreError::write(OP, e))?;
        Ok(written)
    }

    async fn advance_weekly_window(&self, half_width: i32, new_day: &[MenuItem]) -> Result<AdvanceReport, StoreError> {
        const OP: &str = "advance_weekly_window";
        let columns: ItemColumns = new_day.iter().collect();

        let mut tx = self.begin(OP).await?;
        let evicted = sqlx::query("DELETE FROM weekly_menu_items WHERE day_offset = $1")
            .bind(-half_width)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::write(OP, e))?
            .rows_affected();
        let shifted = sqlx::query("UPDATE weekly_menu_items SET day_offset = day_offset - 1")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::write(OP, e))?
            .rows_affected();
        let inserted = if columns.is_empty() {
            0
        } else {
            let offsets = vec![half_width; columns.len()];
            insert_weekly_columns(&mut tx, &offsets, &columns)
                .await
                .map_err(|e| StoreError::write(OP, e))?
        };
        tx.commit().await.map_err(|e| StoreError::write(OP, e))?;

        Ok(AdvanceReport {
            evicted,
            shifted,
            inserted,
        })
    }

    async fn replace_operating_hours(&self, hours: &[LocationOperatingTimes]) -> Result<u64, StoreError> {
        const OP: &str = "replace_operating_hours";
        let columns = HoursColumns::from_weeks(hours).map_err(|e| StoreError::write(OP, e))?;

        let mut tx = self.begin(OP).await?;
        sqlx::query("DELETE FROM operating_hours")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::write(OP, e))?;
        if !columns.is_empty() {
            sqlx::query(
                "INSERT INTO operating_hours (location, day_index, served_on, status, hours) \
                 SELECT * FROM UNNEST($1::text[], $2::int2[], $3::date[], $4::text[], $5::jsonb[])",
            )
            .bind(&columns.locations)
            .bind(&columns.day_indexes)
            .bind(&columns.served_on)
            .bind(&columns.statuses)
            .bind(&columns.hours)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::write(OP, e))?;
        }
        tx.commit().await.map_err(|e| StoreError::write(OP, e))?;

        tracing::debug!(locations = hours.len(), rows = columns.locations.len(), "operating hours replaced");
        Ok(u64::try_from(hours.len()).unwrap_or(u64::MAX))
    }
}
