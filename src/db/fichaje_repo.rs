// src/db/fichaje_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::common::error::AppError;
use crate::models::fichaje::FichajeEntry;

const ENTRY_COLUMNS: &str = "id, restaurant_id, member_id, clock_in_at, clock_out_at, auto_closed";

#[derive(Clone)]
pub struct FichajeRepository {
    pool: PgPool,
}

impl FichajeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_open(&self, restaurant_id: i32, member_id: i32) -> Result<Option<FichajeEntry>, AppError> {
        let entry = sqlx::query_as::<_, FichajeEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM fichaje_entries
            WHERE restaurant_id = $1 AND member_id = $2 AND clock_out_at IS NULL
            "#
        ))
        .bind(restaurant_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// O índice único parcial garante uma entrada aberta por membro; quem
    /// chama traduz a violação.
    pub async fn clock_in(&self, restaurant_id: i32, member_id: i32) -> Result<FichajeEntry, sqlx::Error> {
        sqlx::query_as::<_, FichajeEntry>(&format!(
            r#"
            INSERT INTO fichaje_entries (restaurant_id, member_id)
            VALUES ($1, $2)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(member_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn clock_out(&self, restaurant_id: i32, member_id: i32) -> Result<Option<FichajeEntry>, AppError> {
        let entry = sqlx::query_as::<_, FichajeEntry>(&format!(
            r#"
            UPDATE fichaje_entries SET clock_out_at = NOW()
            WHERE restaurant_id = $1 AND member_id = $2 AND clock_out_at IS NULL
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn list_by_date(&self, restaurant_id: i32, date: NaiveDate) -> Result<Vec<FichajeEntry>, AppError> {
        let entries = sqlx::query_as::<_, FichajeEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM fichaje_entries
            WHERE restaurant_id = $1 AND clock_in_at::date = $2
            ORDER BY clock_in_at
            "#
        ))
        .bind(restaurant_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Fecha no último segundo do próprio dia as entradas abertas de dias
    /// anteriores. Vale para todos os restaurantes.
    pub async fn close_stale_entries(&self) -> Result<Vec<FichajeEntry>, AppError> {
        let entries = sqlx::query_as::<_, FichajeEntry>(&format!(
            r#"
            UPDATE fichaje_entries
            SET clock_out_at = date_trunc('day', clock_in_at) + interval '1 day' - interval '1 second',
                auto_closed = TRUE
            WHERE clock_out_at IS NULL AND clock_in_at < date_trunc('day', NOW())
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
