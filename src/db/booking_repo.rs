// src/db/booking_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::booking::{Booking, BookingRecord};

const BOOKING_COLUMNS: &str = "id, restaurant_id, reservation_date, reservation_time, party_size, \
     customer_name, contact_phone, contact_phone_country_code, contact_email, table_number, \
     commentary, baby_strollers, high_chairs, arroz_type, arroz_servings, special_menu, \
     menu_de_grupo_id, principales_json, created_at, updated_at";

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, restaurant_id: i32, record: &BookingRecord) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (
                restaurant_id, reservation_date, reservation_time, party_size,
                customer_name, contact_phone, contact_phone_country_code, contact_email,
                table_number, commentary, baby_strollers, high_chairs,
                arroz_type, arroz_servings, special_menu, menu_de_grupo_id, principales_json
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(record.reservation_date)
        .bind(record.reservation_time)
        .bind(record.party_size)
        .bind(&record.customer_name)
        .bind(&record.contact_phone)
        .bind(&record.contact_phone_country_code)
        .bind(&record.contact_email)
        .bind(&record.table_number)
        .bind(&record.commentary)
        .bind(record.baby_strollers)
        .bind(record.high_chairs)
        .bind(&record.arroz_type)
        .bind(&record.arroz_servings)
        .bind(record.special_menu)
        .bind(record.menu_de_grupo_id)
        .bind(&record.principales_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    pub async fn find(&self, restaurant_id: i32, booking_id: i32) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE restaurant_id = $1 AND id = $2"
        ))
        .bind(restaurant_id)
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Trava a linha até o fim da transação (patch concorrente).
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        booking_id: i32,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE restaurant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(restaurant_id)
        .bind(booking_id)
        .fetch_optional(executor)
        .await?;

        Ok(booking)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        booking_id: i32,
        record: &BookingRecord,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings SET
                reservation_date = $3, reservation_time = $4, party_size = $5,
                customer_name = $6, contact_phone = $7, contact_phone_country_code = $8,
                contact_email = $9, table_number = $10, commentary = $11,
                baby_strollers = $12, high_chairs = $13, arroz_type = $14,
                arroz_servings = $15, special_menu = $16, menu_de_grupo_id = $17,
                principales_json = $18, updated_at = NOW()
            WHERE restaurant_id = $1 AND id = $2
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(booking_id)
        .bind(record.reservation_date)
        .bind(record.reservation_time)
        .bind(record.party_size)
        .bind(&record.customer_name)
        .bind(&record.contact_phone)
        .bind(&record.contact_phone_country_code)
        .bind(&record.contact_email)
        .bind(&record.table_number)
        .bind(&record.commentary)
        .bind(record.baby_strollers)
        .bind(record.high_chairs)
        .bind(&record.arroz_type)
        .bind(&record.arroz_servings)
        .bind(record.special_menu)
        .bind(record.menu_de_grupo_id)
        .bind(&record.principales_json)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }

    pub async fn list_by_date(&self, restaurant_id: i32, date: NaiveDate) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE restaurant_id = $1 AND reservation_date = $2
            ORDER BY reservation_time, id
            "#
        ))
        .bind(restaurant_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Copia a reserva para `cancelled_bookings`. Devolve `false` se não existe.
    pub async fn archive<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        booking_id: i32,
        cancelled_by: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO cancelled_bookings ({BOOKING_COLUMNS}, cancelled_at, cancelled_by)
            SELECT {BOOKING_COLUMNS}, NOW(), $3
            FROM bookings
            WHERE restaurant_id = $1 AND id = $2
            "#
        ))
        .bind(restaurant_id)
        .bind(booking_id)
        .bind(cancelled_by)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete<'e, E>(&self, executor: E, restaurant_id: i32, booking_id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM bookings WHERE restaurant_id = $1 AND id = $2")
            .bind(restaurant_id)
            .bind(booking_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
