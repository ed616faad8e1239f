// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::settings::RestaurantSettings};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Restaurante sem linha de configuração = configuração vazia.
    pub async fn get_settings(&self, restaurant_id: i32) -> Result<RestaurantSettings, AppError> {
        let settings = sqlx::query_as::<_, RestaurantSettings>(
            r#"
            SELECT restaurant_id, fallback_email, service_hours, updated_at
            FROM restaurant_settings
            WHERE restaurant_id = $1
            "#,
        )
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or(RestaurantSettings {
            restaurant_id,
            fallback_email: None,
            service_hours: Vec::new(),
            updated_at: None,
        }))
    }

    pub async fn fallback_email(&self, restaurant_id: i32) -> Result<Option<String>, AppError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT fallback_email FROM restaurant_settings WHERE restaurant_id = $1")
                .bind(restaurant_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(email,)| email))
    }

    // UPSERT (Insert or Update)
    pub async fn update_fallback_email<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        fallback_email: Option<&str>,
    ) -> Result<RestaurantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, RestaurantSettings>(
            r#"
            INSERT INTO restaurant_settings (restaurant_id, fallback_email)
            VALUES ($1, $2)
            ON CONFLICT (restaurant_id) DO UPDATE SET
                fallback_email = EXCLUDED.fallback_email,
                updated_at = NOW()
            RETURNING restaurant_id, fallback_email, service_hours, updated_at
            "#,
        )
        .bind(restaurant_id)
        .bind(fallback_email)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }

    pub async fn update_service_hours<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        service_hours: &[String],
    ) -> Result<RestaurantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, RestaurantSettings>(
            r#"
            INSERT INTO restaurant_settings (restaurant_id, service_hours)
            VALUES ($1, $2)
            ON CONFLICT (restaurant_id) DO UPDATE SET
                service_hours = EXCLUDED.service_hours,
                updated_at = NOW()
            RETURNING restaurant_id, fallback_email, service_hours, updated_at
            "#,
        )
        .bind(restaurant_id)
        .bind(service_hours)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
