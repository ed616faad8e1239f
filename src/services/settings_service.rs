// src/services/settings_service.rs

use crate::common::error::AppError;
use crate::common::service_time::normalize_service_hours;
use crate::db::SettingsRepository;
use crate::models::settings::RestaurantSettings;

#[derive(Clone)]
pub struct SettingsService {
    repo: SettingsRepository,
    pool: sqlx::PgPool,
}

impl SettingsService {
    pub fn new(repo: SettingsRepository, pool: sqlx::PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn get_settings(&self, restaurant_id: i32) -> Result<RestaurantSettings, AppError> {
        self.repo.get_settings(restaurant_id).await
    }

    pub async fn update_fallback_email(
        &self,
        restaurant_id: i32,
        fallback_email: Option<String>,
    ) -> Result<RestaurantSettings, AppError> {
        let email = fallback_email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        let settings = self
            .repo
            .update_fallback_email(&self.pool, restaurant_id, email.as_deref())
            .await?;

        tracing::info!(restaurant_id, "Correo de respaldo actualizado");
        Ok(settings)
    }

    /// Grava os horários já ordenados pelo dia de serviço.
    pub async fn update_service_hours(
        &self,
        restaurant_id: i32,
        hours: &[String],
    ) -> Result<RestaurantSettings, AppError> {
        let hours = normalize_service_hours(hours).map_err(AppError::Validation)?;

        let settings = self
            .repo
            .update_service_hours(&self.pool, restaurant_id, &hours)
            .await?;

        tracing::info!(restaurant_id, count = hours.len(), "Horarios actualizados");
        Ok(settings)
    }
}
