// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RestaurantSettings {
    #[schema(ignore)] // O contexto da sessão já define o restaurante
    pub restaurant_id: i32,

    /// Usado nas reservas que chegam sem e-mail.
    #[schema(example = "reservas@casapepa.es")]
    pub fallback_email: Option<String>,

    /// Horários de serviço (`HH:MM`), ordenados pelo dia de serviço.
    pub service_hours: Vec<String>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsRequest {
    #[validate(email(message = "El correo no es válido"))]
    #[schema(example = "reservas@casapepa.es")]
    pub fallback_email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateHoursRequest {
    pub service_hours: Vec<String>,
}
