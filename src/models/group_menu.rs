// src/models/group_menu.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use validator::Validate;

/// Lista de principais permitidos, guardada como `{"items": [...]}` (JSONB).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GroupMenuPrincipales {
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GroupMenu {
    pub id: i32,
    #[schema(ignore)]
    pub restaurant_id: i32,
    #[schema(example = "Menú Celebración")]
    pub title: String,
    #[schema(value_type = f64, example = 35.5)]
    pub price: Decimal,
    pub active: bool,
    #[schema(value_type = GroupMenuPrincipales)]
    pub principales: Json<GroupMenuPrincipales>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroupMenuPayload {
    #[validate(length(min = 1, max = 120, message = "El título es obligatorio"))]
    pub title: String,
    #[schema(value_type = f64, example = 35.5)]
    pub price: Decimal,
    #[serde(default)]
    pub principales: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActivePayload {
    pub active: bool,
}
