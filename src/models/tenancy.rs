// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ---
// 1. Restaurant (o tenant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Restaurant {
    pub id: i32,
    #[schema(example = "Casa Pepa")]
    pub name: String,
    #[schema(example = "casa-pepa")]
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

// ---
// 2. Ponte Usuário-Restaurante
// ---
// O cargo é opcional: vínculo sem cargo vale como "admin"
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRestaurant {
    pub user_id: i32,
    pub restaurant_id: i32,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Restaurante + cargo do usuário nele (tela de troca de restaurante).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserRestaurantView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub role: Option<String>,
}
