// src/models/members.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Membro da equipe do restaurante. Pode ou não ter acesso ao back-office.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    #[schema(ignore)]
    pub restaurant_id: i32,
    pub bo_user_id: Option<i32>,
    #[schema(example = "Lucía")]
    pub first_name: String,
    #[schema(example = "Ferrer")]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_country_code: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Membro + cargo atual no restaurante (quando tem usuário vinculado).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MemberView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub member: Member,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMemberPayload {
    #[validate(length(min = 1, max = 80, message = "El nombre es obligatorio"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email(message = "El correo no es válido"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_country_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteMemberPayload {
    /// Cargo com que o membro entra no back-office.
    #[schema(example = "camarero")]
    pub role: String,
}
