// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Representa um usuário do back-office vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BackofficeUser {
    pub id: i32,
    pub email: String,
    pub name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: Option<String>,

    pub is_superadmin: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Sessão ativa: só o hash do token fica guardado
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: i32,
    pub token_sha256: String,
    pub user_id: i32,
    pub active_restaurant_id: i32,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "El correo no es válido"))]
    #[schema(example = "sala@restaurante.es")]
    pub email: String,
    #[validate(length(min = 1, message = "La contraseña es obligatoria"))]
    pub password: String,
    /// Restaurante a abrir; se omitido, o primeiro vinculado.
    pub restaurant_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordPayload {
    pub current_password: String,
    #[validate(length(min = 8, message = "La contraseña debe tener al menos 8 caracteres"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AcceptTokenPayload {
    #[validate(length(min = 1, message = "Falta el token"))]
    pub token: String,
    #[validate(length(min = 8, message = "La contraseña debe tener al menos 8 caracteres"))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchRestaurantPayload {
    pub restaurant_id: i32,
}

/// Contexto resolvido de uma requisição autenticada.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthContext {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub restaurant_id: i32,
    /// Slug do cargo resolvido ("root" para superadmin).
    #[schema(example = "admin")]
    pub role: String,
    pub is_superadmin: bool,
    #[serde(skip)]
    #[schema(ignore)]
    pub session_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: AuthContext,
    pub importance: i32,
    pub sections: Vec<crate::models::rbac::Section>,
}
