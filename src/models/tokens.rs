// src/models/tokens.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Tipo do token de uso único.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Invite,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Invite => "invite",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

/// Sujeito do token: o trio (restaurante, membro, usuário do back-office).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject {
    pub restaurant_id: i32,
    pub member_id: i32,
    pub bo_user_id: i32,
}

// Linha devolvida pelo UPDATE condicional do resgate
#[derive(Debug, Clone, FromRow)]
pub struct RedeemedToken {
    pub id: i32,
    pub kind: String,
    pub restaurant_id: i32,
    pub member_id: i32,
    pub bo_user_id: i32,
    pub expires_at: DateTime<Utc>,
}

/// Resposta de convite / reset: o link só vai por e-mail.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenIssuedResponse {
    pub member_id: i32,
    #[schema(example = "lucia@casapepa.es")]
    pub email: String,
    pub expires_at: DateTime<Utc>,
    /// `false` quando o SMTP falhou ou não está configurado.
    pub email_sent: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedeemResponse {
    #[schema(example = "invite")]
    pub kind: String,
    pub restaurant_id: i32,
}
