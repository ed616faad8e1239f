// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, models::auth::AuthContext};

// O restaurante da requisição é sempre o restaurante ativo da sessão;
// nenhum cabeçalho do cliente escolhe o tenant.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub i32);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .map(|ctx| TenantContext(ctx.restaurant_id))
            .ok_or(AppError::InvalidSession)
    }
}
