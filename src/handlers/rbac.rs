// src/handlers/rbac.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ok,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireSection, SecMiembros},
    },
    models::rbac::{CreateRolePayload, RoleView},
};

// GET /api/roles (padrões + personalizados do restaurante)
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    responses((status = 200, description = "Cargos disponíveis", body = Vec<RoleView>)),
    security(("session_cookie" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecMiembros>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state.rbac_service.list_roles(ctx.restaurant_id).await?;
    Ok(ok(roles))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = RoleView),
        (status = 403, description = "Importância igual ou superior à do ator")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecMiembros>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let role = app_state.rbac_service.create_role(&ctx, payload).await?;
    Ok((StatusCode::CREATED, ok(role)))
}
