// src/handlers/group_menus.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ok,
    },
    config::AppState,
    middleware::{
        rbac::{RequireSection, SecMenus},
        tenancy::TenantContext,
    },
    models::group_menu::{CreateGroupMenuPayload, GroupMenu, SetActivePayload},
};

#[utoipa::path(
    get,
    path = "/api/group-menus",
    tag = "Menus",
    responses((status = 200, description = "Menus de grupo do restaurante", body = Vec<GroupMenu>)),
    security(("session_cookie" = []))
)]
pub async fn list_menus(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecMenus>,
) -> Result<impl IntoResponse, ApiError> {
    let menus = app_state.menu_service.list_menus(tenant.0).await?;
    Ok(ok(menus))
}

#[utoipa::path(
    post,
    path = "/api/group-menus",
    tag = "Menus",
    request_body = CreateGroupMenuPayload,
    responses((status = 201, description = "Menu criado", body = GroupMenu)),
    security(("session_cookie" = []))
)]
pub async fn create_menu(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecMenus>,
    Json(payload): Json<CreateGroupMenuPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let menu = app_state.menu_service.create_menu(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, ok(menu)))
}

// Só um menu ativo vale para as reservas novas
#[utoipa::path(
    post,
    path = "/api/group-menus/{id}/active",
    tag = "Menus",
    params(("id" = i32, Path, description = "ID do menu")),
    request_body = SetActivePayload,
    responses(
        (status = 200, description = "Menu atualizado", body = GroupMenu),
        (status = 404, description = "Menu no encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn set_menu_active(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecMenus>,
    Path(menu_id): Path<i32>,
    Json(payload): Json<SetActivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let menu = app_state
        .menu_service
        .set_active(tenant.0, menu_id, payload.active)
        .await?;
    Ok(ok(menu))
}
