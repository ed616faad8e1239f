// src/handlers/settings.rs

use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::{ok, ok_with_message},
    },
    config::AppState,
    middleware::{
        rbac::{RequireSection, SecAjustes, SecHorarios},
        tenancy::TenantContext,
    },
    models::settings::{RestaurantSettings, UpdateHoursRequest, UpdateSettingsRequest},
};

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses((status = 200, description = "Ajustes do restaurante", body = RestaurantSettings)),
    security(("session_cookie" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecAjustes>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state.settings_service.get_settings(tenant.0).await?;
    Ok(ok(settings))
}

// PUT /api/settings
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    responses((status = 200, description = "Ajustes atualizados", body = RestaurantSettings)),
    security(("session_cookie" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecAjustes>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let updated = app_state
        .settings_service
        .update_fallback_email(tenant.0, payload.fallback_email)
        .await?;
    Ok(ok_with_message(updated, "Ajustes guardados"))
}

// GET /api/settings/hours
#[utoipa::path(
    get,
    path = "/api/settings/hours",
    tag = "Settings",
    responses((status = 200, description = "Horários de serviço", body = Vec<String>)),
    security(("session_cookie" = []))
)]
pub async fn get_hours(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecHorarios>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state.settings_service.get_settings(tenant.0).await?;
    Ok(ok(settings.service_hours))
}

// PUT /api/settings/hours
#[utoipa::path(
    put,
    path = "/api/settings/hours",
    tag = "Settings",
    request_body = UpdateHoursRequest,
    responses((status = 200, description = "Horários normalizados e salvos", body = Vec<String>)),
    security(("session_cookie" = []))
)]
pub async fn update_hours(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecHorarios>,
    Json(payload): Json<UpdateHoursRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .settings_service
        .update_service_hours(tenant.0, &payload.service_hours)
        .await?;
    Ok(ok_with_message(updated.service_hours, "Horarios guardados"))
}
