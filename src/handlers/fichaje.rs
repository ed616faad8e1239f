// src/handlers/fichaje.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::{error::ApiError, response::ok},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireSection, SecFichaje},
    },
    models::fichaje::{ClockPayload, EntriesQuery, FichajeEntry},
};

#[utoipa::path(
    post,
    path = "/api/fichaje/clock-in",
    tag = "Fichaje",
    request_body = ClockPayload,
    responses(
        (status = 200, description = "Entrada registrada", body = FichajeEntry),
        (status = 403, description = "Fichar por outro membro exige a seção miembros")
    ),
    security(("session_cookie" = []))
)]
pub async fn clock_in(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecFichaje>,
    Json(payload): Json<ClockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state.fichaje_service.clock_in(&ctx, payload.member_id).await?;
    Ok(ok(entry))
}

#[utoipa::path(
    post,
    path = "/api/fichaje/clock-out",
    tag = "Fichaje",
    request_body = ClockPayload,
    responses((status = 200, description = "Saída registrada", body = FichajeEntry)),
    security(("session_cookie" = []))
)]
pub async fn clock_out(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecFichaje>,
    Json(payload): Json<ClockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state.fichaje_service.clock_out(&ctx, payload.member_id).await?;
    Ok(ok(entry))
}

#[utoipa::path(
    get,
    path = "/api/fichaje/entries",
    tag = "Fichaje",
    params(("date" = String, Query, description = "Dia (YYYY-MM-DD)")),
    responses((status = 200, description = "Fichajes do dia", body = Vec<FichajeEntry>)),
    security(("session_cookie" = []))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecFichaje>,
    Query(query): Query<EntriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .fichaje_service
        .list_entries(ctx.restaurant_id, query.date)
        .await?;
    Ok(ok(entries))
}
