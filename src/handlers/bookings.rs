// src/handlers/bookings.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    common::{
        error::ApiError,
        response::{ok, ok_with_message},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireSection, SecReservas},
        tenancy::TenantContext,
    },
    models::booking::{
        Booking, CreateBookingPayload, ListBookingsQuery, PatchBookingPayload, RemindersPayload,
    },
    services::notifications::DeliveryReport,
};

// GET /api/bookings?date=YYYY-MM-DD
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    params(("date" = String, Query, description = "Dia de serviço (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Reservas do dia na ordem do serviço", body = Vec<Booking>),
        (status = 403, description = "Sem acesso à seção reservas")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecReservas>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = app_state.booking_service.list_by_day(tenant.0, query.date).await?;
    Ok(ok(bookings))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Reserva criada", body = Booking),
        (status = 200, description = "Falha de validação (success: false)")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecReservas>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state.booking_service.create_booking(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, ok_with_message(booking, "Reserva creada")))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva", body = Booking),
        (status = 404, description = "Reserva no encontrada")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecReservas>,
    Path(booking_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state.booking_service.get_booking(tenant.0, booking_id).await?;
    Ok(ok(booking))
}

// Rota herdada: "não encontrada" responde 200 + success:false
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "ID da reserva")),
    request_body = PatchBookingPayload,
    responses(
        (status = 200, description = "Reserva atualizada, ou success:false", body = Booking)
    ),
    security(("session_cookie" = []))
)]
pub async fn patch_booking(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecReservas>,
    Path(booking_id): Path<i32>,
    Json(payload): Json<PatchBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .patch_booking(tenant.0, booking_id, payload)
        .await?;
    Ok(ok_with_message(booking, "Reserva actualizada"))
}

#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva arquivada em canceladas, ou success:false")
    ),
    security(("session_cookie" = []))
)]
pub async fn cancel_booking(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecReservas>,
    Path(booking_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.booking_service.cancel_booking(&ctx, booking_id).await?;
    Ok(Json(json!({ "success": true, "message": "Reserva cancelada" })))
}

#[utoipa::path(
    post,
    path = "/api/bookings/reminders",
    tag = "Bookings",
    request_body = RemindersPayload,
    responses(
        (status = 200, description = "Resultado por destinatário", body = DeliveryReport)
    ),
    security(("session_cookie" = []))
)]
pub async fn send_reminders(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecReservas>,
    Json(payload): Json<RemindersPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .booking_service
        .send_reminders(tenant.0, payload.date)
        .await?;
    Ok(ok(report))
}
