// src/handlers/tenancy.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::{error::ApiError, response::ok},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{auth::SwitchRestaurantPayload, tenancy::UserRestaurantView},
};

// GET /api/me/restaurants
#[utoipa::path(
    get,
    path = "/api/me/restaurants",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Restaurantes acessíveis pelo usuário", body = Vec<UserRestaurantView>),
        (status = 401, description = "Sessão inválida")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_my_restaurants(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let restaurants = app_state.auth_service.list_restaurants(&ctx).await?;
    Ok(ok(restaurants))
}

// POST /api/me/restaurant
#[utoipa::path(
    post,
    path = "/api/me/restaurant",
    tag = "Tenancy",
    request_body = SwitchRestaurantPayload,
    responses(
        (status = 200, description = "Restaurante ativo trocado", body = crate::models::auth::AuthContext),
        (status = 403, description = "Sem vínculo com o restaurante"),
        (status = 404, description = "Restaurante inexistente")
    ),
    security(("session_cookie" = []))
)]
pub async fn switch_restaurant(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(payload): Json<SwitchRestaurantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let context = app_state
        .auth_service
        .switch_restaurant(&ctx, payload.restaurant_id)
        .await?;
    Ok(ok(context))
}
