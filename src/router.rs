// src/router.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::session_guard,
    ws,
};

/// Monta o roteador completo. Separado do `main` para os testes de
/// integração conseguirem dirigir a aplicação com `oneshot`.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/accept", post(handlers::auth::accept_token));

    // Tudo abaixo passa pelo gate de sessão
    let me_routes = Router::new()
        .route("/", get(handlers::auth::get_me))
        .route("/restaurants", get(handlers::tenancy::list_my_restaurants))
        .route("/restaurant", post(handlers::tenancy::switch_restaurant))
        .route("/password", post(handlers::auth::change_password));

    let booking_routes = Router::new()
        .route(
            "/",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route("/reminders", post(handlers::bookings::send_reminders))
        .route(
            "/{id}",
            get(handlers::bookings::get_booking)
                .patch(handlers::bookings::patch_booking)
                .delete(handlers::bookings::cancel_booking),
        );

    let menu_routes = Router::new()
        .route(
            "/",
            get(handlers::group_menus::list_menus).post(handlers::group_menus::create_menu),
        )
        .route("/{id}/active", post(handlers::group_menus::set_menu_active));

    let member_routes = Router::new()
        .route(
            "/",
            get(handlers::members::list_members).post(handlers::members::create_member),
        )
        .route("/{id}/role", post(handlers::members::assign_member_role))
        .route("/{id}/invite", post(handlers::members::invite_member))
        .route("/{id}/password-reset", post(handlers::members::reset_member_password));

    let fichaje_routes = Router::new()
        .route("/clock-in", post(handlers::fichaje::clock_in))
        .route("/clock-out", post(handlers::fichaje::clock_out))
        .route("/entries", get(handlers::fichaje::list_entries))
        .route("/ws", get(ws::handler::fichaje_ws));

    let settings_routes = Router::new()
        .route(
            "/",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route(
            "/hours",
            get(handlers::settings::get_hours).put(handlers::settings::update_hours),
        );

    let protected = Router::new()
        .nest("/api/me", me_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/group-menus", menu_routes)
        .route(
            "/api/roles",
            get(handlers::rbac::list_roles).post(handlers::rbac::create_role),
        )
        .nest("/api/members", member_routes)
        .nest("/api/fichaje", fichaje_routes)
        .nest("/api/settings", settings_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "success": true, "status": "ok" })) }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
