// src/handlers/auth.rs

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::{ok, ok_with_message},
    },
    config::{AppState, Config},
    middleware::auth::AuthenticatedUser,
    models::auth::{AcceptTokenPayload, AuthContext, ChangePasswordPayload, LoginPayload, MeResponse},
};

// Atrás de proxy o TLS termina antes: confiamos no X-Forwarded-Proto
fn is_secure_request(config: &Config, headers: &HeaderMap) -> bool {
    config.cookie_secure
        || headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

pub fn session_cookie(config: &Config, headers: &HeaderMap, token: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_secure_request(config, headers))
        .max_age(time::Duration::seconds(config.session_ttl.num_seconds()))
        .build()
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Sessão criada; cookie definido", body = AuthContext),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Usuário sem acesso ao restaurante")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let outcome = app_state.auth_service.login(&payload).await?;
    let cookie = session_cookie(&app_state.config, &headers, outcome.token);

    Ok((jar.add(cookie), ok(outcome.context)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Sessão encerrada; cookie removido"))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let name = app_state.config.session_cookie_name.clone();

    if let Some(cookie) = jar.get(&name) {
        app_state.auth_service.logout(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build((name, "")).path("/"));
    Ok((jar, Json(json!({ "success": true }))))
}

// Rota pública: o token do e-mail é a credencial
#[utoipa::path(
    post,
    path = "/api/auth/accept",
    tag = "Auth",
    request_body = AcceptTokenPayload,
    responses(
        (status = 200, description = "Senha definida", body = crate::models::tokens::RedeemResponse),
        (status = 401, description = "Enlace inválido o caducado")
    )
)]
pub async fn accept_token(
    State(app_state): State<AppState>,
    Json(payload): Json<AcceptTokenPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let redeemed = app_state.token_service.redeem(&payload).await?;
    Ok(ok_with_message(redeemed, "Contraseña guardada. Ya puedes iniciar sesión."))
}

#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário, cargo e seções da sessão", body = MeResponse),
        (status = 401, description = "Sessão inválida")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state.rbac_service.effective_permissions(&ctx).await?;

    Ok(ok(MeResponse {
        user: ctx,
        importance: permissions.importance,
        sections: permissions.sections,
    }))
}

#[utoipa::path(
    post,
    path = "/api/me/password",
    tag = "Users",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada"),
        (status = 401, description = "Sessão inválida")
    ),
    security(("session_cookie" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    app_state.auth_service.change_password(&ctx, &payload).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Contraseña actualizada" })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_secure_behind_tls_proxy() {
        let config = Config::default();
        let mut headers = HeaderMap::new();
        assert!(!is_secure_request(&config, &headers));

        headers.insert("x-forwarded-proto", "HTTPS".parse().unwrap());
        let cookie = session_cookie(&config, &headers, "abc".into());
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.name(), "bo_session");
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(config.session_ttl.num_seconds()))
        );
    }

    #[test]
    fn forced_secure_flag_wins() {
        let config = Config { cookie_secure: true, ..Config::default() };
        assert!(is_secure_request(&config, &HeaderMap::new()));
    }
}
