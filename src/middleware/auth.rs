// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Duration, Utc};

use crate::{common::error::AppError, config::AppState, models::auth::AuthContext};

/// Gate de sessão: cookie -> sessão -> usuário + restaurante + cargo.
pub async fn session_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = &app_state.config;

    let token = jar
        .get(&config.session_cookie_name)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::InvalidSession)?;

    let (session, ctx) = app_state.auth_service.resolve_session(&token).await?;

    // Rotas sensíveis exigem atividade recente
    if is_high_security_path(request.uri().path(), &config.high_security_path_prefixes)
        && idle_too_long(session.last_seen_at, Utc::now(), config.high_security_ttl)
    {
        tracing::info!(session_id = session.id, path = %request.uri().path(), "Sessão ociosa em rota sensível");
        return Err(AppError::InvalidSession);
    }

    // "Visto por último" em segundo plano: falha nunca derruba a requisição
    let session_repo = app_state.session_repo.clone();
    let (session_id, user_id) = (session.id, ctx.user_id);
    tokio::spawn(async move {
        if let Err(e) = session_repo.touch(session_id, user_id).await {
            tracing::warn!(session_id, error = %e, "Falha ao atualizar last_seen_at");
        }
    });

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

pub fn is_high_security_path(path: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| path == p || path.starts_with(&format!("{}/", p.trim_end_matches('/'))))
}

pub fn idle_too_long(last_seen_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - last_seen_at > ttl
}

// Extrator para obter o contexto autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        vec!["/api/roles".into(), "/api/members".into(), "/api/invoices/".into()]
    }

    #[test]
    fn high_security_matches_whole_segments() {
        assert!(is_high_security_path("/api/roles", &prefixes()));
        assert!(is_high_security_path("/api/members/4/role", &prefixes()));
        assert!(is_high_security_path("/api/invoices/2025", &prefixes()));
        assert!(!is_high_security_path("/api/rolesx", &prefixes()));
        assert!(!is_high_security_path("/api/bookings", &prefixes()));
        assert!(!is_high_security_path("/api/roles", &[]));
    }

    #[test]
    fn idle_check_uses_the_short_ttl() {
        let now = Utc::now();
        let ttl = Duration::minutes(15);
        assert!(!idle_too_long(now - Duration::minutes(14), now, ttl));
        assert!(idle_too_long(now - Duration::minutes(16), now, ttl));
    }
}
