// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        tokens::{generate_token, hash_token},
    },
    db::{SessionRepository, TenantRepository, TokenRepository, UserRepository},
    models::{
        auth::{AuthContext, BackofficeUser, ChangePasswordPayload, LoginPayload, Session},
        tenancy::UserRestaurantView,
    },
    services::rbac_service::{DEFAULT_LINKED_ROLE, ROOT_ROLE},
};

/// Resultado do login: o token em claro só existe aqui, para o cookie.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub session: Session,
    pub context: AuthContext,
}

// bcrypt é caro: sempre fora do runtime assíncrono
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let hash_clone = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    session_repo: SessionRepository,
    tenant_repo: TenantRepository,
    token_repo: TokenRepository,
    pool: PgPool,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        session_repo: SessionRepository,
        tenant_repo: TenantRepository,
        token_repo: TokenRepository,
        pool: PgPool,
        session_ttl: Duration,
    ) -> Self {
        Self { user_repo, session_repo, tenant_repo, token_repo, pool, session_ttl }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn login(&self, payload: &LoginPayload) -> Result<LoginOutcome, AppError> {
        // 1. Usuário + senha
        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Convite ainda não aceito: sem senha, sem login
        let password_hash = user.password_hash.as_deref().ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&payload.password, password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        // 2. Restaurante ativo
        let restaurant_id = match payload.restaurant_id {
            Some(id) => id,
            None => self
                .accessible_restaurants(&user)
                .await?
                .first()
                .map(|r| r.id)
                .ok_or_else(|| AppError::forbidden("No tienes acceso a ningún restaurante"))?,
        };
        let role = self.resolve_role(&user, restaurant_id).await?;

        // 3. Sessão
        let token = generate_token();
        let session = self
            .session_repo
            .create(&hash_token(&token), user.id, restaurant_id, Utc::now() + self.session_ttl)
            .await?;

        tracing::info!(user_id = user.id, restaurant_id, role = %role, "Login");

        let context = build_context(&user, restaurant_id, role, session.id);
        Ok(LoginOutcome { token, session, context })
    }

    /// Apaga a sessão do token, se ainda existir. Token desconhecido não é erro.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if let Some(session) = self.session_repo.find_active(&hash_token(token)).await? {
            self.session_repo.delete(session.id).await?;
            tracing::info!(user_id = session.user_id, "Logout");
        }
        Ok(())
    }

    /// Resolve o token do cookie. Usado pelo gate a cada requisição.
    pub async fn resolve_session(&self, token: &str) -> Result<(Session, AuthContext), AppError> {
        let session = self
            .session_repo
            .find_active(&hash_token(token))
            .await?
            .ok_or(AppError::InvalidSession)?;

        let user = self
            .user_repo
            .find_by_id(session.user_id)
            .await?
            .ok_or(AppError::InvalidSession)?;

        let role = self.resolve_role(&user, session.active_restaurant_id).await?;
        let context = build_context(&user, session.active_restaurant_id, role, session.id);
        Ok((session, context))
    }

    /// Superadmin = root; vínculo sem cargo = admin; sem vínculo = 403.
    pub async fn resolve_role(&self, user: &BackofficeUser, restaurant_id: i32) -> Result<String, AppError> {
        if user.is_superadmin {
            return Ok(ROOT_ROLE.to_string());
        }
        let link = self
            .tenant_repo
            .find_link(user.id, restaurant_id)
            .await?
            .ok_or_else(|| AppError::forbidden("No tienes acceso a este restaurante"))?;

        Ok(link
            .role
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LINKED_ROLE.to_string()))
    }

    pub async fn accessible_restaurants(
        &self,
        user: &BackofficeUser,
    ) -> Result<Vec<UserRestaurantView>, AppError> {
        if user.is_superadmin {
            self.tenant_repo.list_all().await
        } else {
            self.tenant_repo.list_for_user(user.id).await
        }
    }

    pub async fn list_restaurants(&self, ctx: &AuthContext) -> Result<Vec<UserRestaurantView>, AppError> {
        let user = self
            .user_repo
            .find_by_id(ctx.user_id)
            .await?
            .ok_or(AppError::InvalidSession)?;
        self.accessible_restaurants(&user).await
    }

    pub async fn switch_restaurant(
        &self,
        ctx: &AuthContext,
        restaurant_id: i32,
    ) -> Result<AuthContext, AppError> {
        let user = self
            .user_repo
            .find_by_id(ctx.user_id)
            .await?
            .ok_or(AppError::InvalidSession)?;

        if self.tenant_repo.find_restaurant(restaurant_id).await?.is_none() {
            return Err(AppError::NotFound("Restaurante no encontrado".into()));
        }
        let role = self.resolve_role(&user, restaurant_id).await?;

        self.session_repo.switch_restaurant(ctx.session_id, restaurant_id).await?;

        tracing::info!(user_id = user.id, restaurant_id, "Restaurante activo cambiado");
        Ok(build_context(&user, restaurant_id, role, ctx.session_id))
    }

    /// Troca a senha, invalida tokens pendentes e derruba as outras sessões
    /// numa única transação.
    pub async fn change_password(
        &self,
        ctx: &AuthContext,
        payload: &ChangePasswordPayload,
    ) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_id(ctx.user_id)
            .await?
            .ok_or(AppError::InvalidSession)?;

        let current_hash = user.password_hash.as_deref().ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&payload.current_password, current_hash).await? {
            return Err(AppError::validation("La contraseña actual no es correcta"));
        }

        // 1. Hashing (fora da transação)
        let new_hash = hash_password(&payload.new_password).await?;

        // 2. Inicia Transação
        let mut tx = self.pool.begin().await?;

        self.user_repo.set_password(&mut *tx, user.id, &new_hash).await?;
        let tokens = self.token_repo.invalidate_for_user(&mut *tx, user.id).await?;
        let sessions = self
            .session_repo
            .delete_for_user(&mut *tx, user.id, Some(ctx.session_id))
            .await?;

        // 3. Commit
        tx.commit().await?;

        tracing::info!(user_id = user.id, tokens, sessions, "Contraseña cambiada");
        Ok(())
    }
}

fn build_context(user: &BackofficeUser, restaurant_id: i32, role: String, session_id: i32) -> AuthContext {
    AuthContext {
        user_id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        restaurant_id,
        role,
        is_superadmin: user.is_superadmin,
        session_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn password_hash_roundtrip() {
        let hashed = hash_password("s3gura-clave").await.unwrap();
        assert!(verify_password("s3gura-clave", &hashed).await.unwrap());
        assert!(!verify_password("otra-clave", &hashed).await.unwrap());
    }

    #[test]
    fn superadmin_context_keeps_identity() {
        let user = BackofficeUser {
            id: 1,
            email: "root@example.com".into(),
            name: "Root".into(),
            password_hash: None,
            is_superadmin: true,
            last_seen_at: None,
            created_at: Utc::now(),
        };
        let ctx = build_context(&user, 5, ROOT_ROLE.into(), 42);
        assert_eq!(ctx.restaurant_id, 5);
        assert_eq!(ctx.role, "root");
        assert_eq!(ctx.session_id, 42);
    }
}
