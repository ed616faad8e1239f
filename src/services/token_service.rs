// src/services/token_service.rs
//
// Convites e reset de senha. O token em claro só sai por e-mail; o banco
// guarda o SHA-256.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::common::error::AppError;
use crate::common::tokens::{generate_token, hash_token};
use crate::db::{MemberRepository, SessionRepository, TenantRepository, TokenRepository, UserRepository};
use crate::models::auth::{AcceptTokenPayload, AuthContext};
use crate::models::members::Member;
use crate::models::tokens::{RedeemResponse, TokenIssuedResponse, TokenKind, TokenSubject};
use crate::services::auth::hash_password;
use crate::services::notifications::Notifier;
use crate::services::rbac_service::RbacService;

#[derive(Clone)]
pub struct TokenService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    member_repo: MemberRepository,
    token_repo: TokenRepository,
    session_repo: SessionRepository,
    rbac: RbacService,
    notifier: Notifier,
    pool: PgPool,
    invite_ttl: Duration,
    reset_ttl: Duration,
    public_base_url: String,
}

impl TokenService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        member_repo: MemberRepository,
        token_repo: TokenRepository,
        session_repo: SessionRepository,
        rbac: RbacService,
        notifier: Notifier,
        pool: PgPool,
        invite_ttl: Duration,
        reset_ttl: Duration,
        public_base_url: String,
    ) -> Self {
        Self {
            user_repo,
            tenant_repo,
            member_repo,
            token_repo,
            session_repo,
            rbac,
            notifier,
            pool,
            invite_ttl,
            reset_ttl,
            public_base_url,
        }
    }

    async fn load_member(&self, restaurant_id: i32, member_id: i32) -> Result<(Member, String), AppError> {
        let member = self
            .member_repo
            .find(restaurant_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Miembro no encontrado".into()))?;

        let email = member
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase)
            .ok_or_else(|| AppError::validation("El miembro no tiene correo electrónico"))?;

        Ok((member, email))
    }

    /// Convida o membro para o back-office com o cargo indicado.
    pub async fn invite_member(
        &self,
        actor: &AuthContext,
        member_id: i32,
        role: &str,
    ) -> Result<TokenIssuedResponse, AppError> {
        let restaurant_id = actor.restaurant_id;
        let role = role.trim();

        self.rbac.ensure_assignable_role(restaurant_id, role).await?;
        let (member, email) = self.load_member(restaurant_id, member_id).await?;

        // Guarda de escalada antes de qualquer escrita
        let existing_user_id = match member.bo_user_id {
            Some(id) => Some(id),
            None => self.user_repo.find_by_email(&email).await?.map(|u| u.id),
        };
        match existing_user_id {
            Some(user_id) => self.rbac.guard_assignment(actor, user_id, role).await?,
            None => self.rbac.guard_new_user(actor, role).await?,
        }

        let token = generate_token();
        let expires_at = Utc::now() + self.invite_ttl;
        let display_name = format!("{} {}", member.first_name, member.last_name);

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Usuário pendente + vínculo com o cargo
        let user = self
            .user_repo
            .ensure_pending_user(&mut *tx, &email, display_name.trim())
            .await?;
        self.tenant_repo
            .upsert_link(&mut *tx, user.id, restaurant_id, Some(role))
            .await?;

        // 3. Um único token vivo por sujeito (convite ou reset)
        let subject = TokenSubject { restaurant_id, member_id, bo_user_id: user.id };
        self.token_repo
            .invalidate_outstanding(&mut *tx, subject)
            .await?;
        self.token_repo
            .insert(&mut *tx, subject, TokenKind::Invite, &hash_token(&token), expires_at)
            .await?;

        // 4. Commit
        tx.commit().await?;

        tracing::info!(restaurant_id, member_id, user_id = user.id, role, "Invitación emitida");

        let body = format!(
            "Hola {},\n\nTe han invitado al panel del restaurante. Crea tu contraseña aquí:\n{}\n\nEl enlace caduca el {}.",
            member.first_name,
            self.accept_link(&token),
            expires_at.format("%d/%m/%Y %H:%M UTC"),
        );
        let email_sent = self
            .notifier
            .send_email(&email, "Invitación al panel de reservas", &body)
            .await;

        Ok(TokenIssuedResponse { member_id, email, expires_at, email_sent })
    }

    /// Reset de senha disparado por um administrador.
    pub async fn request_password_reset(
        &self,
        actor: &AuthContext,
        member_id: i32,
    ) -> Result<TokenIssuedResponse, AppError> {
        let restaurant_id = actor.restaurant_id;
        let (member, email) = self.load_member(restaurant_id, member_id).await?;

        let user_id = member
            .bo_user_id
            .ok_or_else(|| AppError::validation("El miembro no tiene acceso al back-office"))?;

        // Resetar a senha de alguém acima de você é escalada também
        if user_id != actor.user_id {
            let target_role = self
                .rbac
                .current_role_of(user_id, self.tenant_repo.is_superadmin(user_id).await?, restaurant_id)
                .await?;
            if let Some(target_role) = target_role {
                let actor_importance = self.rbac.resolver().importance(restaurant_id, &actor.role).await?;
                let target_importance = self.rbac.resolver().importance(restaurant_id, &target_role).await?;
                if target_importance >= actor_importance {
                    return Err(AppError::forbidden(
                        "No puedes modificar a un usuario con importancia igual o superior a la tuya",
                    ));
                }
            }
        }

        let token = generate_token();
        let expires_at = Utc::now() + self.reset_ttl;
        let subject = TokenSubject { restaurant_id, member_id, bo_user_id: user_id };

        let mut tx = self.pool.begin().await?;
        self.token_repo
            .invalidate_outstanding(&mut *tx, subject)
            .await?;
        self.token_repo
            .insert(&mut *tx, subject, TokenKind::PasswordReset, &hash_token(&token), expires_at)
            .await?;
        tx.commit().await?;

        tracing::info!(restaurant_id, member_id, user_id, actor = actor.user_id, "Reset de contraseña emitido");

        let body = format!(
            "Hola {},\n\nPara elegir una contraseña nueva entra en:\n{}\n\nEl enlace caduca el {}.",
            member.first_name,
            self.accept_link(&token),
            expires_at.format("%d/%m/%Y %H:%M UTC"),
        );
        let email_sent = self
            .notifier
            .send_email(&email, "Restablecer contraseña", &body)
            .await;

        Ok(TokenIssuedResponse { member_id, email, expires_at, email_sent })
    }

    /// Resgate público. Só o UPDATE condicional decide quem ganha; o resto
    /// acontece na mesma transação.
    pub async fn redeem(&self, payload: &AcceptTokenPayload) -> Result<RedeemResponse, AppError> {
        // 1. Hashing (fora da transação)
        let password_hash = hash_password(&payload.password).await?;

        // 2. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 3. Marca como usado
        let token = self
            .token_repo
            .redeem(&mut *tx, &hash_token(payload.token.trim()))
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        // 4. Senha + vínculo membro -> usuário
        self.user_repo
            .set_password(&mut *tx, token.bo_user_id, &password_hash)
            .await?;
        self.member_repo
            .link_user(&mut *tx, token.restaurant_id, token.member_id, token.bo_user_id)
            .await?;

        // 5. Nada mais fica vivo para esse usuário
        self.token_repo
            .invalidate_for_user(&mut *tx, token.bo_user_id)
            .await?;
        if token.kind == TokenKind::PasswordReset.as_str() {
            self.session_repo
                .delete_for_user(&mut *tx, token.bo_user_id, None)
                .await?;
        }

        // 6. Commit
        tx.commit().await?;

        tracing::info!(
            token_id = token.id,
            kind = %token.kind,
            user_id = token.bo_user_id,
            "Token canjeado"
        );

        Ok(RedeemResponse { kind: token.kind, restaurant_id: token.restaurant_id })
    }

    fn accept_link(&self, token: &str) -> String {
        accept_link(&self.public_base_url, token)
    }
}

pub fn accept_link(base_url: &str, token: &str) -> String {
    format!("{}/aceptar?token={}", base_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_link_has_no_double_slash() {
        assert_eq!(
            accept_link("https://panel.casapepa.es/", "abc"),
            "https://panel.casapepa.es/aceptar?token=abc"
        );
        assert_eq!(accept_link("http://localhost:5173", "x"), "http://localhost:5173/aceptar?token=x");
    }
}
