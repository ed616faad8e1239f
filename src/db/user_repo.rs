// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::auth::BackofficeUser};

const USER_COLUMNS: &str =
    "id, email, name, password_hash, is_superadmin, last_seen_at, created_at";

// O repositório de usuários do back-office (tabela 'bo_users')
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<BackofficeUser>, AppError> {
        let user = sqlx::query_as::<_, BackofficeUser>(&format!(
            "SELECT {USER_COLUMNS} FROM bo_users WHERE lower(email) = lower($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<BackofficeUser>, AppError> {
        let user = sqlx::query_as::<_, BackofficeUser>(&format!(
            "SELECT {USER_COLUMNS} FROM bo_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Garante um usuário para o e-mail (convite). Se já existe, devolve o
    /// mesmo; senão cria sem senha até o convite ser aceito.
    pub async fn ensure_pending_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        name: &str,
    ) -> Result<BackofficeUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, BackofficeUser>(&format!(
            r#"
            INSERT INTO bo_users (email, name)
            VALUES (lower($1), $2)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email.trim())
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    pub async fn set_password<'e, E>(
        &self,
        executor: E,
        user_id: i32,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE bo_users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(executor)
            .await?;

        Ok(())
    }
}
