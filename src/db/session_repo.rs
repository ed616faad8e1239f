// src/db/session_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::auth::Session};

const SESSION_COLUMNS: &str =
    "id, token_sha256, user_id, active_restaurant_id, expires_at, last_seen_at, created_at";

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        token_sha256: &str,
        user_id: i32,
        restaurant_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO bo_sessions (token_sha256, user_id, active_restaurant_id, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(token_sha256)
        .bind(user_id)
        .bind(restaurant_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Só devolve sessões ainda não expiradas.
    pub async fn find_active(&self, token_sha256: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM bo_sessions WHERE token_sha256 = $1 AND expires_at > NOW()"
        ))
        .bind(token_sha256)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// "Visto por último" da sessão e do usuário.
    pub async fn touch(&self, session_id: i32, user_id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE bo_sessions SET last_seen_at = NOW() WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("UPDATE bo_users SET last_seen_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn switch_restaurant(&self, session_id: i32, restaurant_id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE bo_sessions SET active_restaurant_id = $2 WHERE id = $1")
            .bind(session_id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, session_id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM bo_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Derruba as sessões do usuário (troca/reset de senha), menos a atual.
    pub async fn delete_for_user<'e, E>(
        &self,
        executor: E,
        user_id: i32,
        keep_session_id: Option<i32>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM bo_sessions WHERE user_id = $1 AND ($2::int IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(keep_session_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
