// src/db/token_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

use crate::common::error::AppError;
use crate::models::tokens::{RedeemedToken, TokenKind, TokenSubject};

/// Token vivo: nem usado, nem invalidado, nem expirado. O resgate depende
/// só desta condição dentro do UPDATE.
pub const LIVE_TOKEN_FILTER: &str =
    "used_at IS NULL AND invalidated_at IS NULL AND expires_at > NOW()";

fn redeem_sql() -> String {
    format!(
        r#"
        UPDATE bo_auth_tokens
        SET used_at = NOW()
        WHERE token_sha256 = $1 AND {LIVE_TOKEN_FILTER}
        RETURNING id, kind, restaurant_id, member_id, bo_user_id, expires_at
        "#
    )
}

fn invalidate_outstanding_sql() -> String {
    format!(
        r#"
        UPDATE bo_auth_tokens
        SET invalidated_at = NOW()
        WHERE restaurant_id = $1 AND member_id = $2 AND bo_user_id = $3 AND {LIVE_TOKEN_FILTER}
        "#
    )
}

/// Tokens de convite / reset de senha (tabela bo_auth_tokens).
/// Todas as operações rodam dentro da transação de quem chama.
#[derive(Clone, Default)]
pub struct TokenRepository;

impl TokenRepository {
    pub fn new() -> Self {
        Self
    }

    /// Invalida os tokens vivos do sujeito, de qualquer tipo. Chamar na
    /// mesma transação do `insert`: no máximo um token vivo por
    /// (restaurante, membro, usuário).
    pub async fn invalidate_outstanding<'e, E>(
        &self,
        executor: E,
        subject: TokenSubject,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(&invalidate_outstanding_sql())
            .bind(subject.restaurant_id)
            .bind(subject.member_id)
            .bind(subject.bo_user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        subject: TokenSubject,
        kind: TokenKind,
        token_sha256: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO bo_auth_tokens (kind, token_sha256, restaurant_id, member_id, bo_user_id, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(kind.as_str())
        .bind(token_sha256)
        .bind(subject.restaurant_id)
        .bind(subject.member_id)
        .bind(subject.bo_user_id)
        .bind(expires_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Resgate atômico: só um UPDATE condicional decide quem ganha.
    pub async fn redeem<'e, E>(
        &self,
        executor: E,
        token_sha256: &str,
    ) -> Result<Option<RedeemedToken>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let token = sqlx::query_as::<_, RedeemedToken>(&redeem_sql())
            .bind(token_sha256)
            .fetch_optional(executor)
            .await?;

        Ok(token)
    }

    /// Invalida tudo o que ainda está vivo para o usuário (troca de senha).
    pub async fn invalidate_for_user<'e, E>(&self, executor: E, bo_user_id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE bo_auth_tokens
            SET invalidated_at = NOW()
            WHERE bo_user_id = $1 AND used_at IS NULL AND invalidated_at IS NULL
            "#,
        )
        .bind(bo_user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn where_clause(sql: &str) -> &str {
        let start = sql.find("WHERE").unwrap();
        let end = sql.find("RETURNING").unwrap_or(sql.len());
        &sql[start..end]
    }

    #[test]
    fn redeem_only_matches_live_tokens() {
        let sql = redeem_sql();
        let clause = where_clause(&sql);
        assert!(clause.contains("token_sha256 = $1"));
        assert!(clause.contains("used_at IS NULL"));
        assert!(clause.contains("invalidated_at IS NULL"));
        assert!(clause.contains("expires_at > NOW()"));
        assert!(sql.contains("SET used_at = NOW()"));
    }

    #[test]
    fn outstanding_tokens_are_scoped_to_the_subject_not_the_kind() {
        let sql = invalidate_outstanding_sql();
        let clause = where_clause(&sql);
        assert!(clause.contains("restaurant_id = $1"));
        assert!(clause.contains("member_id = $2"));
        assert!(clause.contains("bo_user_id = $3"));
        assert!(clause.contains(LIVE_TOKEN_FILTER));
        assert!(!clause.contains("kind"));
    }
}
