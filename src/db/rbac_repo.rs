// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::{map_unique_violation, AppError};
use crate::models::rbac::PersistedRole;

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Criar o Cargo
    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        slug: &str,
        label: &str,
        importance: i32,
    ) -> Result<PersistedRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PersistedRole>(
            r#"
            INSERT INTO bo_roles (restaurant_id, slug, label, importance)
            VALUES ($1, $2, $3, $4)
            RETURNING restaurant_id, slug, label, importance, created_at
            "#,
        )
        .bind(restaurant_id)
        .bind(slug)
        .bind(label)
        .bind(importance)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Ya existe un rol con ese identificador"))
    }

    // 2. Vincular Cargo <-> Seções
    pub async fn assign_sections<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        role_slug: &str,
        sections: &[String],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Inserção em massa usando UNNEST
        sqlx::query(
            r#"
            INSERT INTO bo_role_permissions (restaurant_id, role_slug, section)
            SELECT $1, $2, unnest($3::text[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(restaurant_id)
        .bind(role_slug)
        .bind(sections)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_role(
        &self,
        restaurant_id: i32,
        slug: &str,
    ) -> Result<Option<PersistedRole>, AppError> {
        let role = sqlx::query_as::<_, PersistedRole>(
            r#"
            SELECT restaurant_id, slug, label, importance, created_at
            FROM bo_roles
            WHERE restaurant_id = $1 AND slug = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    /// Seções persistidas de um cargo. `None` quando não há nenhuma linha
    /// (nem o cargo nem permissões) para ele.
    pub async fn find_sections(
        &self,
        restaurant_id: i32,
        slug: &str,
    ) -> Result<Option<Vec<String>>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT section
            FROM bo_role_permissions
            WHERE restaurant_id = $1 AND role_slug = $2
            ORDER BY section
            "#,
        )
        .bind(restaurant_id)
        .bind(slug)
        .fetch_all(&self.pool)
        .await?;

        if !rows.is_empty() {
            return Ok(Some(rows.into_iter().map(|(s,)| s).collect()));
        }

        match self.find_role(restaurant_id, slug).await? {
            Some(_) => Ok(Some(Vec::new())),
            None => Ok(None),
        }
    }

    pub async fn list_roles(&self, restaurant_id: i32) -> Result<Vec<PersistedRole>, AppError> {
        let roles = sqlx::query_as::<_, PersistedRole>(
            r#"
            SELECT restaurant_id, slug, label, importance, created_at
            FROM bo_roles
            WHERE restaurant_id = $1
            ORDER BY importance DESC, slug
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Todas as linhas (cargo, seção) do restaurante.
    pub async fn list_permissions(
        &self,
        restaurant_id: i32,
    ) -> Result<Vec<(String, String)>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT role_slug, section
            FROM bo_role_permissions
            WHERE restaurant_id = $1
            ORDER BY role_slug, section
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
