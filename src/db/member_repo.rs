// src/db/member_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::members::{Member, MemberView};

const MEMBER_COLUMNS: &str = "m.id, m.restaurant_id, m.bo_user_id, m.first_name, m.last_name, \
     m.email, m.phone, m.phone_country_code, m.active, m.created_at";

#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, restaurant_id: i32, member_id: i32) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members m WHERE m.restaurant_id = $1 AND m.id = $2"
        ))
        .bind(restaurant_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Ficha de membro do usuário logado neste restaurante.
    pub async fn find_by_user(
        &self,
        restaurant_id: i32,
        bo_user_id: i32,
    ) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS} FROM members m
            WHERE m.restaurant_id = $1 AND m.bo_user_id = $2 AND m.active
            ORDER BY m.id
            LIMIT 1
            "#
        ))
        .bind(restaurant_id)
        .bind(bo_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    pub async fn list(&self, restaurant_id: i32) -> Result<Vec<MemberView>, AppError> {
        let members = sqlx::query_as::<_, MemberView>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}, ur.role
            FROM members m
            LEFT JOIN bo_user_restaurants ur
                   ON ur.user_id = m.bo_user_id AND ur.restaurant_id = m.restaurant_id
            WHERE m.restaurant_id = $1
            ORDER BY m.first_name, m.last_name
            "#
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    pub async fn create(
        &self,
        restaurant_id: i32,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        phone_country_code: Option<&str>,
    ) -> Result<Member, AppError> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (restaurant_id, first_name, last_name, email, phone, phone_country_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, restaurant_id, bo_user_id, first_name, last_name,
                      email, phone, phone_country_code, active, created_at
            "#,
        )
        .bind(restaurant_id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(phone)
        .bind(phone_country_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    pub async fn link_user<'e, E>(
        &self,
        executor: E,
        restaurant_id: i32,
        member_id: i32,
        bo_user_id: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE members SET bo_user_id = $3 WHERE restaurant_id = $1 AND id = $2")
            .bind(restaurant_id)
            .bind(member_id)
            .bind(bo_user_id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
